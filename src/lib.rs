#![forbid(unsafe_code)]

//! In-memory live match scoreboard.
//!
//! A [`MatchBoard`] shows at most one match at a time. An [`ObservableBoard`] wraps it and notifies
//! registered [`MatchObserver`]s when matches start and stop, which lets a [`StringSummaryGenerator`]
//! render a ranked summary of all the active matches.

pub mod board;
pub mod observable;
pub mod summary;

pub use board::{ActiveMatch, MatchBoard, MatchControl, ScoreBoard, ScoreBoardError};
pub use observable::{BoardId, MatchEvent, MatchObserver, ObservableBoard, TrackedBoard};
pub use summary::{rank_boards, MatchSummary, StringSummaryGenerator, SummaryGenerator};
