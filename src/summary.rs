use crate::board::ScoreBoard;
use crate::observable::{BoardId, MatchEvent, MatchObserver, ObservableBoard, TrackedBoard};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};

const LINE_SEPARATOR: &str = "\n";

/// A generator of summaries.
pub trait SummaryGenerator {
    /// The generated summary.
    type Output;

    /// Generates a summary of the currently tracked matches.
    fn generate_summary(&self) -> Self::Output;
}

/// A ranked line of a summary.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MatchSummary {
    /// 1-based position in the summary.
    pub rank: usize,
    pub home_team: String,
    pub home_score: u32,
    pub away_team: String,
    pub away_score: u32,
}

impl MatchSummary {
    #[inline]
    /// Sum of the home and away scores.
    pub fn total_score(&self) -> u64 {
        u64::from(self.home_score) + u64::from(self.away_score)
    }
}

impl Display for MatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. {} {} - {} {}",
            self.rank, self.home_team, self.home_score, self.away_team, self.away_score
        )
    }
}

/// Ranks boards listed in the order their matches were started.
///
/// Boards are sorted by total score, higher first. Boards with the same total score are
/// sorted by start order, most recently started first. Idle boards are skipped.
pub fn rank_boards<B: ScoreBoard>(boards: &[B]) -> Vec<MatchSummary> {
    let mut entries: Vec<_> = boards
        .iter()
        .enumerate()
        .filter_map(|(order, board)| {
            let (Some(home_team), Some(home_score), Some(away_team), Some(away_score)) = (
                board.home_team(),
                board.home_score(),
                board.away_team(),
                board.away_score(),
            ) else {
                log::warn!("skipping tracked board #{order}: no active match");
                return None;
            };

            Some((
                order,
                MatchSummary {
                    rank: 0,
                    home_team,
                    home_score,
                    away_team,
                    away_score,
                },
            ))
        })
        .collect();

    entries.sort_by(|(order_1, match_1), (order_2, match_2)| {
        match_1
            .total_score()
            .cmp(&match_2.total_score())
            .then(order_1.cmp(order_2))
            .reverse()
    });

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut summary))| {
            summary.rank = i + 1;
            summary
        })
        .collect()
}

/// Observer tracking the active matches of the boards it's registered to, and rendering them as text:
///
/// ```text
/// 1. Uruguay 6 - Italy 6
/// 2. Spain 10 - Brazil 2
/// 3. Mexico 0 - Canada 5
/// ```
///
/// See [`rank_boards`] for the ordering. A tracked match which was finished or replaced without the
/// generator being notified (because it was unregistered meanwhile) is dropped when ranking.
#[derive(Debug)]
pub struct StringSummaryGenerator<B = ObservableBoard> {
    // Board -> (board, number of the match whose start was observed)
    boards: RefCell<IndexMap<BoardId, (B, u64)>>,
}

impl StringSummaryGenerator {
    #[inline]
    /// Creates a new `StringSummaryGenerator` tracking no board.
    pub fn new() -> StringSummaryGenerator {
        Self::default()
    }
}

impl<B: TrackedBoard> StringSummaryGenerator<B> {
    #[inline]
    /// Number of tracked boards.
    pub fn tracked_count(&self) -> usize {
        self.boards.borrow().len()
    }

    /// The ranked tracked matches.
    pub fn ranked(&self) -> Vec<MatchSummary> {
        let mut boards = self.boards.borrow_mut();
        boards.retain(|id, (board, match_number)| {
            let observed = board.match_number() == Some(*match_number);
            if !observed {
                log::warn!("dropping board {id:?}: match #{match_number} ended without notification");
            }
            observed
        });

        let boards: Vec<_> = boards.values().map(|(board, _)| board).collect();
        rank_boards(&boards)
    }
}

impl<B> Default for StringSummaryGenerator<B> {
    #[inline]
    fn default() -> Self {
        Self {
            boards: RefCell::new(IndexMap::new()),
        }
    }
}

impl<B: TrackedBoard> SummaryGenerator for StringSummaryGenerator<B> {
    type Output = String;

    fn generate_summary(&self) -> String {
        self.ranked().iter().join(LINE_SEPARATOR)
    }
}

impl<B: TrackedBoard> MatchObserver<B> for StringSummaryGenerator<B> {
    fn update(&self, board: &B, event: MatchEvent) {
        let mut boards = self.boards.borrow_mut();
        match event {
            MatchEvent::MatchStarted => {
                let Some(match_number) = board.match_number() else {
                    log::warn!("ignoring start of board {:?}: no active match", board.id());
                    return;
                };
                // A different number means the previous match ended unobserved: it's a new start
                if boards.get(&board.id()).map(|(_, n)| *n) != Some(match_number) {
                    boards.shift_remove(&board.id());
                    boards.insert(board.id(), (board.clone(), match_number));
                }
            }
            MatchEvent::MatchStopped => {
                boards.shift_remove(&board.id());
            }
        }
    }
}
