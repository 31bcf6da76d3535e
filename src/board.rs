use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

/// Read side of a scoreboard.
///
/// Every getter returns [`None`] while no match is active.
pub trait ScoreBoard {
    /// Name of the home team.
    fn home_team(&self) -> Option<String>;

    /// Name of the away team.
    fn away_team(&self) -> Option<String>;

    /// Score of the home team.
    fn home_score(&self) -> Option<u32>;

    /// Score of the away team.
    fn away_score(&self) -> Option<u32>;

    /// Returns whether a match is currently active.
    #[inline]
    fn is_active(&self) -> bool {
        self.home_team().is_some()
    }

    /// Sum of the home and away scores.
    #[inline]
    fn total_score(&self) -> Option<u64> {
        Some(u64::from(self.home_score()?) + u64::from(self.away_score()?))
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ScoreBoardError {
    /// A match is already active on the board.
    #[error("match already started")]
    AlreadyStarted,
    /// No match is active on the board.
    #[error("an active match was not found")]
    NoActiveMatch,
    /// At least one team name is empty or blank.
    #[error("team names should not be empty or blank (provided names: [{0:?}, {1:?}])")]
    InvalidNames(String, String),
    /// At least one score is negative.
    #[error("score values should not be negative (provided values: [{0}, {1}])")]
    InvalidScore(i32, i32),
}

/// The match currently displayed by a [`MatchBoard`].
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActiveMatch {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
}

/// A board showing at most one match at a time.
///
/// The board starts idle and can be reused for any number of
/// start/finish cycles.
#[derive(Default, Clone, Debug)]
pub struct MatchBoard {
    current: Option<ActiveMatch>,
}

impl MatchBoard {
    #[inline]
    /// Creates a new idle `MatchBoard`.
    pub fn new() -> MatchBoard {
        Self { current: None }
    }

    /// Starts a new match with both scores set to zero.
    ///
    /// Fails with [`ScoreBoardError::AlreadyStarted`] if a match is active, whatever the provided names.
    pub fn start_match(&mut self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
        if self.current.is_some() {
            return Err(ScoreBoardError::AlreadyStarted);
        }
        validate_names(home_team, away_team)?;

        log::debug!("match started: {home_team} - {away_team}");
        self.current = Some(ActiveMatch {
            home_team: home_team.to_owned(),
            away_team: away_team.to_owned(),
            home_score: 0,
            away_score: 0,
        });
        Ok(())
    }

    /// Overwrites the scores of the active match.
    ///
    /// Scores are validated before the board state is looked at, so negative scores
    /// are reported as [`ScoreBoardError::InvalidScore`] even on an idle board.
    pub fn update_score(&mut self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError> {
        let (home, away) = validate_score(home_score, away_score)?;
        let current = self.current.as_mut().ok_or(ScoreBoardError::NoActiveMatch)?;

        log::debug!(
            "score updated: {} {home} - {} {away}",
            current.home_team,
            current.away_team
        );
        current.home_score = home;
        current.away_score = away;
        Ok(())
    }

    /// Finishes the active match, clearing teams and scores.
    pub fn finish_match(&mut self) -> Result<(), ScoreBoardError> {
        let finished = self.current.take().ok_or(ScoreBoardError::NoActiveMatch)?;
        log::debug!(
            "match finished: {} {} - {} {}",
            finished.home_team,
            finished.home_score,
            finished.away_team,
            finished.away_score
        );
        Ok(())
    }

    #[inline]
    /// The active match, if any.
    pub fn current(&self) -> Option<&ActiveMatch> {
        self.current.as_ref()
    }
}

impl ScoreBoard for MatchBoard {
    #[inline]
    fn home_team(&self) -> Option<String> {
        self.current.as_ref().map(|m| m.home_team.clone())
    }

    #[inline]
    fn away_team(&self) -> Option<String> {
        self.current.as_ref().map(|m| m.away_team.clone())
    }

    #[inline]
    fn home_score(&self) -> Option<u32> {
        self.current.as_ref().map(|m| m.home_score)
    }

    #[inline]
    fn away_score(&self) -> Option<u32> {
        self.current.as_ref().map(|m| m.away_score)
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

/// Write side of a scoreboard.
pub trait MatchControl: ScoreBoard {
    /// Starts a new match with both scores set to zero.
    fn start_match(&mut self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError>;

    /// Overwrites the scores of the active match.
    fn update_score(&mut self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError>;

    /// Finishes the active match.
    fn finish_match(&mut self) -> Result<(), ScoreBoardError>;
}

impl MatchControl for MatchBoard {
    #[inline]
    fn start_match(&mut self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
        MatchBoard::start_match(self, home_team, away_team)
    }

    #[inline]
    fn update_score(&mut self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError> {
        MatchBoard::update_score(self, home_score, away_score)
    }

    #[inline]
    fn finish_match(&mut self) -> Result<(), ScoreBoardError> {
        MatchBoard::finish_match(self)
    }
}

fn validate_names(home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
    if home_team.trim().is_empty() || away_team.trim().is_empty() {
        return Err(ScoreBoardError::InvalidNames(
            home_team.to_owned(),
            away_team.to_owned(),
        ));
    }
    Ok(())
}

fn validate_score(home_score: i32, away_score: i32) -> Result<(u32, u32), ScoreBoardError> {
    match (u32::try_from(home_score), u32::try_from(away_score)) {
        (Ok(home), Ok(away)) => Ok((home, away)),
        _ => Err(ScoreBoardError::InvalidScore(home_score, away_score)),
    }
}

// TRAIT DEFAULT IMPLEMENTATIONS

impl<B: ScoreBoard + ?Sized> ScoreBoard for &B {
    #[inline]
    fn home_team(&self) -> Option<String> {
        (**self).home_team()
    }

    #[inline]
    fn away_team(&self) -> Option<String> {
        (**self).away_team()
    }

    #[inline]
    fn home_score(&self) -> Option<u32> {
        (**self).home_score()
    }

    #[inline]
    fn away_score(&self) -> Option<u32> {
        (**self).away_score()
    }

    #[inline]
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

impl<B: ScoreBoard + ?Sized> ScoreBoard for &mut B {
    #[inline]
    fn home_team(&self) -> Option<String> {
        (**self).home_team()
    }

    #[inline]
    fn away_team(&self) -> Option<String> {
        (**self).away_team()
    }

    #[inline]
    fn home_score(&self) -> Option<u32> {
        (**self).home_score()
    }

    #[inline]
    fn away_score(&self) -> Option<u32> {
        (**self).away_score()
    }

    #[inline]
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

impl<B: MatchControl + ?Sized> MatchControl for &mut B {
    #[inline]
    fn start_match(&mut self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
        (**self).start_match(home_team, away_team)
    }

    #[inline]
    fn update_score(&mut self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError> {
        (**self).update_score(home_score, away_score)
    }

    #[inline]
    fn finish_match(&mut self) -> Result<(), ScoreBoardError> {
        (**self).finish_match()
    }
}

impl<B: ScoreBoard + ?Sized> ScoreBoard for Rc<B> {
    #[inline]
    fn home_team(&self) -> Option<String> {
        (**self).home_team()
    }

    #[inline]
    fn away_team(&self) -> Option<String> {
        (**self).away_team()
    }

    #[inline]
    fn home_score(&self) -> Option<u32> {
        (**self).home_score()
    }

    #[inline]
    fn away_score(&self) -> Option<u32> {
        (**self).away_score()
    }

    #[inline]
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
