use crate::board::{ActiveMatch, MatchBoard, MatchControl, ScoreBoard, ScoreBoardError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// A lifecycle event emitted by an [`ObservableBoard`].
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MatchEvent {
    /// A match has just been started.
    MatchStarted,
    /// The active match has just been finished.
    MatchStopped,
}

/// An observer of board lifecycle events.
pub trait MatchObserver<B: ?Sized = ObservableBoard> {
    /// Called synchronously after `board` successfully started or finished a match.
    fn update(&self, board: &B, event: MatchEvent);
}

/// A board handle which observers can keep track of.
pub trait TrackedBoard: ScoreBoard + Clone {
    /// The identity of the board, shared by all handles to the same board.
    fn id(&self) -> BoardId;

    /// Sequence number of the active match: the n-th match started on this board is numbered n.
    /// Returns [`None`] while no match is active.
    fn match_number(&self) -> Option<u64>;
}

/// Identity of a board, shared by all of its handles.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BoardId(usize);

impl BoardId {
    #[inline]
    /// Creates an identity from a raw value, which must be unique among live boards.
    pub fn new(raw: usize) -> BoardId {
        BoardId(raw)
    }
}

/// A [`MatchBoard`] which notifies its observers when matches start and stop.
///
/// `ObservableBoard` is a handle: clones refer to the same board and share its observers.
/// Observers are held weakly, so they must be kept alive by the caller to keep receiving events.
///
/// The board is meant to be driven from a single thread.
#[derive(Clone, Default)]
pub struct ObservableBoard {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    board: RefCell<MatchBoard>,
    started: Cell<u64>,
    observers: RefCell<IndexMap<usize, Weak<dyn MatchObserver>>>,
}

impl ObservableBoard {
    #[inline]
    /// Creates a new idle `ObservableBoard` without observers.
    pub fn new() -> ObservableBoard {
        Self::default()
    }

    #[inline]
    /// The identity of this board.
    pub fn id(&self) -> BoardId {
        BoardId(Rc::as_ptr(&self.inner) as usize)
    }

    /// Registers an observer. Registering the same observer twice has no effect.
    pub fn add_observer(&self, observer: Rc<dyn MatchObserver>) {
        self.inner
            .observers
            .borrow_mut()
            .entry(observer_key(&observer))
            .or_insert_with(|| Rc::downgrade(&observer));
    }

    /// Unregisters an observer. Unregistering an unknown observer has no effect.
    pub fn remove_observer<O: MatchObserver + ?Sized>(&self, observer: &Rc<O>) {
        self.inner
            .observers
            .borrow_mut()
            .shift_remove(&observer_key(observer));
    }

    /// Number of registered observers which are still alive.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .values()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Starts a new match, then notifies the observers with [`MatchEvent::MatchStarted`].
    pub fn start_match(&self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
        self.inner.board.borrow_mut().start_match(home_team, away_team)?;
        self.inner.started.set(self.inner.started.get() + 1);
        self.notify(MatchEvent::MatchStarted);
        Ok(())
    }

    /// Overwrites the scores of the active match. No event is emitted.
    #[inline]
    pub fn update_score(&self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError> {
        self.inner.board.borrow_mut().update_score(home_score, away_score)
    }

    /// Finishes the active match, then notifies the observers with [`MatchEvent::MatchStopped`].
    pub fn finish_match(&self) -> Result<(), ScoreBoardError> {
        self.inner.board.borrow_mut().finish_match()?;
        self.notify(MatchEvent::MatchStopped);
        Ok(())
    }

    #[inline]
    /// A copy of the active match, if any.
    pub fn snapshot(&self) -> Option<ActiveMatch> {
        self.inner.board.borrow().current().cloned()
    }

    fn notify(&self, event: MatchEvent) {
        // Collect first: observers may register, unregister or read the board while notified
        let observers: Vec<_> = {
            let mut observers = self.inner.observers.borrow_mut();
            observers.retain(|_, o| o.strong_count() > 0);
            observers.values().filter_map(Weak::upgrade).collect()
        };

        log::trace!(
            "notifying {} observer(s) of {event:?} on board {:?}",
            observers.len(),
            self.id()
        );
        for observer in observers {
            observer.update(self, event);
        }
    }
}

#[inline]
fn observer_key<O: MatchObserver + ?Sized>(observer: &Rc<O>) -> usize {
    Rc::as_ptr(observer) as *const () as usize
}

impl ScoreBoard for ObservableBoard {
    #[inline]
    fn home_team(&self) -> Option<String> {
        self.inner.board.borrow().home_team()
    }

    #[inline]
    fn away_team(&self) -> Option<String> {
        self.inner.board.borrow().away_team()
    }

    #[inline]
    fn home_score(&self) -> Option<u32> {
        self.inner.board.borrow().home_score()
    }

    #[inline]
    fn away_score(&self) -> Option<u32> {
        self.inner.board.borrow().away_score()
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.inner.board.borrow().is_active()
    }
}

impl TrackedBoard for ObservableBoard {
    #[inline]
    fn id(&self) -> BoardId {
        ObservableBoard::id(self)
    }

    #[inline]
    fn match_number(&self) -> Option<u64> {
        self.is_active().then(|| self.inner.started.get())
    }
}

impl MatchControl for ObservableBoard {
    #[inline]
    fn start_match(&mut self, home_team: &str, away_team: &str) -> Result<(), ScoreBoardError> {
        ObservableBoard::start_match(self, home_team, away_team)
    }

    #[inline]
    fn update_score(&mut self, home_score: i32, away_score: i32) -> Result<(), ScoreBoardError> {
        ObservableBoard::update_score(self, home_score, away_score)
    }

    #[inline]
    fn finish_match(&mut self) -> Result<(), ScoreBoardError> {
        ObservableBoard::finish_match(self)
    }
}

impl PartialEq for ObservableBoard {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ObservableBoard {}

impl Hash for ObservableBoard {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl Debug for ObservableBoard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableBoard")
            .field("id", &self.id())
            .field("current", &self.snapshot())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct RecordingObserver {
        events: RefCell<Vec<(BoardId, MatchEvent, Option<String>)>>,
    }

    impl MatchObserver for RecordingObserver {
        fn update(&self, board: &ObservableBoard, event: MatchEvent) {
            self.events
                .borrow_mut()
                .push((board.id(), event, board.home_team()));
        }
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<(BoardId, MatchEvent, Option<String>)> {
            self.events.borrow().clone()
        }
    }

    #[test]
    fn start_and_finish_are_notified() {
        let observer = Rc::new(RecordingObserver::default());
        let board = ObservableBoard::new();
        board.add_observer(observer.clone());

        board.start_match("Home", "Away").unwrap();
        board.update_score(1, 2).unwrap();
        board.finish_match().unwrap();

        assert_eq!(
            observer.events(),
            vec![
                (board.id(), MatchEvent::MatchStarted, Some("Home".to_owned())),
                (board.id(), MatchEvent::MatchStopped, None),
            ]
        );
    }

    #[test]
    fn failed_operations_are_not_notified() {
        let observer = Rc::new(RecordingObserver::default());
        let board = ObservableBoard::new();
        board.add_observer(observer.clone());

        assert_eq!(board.finish_match(), Err(ScoreBoardError::NoActiveMatch));
        assert!(board.start_match(" ", "Away").is_err());
        board.start_match("Home", "Away").unwrap();
        assert_eq!(board.start_match("Home", "Away"), Err(ScoreBoardError::AlreadyStarted));

        assert_eq!(observer.events().len(), 1);
    }

    #[test]
    fn observers_are_unique() {
        let observer = Rc::new(RecordingObserver::default());
        let board = ObservableBoard::new();
        board.add_observer(observer.clone());
        board.add_observer(observer.clone());
        assert_eq!(board.observer_count(), 1);

        board.start_match("Home", "Away").unwrap();
        assert_eq!(observer.events().len(), 1);
    }

    #[test]
    fn removed_observer_is_not_notified() {
        let removed = Rc::new(RecordingObserver::default());
        let kept = Rc::new(RecordingObserver::default());
        let board = ObservableBoard::new();
        board.add_observer(removed.clone());
        board.add_observer(kept.clone());

        board.start_match("Home", "Away").unwrap();
        board.remove_observer(&removed);
        board.remove_observer(&removed);
        board.finish_match().unwrap();

        assert_eq!(removed.events().len(), 1);
        assert_eq!(kept.events().len(), 2);
        assert_eq!(board.observer_count(), 1);
    }

    #[test]
    fn dropped_observer_is_pruned() {
        let board = ObservableBoard::new();
        let observer = Rc::new(RecordingObserver::default());
        board.add_observer(observer.clone());
        drop(observer);

        assert_eq!(board.observer_count(), 0);
        board.start_match("Home", "Away").unwrap();
        assert_eq!(board.observer_count(), 0);
    }

    #[test]
    fn clones_share_identity_and_state() {
        let board = ObservableBoard::new();
        let clone = board.clone();
        let other = ObservableBoard::new();

        board.start_match("Home", "Away").unwrap();
        clone.update_score(3, 1).unwrap();

        assert_eq!(board, clone);
        assert_eq!(board.id(), clone.id());
        assert_ne!(board, other);
        assert_eq!(board.home_score(), Some(3));
        assert_eq!(board.total_score(), Some(4));
        assert!(!other.is_active());
    }

    #[test]
    fn observer_can_unsubscribe_while_notified() {
        struct OneShot {
            calls: RefCell<usize>,
            me: RefCell<Weak<OneShot>>,
        }

        impl MatchObserver for OneShot {
            fn update(&self, board: &ObservableBoard, _event: MatchEvent) {
                *self.calls.borrow_mut() += 1;
                if let Some(me) = self.me.borrow().upgrade() {
                    board.remove_observer(&me);
                }
            }
        }

        let observer = Rc::new(OneShot {
            calls: RefCell::new(0),
            me: RefCell::new(Weak::new()),
        });
        *observer.me.borrow_mut() = Rc::downgrade(&observer);

        let board = ObservableBoard::new();
        board.add_observer(observer.clone());
        board.start_match("Home", "Away").unwrap();
        board.finish_match().unwrap();

        assert_eq!(*observer.calls.borrow(), 1);
        assert_eq!(board.observer_count(), 0);
    }

    #[test]
    fn snapshot_follows_board() {
        let board = ObservableBoard::new();
        assert_eq!(board.snapshot(), None);

        board.start_match("Home", "Away").unwrap();
        board.update_score(2, 2).unwrap();
        assert_eq!(
            board.snapshot(),
            Some(ActiveMatch {
                home_team: "Home".to_owned(),
                away_team: "Away".to_owned(),
                home_score: 2,
                away_score: 2,
            })
        );
    }

    #[test]
    fn match_numbers() {
        let board = ObservableBoard::new();
        assert_eq!(board.match_number(), None);

        board.start_match("Home", "Away").unwrap();
        assert_eq!(board.match_number(), Some(1));
        assert!(board.start_match("Home", "Away").is_err());
        assert_eq!(board.match_number(), Some(1));

        board.finish_match().unwrap();
        assert_eq!(board.match_number(), None);
        board.start_match("Home", "Away").unwrap();
        assert_eq!(board.clone().match_number(), Some(2));
    }

    #[test]
    fn generic_control_notifies() {
        fn play<B: MatchControl>(board: &mut B) {
            board.start_match("Home", "Away").unwrap();
            board.update_score(1, 0).unwrap();
            board.finish_match().unwrap();
        }

        let observer = Rc::new(RecordingObserver::default());
        let mut board = ObservableBoard::new();
        board.add_observer(observer.clone());
        play(&mut board);

        assert_eq!(
            observer.events().into_iter().map(|(_, e, _)| e).collect::<Vec<_>>(),
            vec![MatchEvent::MatchStarted, MatchEvent::MatchStopped]
        );
    }

    #[test]
    fn event_serialization() {
        assert_eq!(
            serde_json::to_string(&MatchEvent::MatchStarted).unwrap(),
            "\"MatchStarted\""
        );
    }
}
