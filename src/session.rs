//! Live games keyed by id, each with an inactivity timer.
//!
//! The store owns the only copy of every running game. Timers are Tokio tasks,
//! so [`SessionStore::start`] and [`SessionStore::submit`] must be called from
//! within a Tokio runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::board::Board;
use crate::codec::Compact;
use crate::levels::LevelError;
use crate::moves::{Directions, MoveError};
use crate::rules::{self, GameStatus};
use crate::tile::Direction;

pub type GameId = u64;

/// Called with the removed session when a game times out.
pub type ExpiryHandler = Arc<dyn Fn(GameId, GameSession) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// Compact text the game was started from.
    pub level: String,
    pub board: Board,
    pub moves: u32,
    /// Time of the first successful move; the clock starts there.
    pub started_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Won { moves: u32, elapsed: Duration },
    Lost { moves: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    Continue {
        board: Board,
        available: Directions,
        moves: u32,
    },
    /// The game is over and no longer in the store.
    Concluded {
        session: GameSession,
        conclusion: Conclusion,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no game with id {0}")]
    NotFound(GameId),
    #[error(transparent)]
    Move(#[from] MoveError),
}

struct Entry {
    session: GameSession,
    // Bumped on every reschedule; a timer only expires its own generation
    generation: u64,
    timer: JoinHandle<()>,
}

struct Inner {
    games: Mutex<HashMap<GameId, Entry>>,
    next_id: AtomicU64,
    timeout: Duration,
    on_expire: ExpiryHandler,
}

impl Inner {
    fn games(&self) -> MutexGuard<'_, HashMap<GameId, Entry>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire(&self, id: GameId, generation: u64) {
        let session = {
            let mut games = self.games();
            let current = games
                .get(&id)
                .is_some_and(|entry| entry.generation == generation);
            if current {
                games.remove(&id).map(|entry| entry.session)
            } else {
                None
            }
        };

        if let Some(session) = session {
            info!(id, moves = session.moves, "game expired");
            (self.on_expire)(id, session);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let games = self.games.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in games.values() {
            entry.timer.abort();
        }
    }
}

/// Shared handle to the running games. Clones refer to the same store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(
        timeout: Duration,
        on_expire: impl Fn(GameId, GameSession) + Send + Sync + 'static,
    ) -> Self {
        SessionStore {
            inner: Arc::new(Inner {
                games: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                timeout,
                on_expire: Arc::new(on_expire),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    fn arm(&self, id: GameId, generation: u64) -> JoinHandle<()> {
        let inner = Arc::downgrade(&self.inner);
        let timeout = self.inner.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(id, generation);
            }
        })
    }

    /// Start a new game from compact level text.
    pub fn start(&self, level: &str) -> Result<(GameId, Board), LevelError> {
        let board = Board::from_text(level, &Compact)?;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let session = GameSession {
            level: level.to_string(),
            board: board.clone(),
            moves: 0,
            started_at: None,
        };

        let timer = self.arm(id, 0);
        self.inner.games().insert(
            id,
            Entry {
                session,
                generation: 0,
                timer,
            },
        );
        info!(id, "game started");
        Ok((id, board))
    }

    /// Play one move in game `id`.
    ///
    /// A rejected move leaves the game and its timer as they were. A move that
    /// ends the game removes it from the store.
    pub fn submit(&self, id: GameId, direction: Direction) -> Result<TurnReport, SessionError> {
        let mut games = self.inner.games();
        let entry = games.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let turn = rules::play(&entry.session.board, direction)?;
        let moves = entry.session.moves + 1;
        let started_at = entry.session.started_at.unwrap_or_else(Instant::now);
        debug!(id, %direction, moves, status = ?turn.status, "move applied");

        if turn.status == GameStatus::InProgress {
            let available = turn.available_directions();
            entry.session.board = turn.board.clone();
            entry.session.moves = moves;
            entry.session.started_at = Some(started_at);
            entry.timer.abort();
            entry.generation += 1;
            entry.timer = self.arm(id, entry.generation);
            return Ok(TurnReport::Continue {
                board: turn.board,
                available,
                moves,
            });
        }

        let Entry {
            mut session, timer, ..
        } = games.remove(&id).ok_or(SessionError::NotFound(id))?;
        timer.abort();
        drop(games);

        session.board = turn.board;
        session.moves = moves;
        session.started_at = Some(started_at);
        let conclusion = if turn.status == GameStatus::Won {
            Conclusion::Won {
                moves,
                elapsed: started_at.elapsed(),
            }
        } else {
            Conclusion::Lost { moves }
        };
        info!(id, ?conclusion, "game concluded");

        Ok(TurnReport::Concluded {
            session,
            conclusion,
        })
    }

    /// Abandon game `id` without reporting it as expired.
    pub fn forfeit(&self, id: GameId) -> Option<GameSession> {
        let entry = self.inner.games().remove(&id)?;
        entry.timer.abort();
        info!(id, "game forfeited");
        Some(entry.session)
    }

    pub fn get(&self, id: GameId) -> Option<GameSession> {
        self.inner
            .games()
            .get(&id)
            .map(|entry| entry.session.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.games().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.games().is_empty()
    }
}
