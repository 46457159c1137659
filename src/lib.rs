//! A Sokoban puzzle engine: level codecs, boards, move rules and a store of
//! live, timed games.

pub mod board;
pub mod codec;
pub mod config;
pub mod levels;
pub mod moves;
pub mod rules;
pub mod session;
pub mod tile;

pub use board::{Board, BoardError};
pub use codec::{Alphabet, Compact, DecodeError, LevelToken, Visual};
pub use levels::{LevelCatalog, LevelError};
pub use moves::{Directions, MoveError, MoveOutcome};
pub use rules::{GameStatus, Turn};
pub use session::{Conclusion, GameId, GameSession, SessionError, SessionStore, TurnReport};
pub use tile::{Direction, Position, Tile};
