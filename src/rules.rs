use crate::board::Board;
use crate::moves::{Directions, MoveError};
use crate::tile::{Direction, Position, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    /// Evaluate `board` right after a move that pushed `pushed_box` (if any).
    /// A win takes precedence over a cornered box.
    pub fn evaluate(board: &Board, pushed_box: Option<Position>) -> Self {
        if board.is_won() {
            GameStatus::Won
        } else if pushed_box.is_some_and(|pos| board.is_cornered(pos)) {
            GameStatus::Lost
        } else {
            GameStatus::InProgress
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }
}

impl Board {
    /// Check if every target holds a box (win condition).
    ///
    /// A bare target, a box off target or the player standing on a target
    /// all mean the level is not finished.
    pub fn is_won(&self) -> bool {
        !self.tiles().any(|(_, tile)| {
            matches!(tile, Tile::FloorTarget | Tile::Box | Tile::PlayerOnTarget)
        })
    }

    /// Returns true if the box at `pos` is stuck in a wall corner.
    ///
    /// Only plain boxes count; a box already on a target is never a loss.
    /// Boxes wedged against other boxes, or sealed off in a region, are not
    /// detected.
    pub fn is_cornered(&self, pos: Position) -> bool {
        if self.get(pos) != Tile::Box {
            return false;
        }

        let is_wall = |direction: Direction| {
            direction
                .step(pos)
                .is_some_and(|neighbour| self.get(neighbour) == Tile::Wall)
        };
        let (top, bottom) = (is_wall(Direction::Up), is_wall(Direction::Down));
        let (left, right) = (is_wall(Direction::Left), is_wall(Direction::Right));

        (top || bottom) && (left || right)
    }
}

/// The result of one successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub board: Board,
    pub pushed_box: Option<Position>,
    pub status: GameStatus,
}

impl Turn {
    /// Moves available from the new position. Empty once the game is over.
    pub fn available_directions(&self) -> Directions {
        if self.status.is_terminal() {
            Directions::new()
        } else {
            self.board.available_directions()
        }
    }
}

/// Apply a move to `board` and evaluate the resulting position.
///
/// Callers must not keep playing a board whose status is terminal.
pub fn play(board: &Board, direction: Direction) -> Result<Turn, MoveError> {
    let outcome = board.apply_move(direction)?;
    let status = GameStatus::evaluate(&outcome.board, outcome.pushed_box);
    Ok(Turn {
        board: outcome.board,
        pushed_box: outcome.pushed_box,
        status,
    })
}
