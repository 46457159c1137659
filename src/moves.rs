use arrayvec::ArrayVec;

use crate::board::Board;
use crate::tile::{ALL_DIRECTIONS, Direction, Position};

/// A set of directions, in Up, Down, Left, Right order.
pub type Directions = ArrayVec<Direction, 4>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    /// Where the pushed box ended up, if the move pushed one.
    pub pushed_box: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("move is blocked")]
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Walk { to: Position },
    Push { to: Position, box_to: Position },
}

/// Decide what moving the player at `player` in `direction` would do.
/// Returns None if the move is illegal.
fn plan(board: &Board, player: Position, direction: Direction) -> Option<Step> {
    let next = direction.step(player)?;
    let next_tile = board.get(next);

    if next_tile.is_blocking() {
        return None;
    }

    if next_tile.is_box() {
        // Only a single box may be pushed, never into a wall or another box
        let box_to = direction.step(next)?;
        let beyond = board.get(box_to);
        if beyond.is_blocking() || beyond.is_box() {
            return None;
        }
        return Some(Step::Push { to: next, box_to });
    }

    Some(Step::Walk { to: next })
}

impl Board {
    /// Move the player one cell in `direction`, pushing a box if one is in
    /// the way.
    ///
    /// Returns the resulting board; `self` is left untouched whether or not
    /// the move is legal.
    pub fn apply_move(&self, direction: Direction) -> Result<MoveOutcome, MoveError> {
        let player = self.locate_player();
        let step = plan(self, player, direction).ok_or(MoveError::Blocked)?;

        let mut board = self.clone();
        board.set(player, self.get(player).vacated());

        let pushed_box = match step {
            Step::Walk { to } => {
                board.set(to, self.get(to).with_player());
                None
            }
            Step::Push { to, box_to } => {
                board.set(to, self.get(to).with_player());
                board.set(box_to, self.get(box_to).with_box());
                Some(box_to)
            }
        };

        Ok(MoveOutcome { board, pushed_box })
    }

    /// Directions in which [`Board::apply_move`] would currently succeed.
    pub fn available_directions(&self) -> Directions {
        let player = self.locate_player();
        ALL_DIRECTIONS
            .into_iter()
            .filter(|&direction| plan(self, player, direction).is_some())
            .collect()
    }

    /// Complement of [`Board::available_directions`].
    pub fn blocked_directions(&self) -> Directions {
        let player = self.locate_player();
        ALL_DIRECTIONS
            .into_iter()
            .filter(|&direction| plan(self, player, direction).is_none())
            .collect()
    }
}
