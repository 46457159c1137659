use std::fmt;
use std::str::FromStr;

/// Board coordinate as `(x, y)`, origin at the top-left corner.
pub type Position = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Outside the playable area. Also used to pad short rows.
    Empty,
    Wall,
    Floor,
    FloorTarget,
    Player,
    PlayerOnTarget,
    Box,
    BoxOnTarget,
}

pub const ALL_TILES: [Tile; 8] = [
    Tile::Empty,
    Tile::Wall,
    Tile::Floor,
    Tile::FloorTarget,
    Tile::Player,
    Tile::PlayerOnTarget,
    Tile::Box,
    Tile::BoxOnTarget,
];

impl Tile {
    pub fn is_player(self) -> bool {
        matches!(self, Tile::Player | Tile::PlayerOnTarget)
    }

    pub fn is_box(self) -> bool {
        matches!(self, Tile::Box | Tile::BoxOnTarget)
    }

    /// Walls and anything outside the level can never be entered.
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Wall | Tile::Empty)
    }

    pub fn is_target(self) -> bool {
        matches!(
            self,
            Tile::FloorTarget | Tile::PlayerOnTarget | Tile::BoxOnTarget
        )
    }

    /// The tile left behind once whatever stands here moves away.
    pub fn vacated(self) -> Tile {
        if self.is_target() {
            Tile::FloorTarget
        } else {
            Tile::Floor
        }
    }

    /// The tile after the player steps onto this cell.
    pub fn with_player(self) -> Tile {
        if self.is_target() {
            Tile::PlayerOnTarget
        } else {
            Tile::Player
        }
    }

    /// The tile after a box is pushed onto this cell.
    pub fn with_box(self) -> Tile {
        if self.is_target() {
            Tile::BoxOnTarget
        } else {
            Tile::Box
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Step from `pos` one cell in this direction.
    /// Returns None if the step would leave the non-negative quadrant.
    pub fn step(&self, pos: Position) -> Option<Position> {
        let (dx, dy) = self.delta();
        Some((pos.0.checked_add_signed(dx)?, pos.1.checked_add_signed(dy)?))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Ok(Direction::Up),
            "down" | "s" => Ok(Direction::Down),
            "left" | "a" => Ok(Direction::Left),
            "right" | "d" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(Tile::Player.vacated(), Tile::Floor);
        assert_eq!(Tile::PlayerOnTarget.vacated(), Tile::FloorTarget);
        assert_eq!(Tile::Box.with_player(), Tile::Player);
        assert_eq!(Tile::BoxOnTarget.with_player(), Tile::PlayerOnTarget);
        assert_eq!(Tile::Floor.with_box(), Tile::Box);
        assert_eq!(Tile::FloorTarget.with_box(), Tile::BoxOnTarget);
        assert_eq!(Tile::FloorTarget.with_player(), Tile::PlayerOnTarget);
    }

    #[test]
    fn test_empty_blocks_like_wall() {
        assert!(Tile::Empty.is_blocking());
        assert!(Tile::Wall.is_blocking());
        for tile in ALL_TILES {
            if tile != Tile::Empty && tile != Tile::Wall {
                assert!(!tile.is_blocking(), "{:?} should not block", tile);
            }
        }
    }

    #[test]
    fn test_step() {
        assert_eq!(Direction::Right.step((0, 0)), Some((1, 0)));
        assert_eq!(Direction::Down.step((2, 3)), Some((2, 4)));
        assert_eq!(Direction::Up.step((2, 0)), None);
        assert_eq!(Direction::Left.step((0, 5)), None);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("W".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("a".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!(" Right\n".parse::<Direction>(), Ok(Direction::Right));
        assert_eq!("s".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!("d".parse::<Direction>(), Ok(Direction::Right));
        assert!("north".parse::<Direction>().is_err());
    }
}
