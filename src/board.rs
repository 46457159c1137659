use std::fmt;

use crate::codec::{self, Alphabet, Compact, LevelToken};
use crate::levels::LevelError;
use crate::tile::{Position, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("no player found on board")]
    NoPlayer,
    #[error("multiple players found on board")]
    MultiplePlayers,
}

/// A rectangular Sokoban board.
///
/// Rows shorter than the widest row are padded on the right with
/// [`Tile::Empty`]. The padding is not part of the level and is dropped again
/// by [`Board::encode`]; `Empty` tiles written by the level author are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
    // Number of authored tiles in each row, the rest is padding
    row_lengths: Vec<usize>,
}

impl Board {
    /// Build a board from decoded level tokens.
    ///
    /// A single trailing row break is accepted and does not open a new row.
    /// Fails unless exactly one player tile (`Player` or `PlayerOnTarget`) is
    /// present.
    pub fn from_tiles(tokens: &[LevelToken]) -> Result<Self, BoardError> {
        let mut rows: Vec<Vec<Tile>> = vec![Vec::new()];
        let mut players = 0;

        for token in tokens {
            match token {
                LevelToken::RowBreak => rows.push(Vec::new()),
                LevelToken::Tile(tile) => {
                    if tile.is_player() {
                        players += 1;
                        if players > 1 {
                            return Err(BoardError::MultiplePlayers);
                        }
                    }
                    // `rows` always holds at least one row
                    if let Some(row) = rows.last_mut() {
                        row.push(*tile);
                    }
                }
            }
        }

        if players == 0 {
            return Err(BoardError::NoPlayer);
        }

        if rows.len() > 1 && rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let height = rows.len();
        let row_lengths: Vec<usize> = rows.iter().map(|row| row.len()).collect();

        let mut tiles = Vec::with_capacity(width * height);
        for row in rows {
            let padding = width - row.len();
            tiles.extend(row);
            tiles.extend(std::iter::repeat_n(Tile::Empty, padding));
        }

        Ok(Board {
            tiles,
            width,
            height,
            row_lengths,
        })
    }

    /// Decode `text` with the given alphabet and build a board from it.
    pub fn from_text<A: Alphabet + ?Sized>(text: &str, alphabet: &A) -> Result<Self, LevelError> {
        let tokens = codec::decode(text, alphabet)?;
        Ok(Board::from_tiles(&tokens)?)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at `pos`. Anything outside the grid reads as `Empty`.
    pub fn get(&self, pos: Position) -> Tile {
        let (x, y) = pos;
        if x < self.width && y < self.height {
            self.tiles[y * self.width + x]
        } else {
            Tile::Empty
        }
    }

    /// Overwrite the tile at `pos`.
    ///
    /// Panics if `pos` is outside the authored part of the board.
    ///
    /// Callers are responsible for keeping exactly one player on the board.
    /// Overwriting the player leaves a board on which [`Board::locate_player`],
    /// and with it every move and availability query, panics.
    pub fn set(&mut self, pos: Position, tile: Tile) {
        let (x, y) = pos;
        assert!(
            y < self.height && x < self.row_lengths[y],
            "position ({}, {}) out of bounds",
            x,
            y
        );
        self.tiles[y * self.width + x] = tile;
    }

    /// Position of the player tile.
    pub fn locate_player(&self) -> Position {
        match self.tiles.iter().position(|tile| tile.is_player()) {
            Some(index) => (index % self.width, index / self.width),
            None => panic!("board has no player"),
        }
    }

    /// Iterate over every cell, padding included, in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, &tile)| ((index % self.width, index / self.width), tile))
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Encode the board, leaving out row padding.
    pub fn encode<A: Alphabet + ?Sized>(&self, alphabet: &A) -> String {
        let mut tokens = Vec::with_capacity(self.tiles.len() + self.height);
        for (y, &len) in self.row_lengths.iter().enumerate() {
            if y > 0 {
                tokens.push(LevelToken::RowBreak);
            }
            let start = y * self.width;
            tokens.extend(self.tiles[start..start + len].iter().map(|&t| LevelToken::Tile(t)));
        }
        codec::encode(&tokens, alphabet)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode(&Compact))
    }
}
