//! Text encodings of levels.
//!
//! A level is a flat run of tiles split into rows by a row break. Two
//! alphabets are supported: [`Compact`], one ASCII character per tile for
//! storing and sharing levels, and [`Visual`], one bracketed display token per
//! tile for what end users see and what gets parsed back on the next turn.

use serde::{Deserialize, Serialize};

use crate::tile::{ALL_TILES, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelToken {
    Tile(Tile),
    RowBreak,
}

pub type TileSequence = Vec<LevelToken>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid level component `{token}`")]
pub struct DecodeError {
    pub token: String,
}

/// A two-way mapping between tiles and text tokens.
pub trait Alphabet {
    /// Split raw text into the tokens this alphabet is made of.
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str>;

    fn row_break(&self) -> &str;

    fn glyph(&self, tile: Tile) -> &str;

    fn tile(&self, token: &str) -> Option<Tile> {
        ALL_TILES.into_iter().find(|&tile| self.glyph(tile) == token)
    }
}

/// Decode level text into tiles and row breaks.
///
/// Only the alphabet is checked here; board-level rules (player count,
/// rectangularity) are enforced by [`crate::board::Board::from_tiles`].
pub fn decode<A: Alphabet + ?Sized>(text: &str, alphabet: &A) -> Result<TileSequence, DecodeError> {
    alphabet
        .tokenize(text)
        .into_iter()
        .map(|token| {
            if token == alphabet.row_break() {
                Ok(LevelToken::RowBreak)
            } else {
                alphabet
                    .tile(token)
                    .map(LevelToken::Tile)
                    .ok_or_else(|| DecodeError {
                        token: token.to_string(),
                    })
            }
        })
        .collect()
}

/// Exact inverse of [`decode`].
pub fn encode<A: Alphabet + ?Sized>(tokens: &[LevelToken], alphabet: &A) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            LevelToken::Tile(tile) => out.push_str(alphabet.glyph(*tile)),
            LevelToken::RowBreak => out.push_str(alphabet.row_break()),
        }
    }
    out
}

/// Single character per tile, `.` between rows.
///
/// - `0` = Empty
/// - `#` = Wall
/// - ` ` = Floor
/// - `T` = Floor target
/// - `P` = Player
/// - `X` = Player on target
/// - `B` = Box
/// - `Z` = Box on target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compact;

impl Alphabet for Compact {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        text.char_indices()
            .map(|(i, ch)| &text[i..i + ch.len_utf8()])
            .collect()
    }

    fn row_break(&self) -> &str {
        "."
    }

    fn glyph(&self, tile: Tile) -> &str {
        match tile {
            Tile::Empty => "0",
            Tile::Wall => "#",
            Tile::Floor => " ",
            Tile::FloorTarget => "T",
            Tile::Player => "P",
            Tile::PlayerOnTarget => "X",
            Tile::Box => "B",
            Tile::BoxOnTarget => "Z",
        }
    }

    fn tile(&self, token: &str) -> Option<Tile> {
        match token {
            "0" => Some(Tile::Empty),
            "#" => Some(Tile::Wall),
            " " => Some(Tile::Floor),
            "T" => Some(Tile::FloorTarget),
            "P" => Some(Tile::Player),
            "X" => Some(Tile::PlayerOnTarget),
            "B" => Some(Tile::Box),
            "Z" => Some(Tile::BoxOnTarget),
            _ => None,
        }
    }
}

const TOKEN_OPEN: char = '<';
const TOKEN_CLOSE: char = '>';
const VISUAL_ROW_BREAK: &str = "\n";

/// Display tokens, one per tile, newline between rows.
///
/// Every token is bracketed (`<...>`), which is how the text is split back
/// into tokens. The defaults are the bot's custom emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Visual {
    pub empty: String,
    pub wall: String,
    pub floor: String,
    pub floor_target: String,
    pub player: String,
    pub player_on_target: String,
    #[serde(rename = "box")]
    pub box_: String,
    pub box_on_target: String,
}

impl Default for Visual {
    fn default() -> Self {
        Visual {
            empty: "<:ske:1231690574504001649>".to_string(),
            wall: "<:skw:1231690589737582602>".to_string(),
            floor: "<:skf:1231690590853529742>".to_string(),
            floor_target: "<:skft:1231690591692390443>".to_string(),
            player: "<:skp:1231690593189629992>".to_string(),
            player_on_target: "<:skpt:1231708040785428641>".to_string(),
            box_: "<:skb:1231690582972170270>".to_string(),
            box_on_target: "<:skbt:1231693431718412288>".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlyphError {
    #[error("glyph for {tile:?} must look like `<...>`, got `{glyph}`")]
    Malformed { tile: Tile, glyph: String },
    #[error("glyph `{glyph}` is used for both {first:?} and {second:?}")]
    Duplicate {
        glyph: String,
        first: Tile,
        second: Tile,
    },
}

impl Visual {
    /// Check that the table can be decoded unambiguously.
    pub fn validate(&self) -> Result<(), GlyphError> {
        for (i, &tile) in ALL_TILES.iter().enumerate() {
            let glyph = self.glyph(tile);
            let inner = glyph
                .strip_prefix(TOKEN_OPEN)
                .and_then(|rest| rest.strip_suffix(TOKEN_CLOSE));
            let well_formed = match inner {
                Some(inner) => !inner.contains(TOKEN_CLOSE) && !inner.contains('\n'),
                None => false,
            };
            if !well_formed {
                return Err(GlyphError::Malformed {
                    tile,
                    glyph: glyph.to_string(),
                });
            }

            if let Some(&first) = ALL_TILES[..i].iter().find(|&&t| self.glyph(t) == glyph) {
                return Err(GlyphError::Duplicate {
                    glyph: glyph.to_string(),
                    first,
                    second: tile,
                });
            }
        }
        Ok(())
    }
}

impl Alphabet for Visual {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut tokens = Vec::new();
        let mut start = 0;
        for (i, ch) in text.char_indices() {
            match ch {
                TOKEN_CLOSE => {
                    tokens.push(&text[start..=i]);
                    start = i + 1;
                }
                '\n' => {
                    // Whatever was pending before the newline is an unterminated token
                    if start < i {
                        tokens.push(&text[start..i]);
                    }
                    tokens.push(&text[i..=i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if start < text.len() {
            tokens.push(&text[start..]);
        }
        tokens
    }

    fn row_break(&self) -> &str {
        VISUAL_ROW_BREAK
    }

    fn glyph(&self, tile: Tile) -> &str {
        match tile {
            Tile::Empty => &self.empty,
            Tile::Wall => &self.wall,
            Tile::Floor => &self.floor,
            Tile::FloorTarget => &self.floor_target,
            Tile::Player => &self.player,
            Tile::PlayerOnTarget => &self.player_on_target,
            Tile::Box => &self.box_,
            Tile::BoxOnTarget => &self.box_on_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_compact() {
        let tokens = decode("#P B.T0Z", &Compact).unwrap();
        assert_eq!(
            tokens,
            vec![
                LevelToken::Tile(Tile::Wall),
                LevelToken::Tile(Tile::Player),
                LevelToken::Tile(Tile::Floor),
                LevelToken::Tile(Tile::Box),
                LevelToken::RowBreak,
                LevelToken::Tile(Tile::FloorTarget),
                LevelToken::Tile(Tile::Empty),
                LevelToken::Tile(Tile::BoxOnTarget),
            ]
        );
    }

    #[test]
    fn test_decode_compact_invalid() {
        let err = decode("#P@#", &Compact).unwrap_err();
        assert_eq!(err.token, "@");
        assert_eq!(err.to_string(), "invalid level component `@`");
    }

    #[test]
    fn test_compact_round_trip() {
        let level = "00#####.###   #.#TPB  #.### BT#.#T##B #.# # T ##.#B ZBBT#.#   T  #.########";
        let tokens = decode(level, &Compact).unwrap();
        assert_eq!(encode(&tokens, &Compact), level);
    }

    #[test]
    fn test_visual_round_trip() {
        let visual = Visual::default();
        let text = format!(
            "{}{}{}\n{}{}",
            visual.wall, visual.player, visual.box_on_target, visual.empty, visual.floor_target
        );
        let tokens = decode(&text, &visual).unwrap();
        assert_eq!(
            tokens,
            vec![
                LevelToken::Tile(Tile::Wall),
                LevelToken::Tile(Tile::Player),
                LevelToken::Tile(Tile::BoxOnTarget),
                LevelToken::RowBreak,
                LevelToken::Tile(Tile::Empty),
                LevelToken::Tile(Tile::FloorTarget),
            ]
        );
        assert_eq!(encode(&tokens, &visual), text);
    }

    #[test]
    fn test_visual_unknown_token() {
        let visual = Visual::default();
        let text = format!("{}<:nope:1>", visual.wall);
        let err = decode(&text, &visual).unwrap_err();
        assert_eq!(err.token, "<:nope:1>");
    }

    #[test]
    fn test_visual_unterminated_token() {
        let visual = Visual::default();
        let text = format!("{}<:skw:12\n{}", visual.wall, visual.player);
        let err = decode(&text, &visual).unwrap_err();
        assert_eq!(err.token, "<:skw:12");

        let text = format!("{}<:sk", visual.player);
        let err = decode(&text, &visual).unwrap_err();
        assert_eq!(err.token, "<:sk");
    }

    #[test]
    fn test_alphabets_are_total() {
        let visual = Visual::default();
        for tile in ALL_TILES {
            assert_eq!(Compact.tile(Compact.glyph(tile)), Some(tile));
            assert_eq!(visual.tile(visual.glyph(tile)), Some(tile));
        }
        assert_eq!(Compact.tile(Compact.row_break()), None);
        assert_eq!(visual.tile(visual.row_break()), None);
    }

    #[test]
    fn test_visual_validate() {
        assert!(Visual::default().validate().is_ok());

        let malformed = Visual {
            wall: "W".to_string(),
            ..Visual::default()
        };
        assert!(matches!(
            malformed.validate(),
            Err(GlyphError::Malformed {
                tile: Tile::Wall,
                ..
            })
        ));

        let nested = Visual {
            floor: "<a>b>".to_string(),
            ..Visual::default()
        };
        assert!(matches!(
            nested.validate(),
            Err(GlyphError::Malformed {
                tile: Tile::Floor,
                ..
            })
        ));

        let duplicate = Visual {
            box_: Visual::default().wall,
            ..Visual::default()
        };
        assert!(matches!(
            duplicate.validate(),
            Err(GlyphError::Duplicate {
                first: Tile::Wall,
                second: Tile::Box,
                ..
            })
        ));
    }
}
