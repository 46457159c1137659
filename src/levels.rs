use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::board::{Board, BoardError};
use crate::codec::{Compact, DecodeError};

/// Name of the level shipped with the crate.
pub const DEFAULT_LEVEL_NAME: &str = "default";

/// Compact text of the level shipped with the crate.
pub const DEFAULT_LEVEL: &str =
    "00#####.###   #.#TPB  #.### BT#.#T##B #.# # T ##.#B ZBBT#.#   T  #.########";

/// Most results returned by [`LevelCatalog::search`].
pub const MAX_SEARCH_RESULTS: usize = 25;

/// Error type for level loading operations.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// IO error when reading from file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Malformed JSON catalog
    #[error("malformed level catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Board(#[from] BoardError),
    /// A named catalog entry failed to load
    #[error("invalid level `{name}`: {source}")]
    InvalidLevel {
        name: String,
        #[source]
        source: Box<LevelError>,
    },
    #[error("unknown level `{0}`")]
    UnknownLevel(String),
    #[error("level `{0}` is defined more than once")]
    DuplicateLevel(String),
}

/// A named collection of levels in compact text form.
///
/// Every entry is checked when the catalog is built, so looking up a board
/// from a catalog only fails for unknown names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: BTreeMap<String, String>,
}

impl LevelCatalog {
    fn from_entries(
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, LevelError> {
        let mut levels = BTreeMap::new();
        for (name, text) in entries {
            if levels.contains_key(&name) {
                return Err(LevelError::DuplicateLevel(name));
            }
            if let Err(err) = Board::from_text(&text, &Compact) {
                return Err(LevelError::InvalidLevel {
                    name,
                    source: Box::new(err),
                });
            }
            levels.insert(name, text);
        }
        Ok(LevelCatalog { levels })
    }

    /// The catalog containing only the built-in level.
    pub fn builtin() -> Self {
        let mut levels = BTreeMap::new();
        levels.insert(DEFAULT_LEVEL_NAME.to_string(), DEFAULT_LEVEL.to_string());
        LevelCatalog { levels }
    }

    /// Parse a JSON object mapping level names to compact level text.
    pub fn from_json(contents: &str) -> Result<Self, LevelError> {
        let entries: BTreeMap<String, String> = serde_json::from_str(contents)?;
        Self::from_entries(entries)
    }

    /// Parse XSB-formatted Sokoban levels from a string.
    ///
    /// The XSB format uses:
    /// - Lines starting with `;` as level separators/comments. The text after
    ///   the `;` names the following level.
    /// - Standard Sokoban characters (#, @, $, ., *, +, space; `-` and `_`
    ///   also mean floor)
    /// - Empty lines between levels (optional)
    ///
    /// Unnamed levels are numbered from 1 in file order, and a number already
    /// taken by a `;` name is an error. Spaces before the first wall of a row
    /// become `Empty`.
    pub fn from_xsb(contents: &str) -> Result<Self, LevelError> {
        let mut entries = Vec::new();
        let mut current_level: Vec<&str> = Vec::new();
        let mut pending_name: Option<String> = None;

        let mut flush = |lines: &mut Vec<&str>,
                         name: &mut Option<String>|
         -> Result<(), LevelError> {
            if lines.is_empty() {
                return Ok(());
            }
            let name = name
                .take()
                .unwrap_or_else(|| (entries.len() + 1).to_string());
            let text = xsb_to_compact(lines).map_err(|err| LevelError::InvalidLevel {
                name: name.clone(),
                source: Box::new(err.into()),
            })?;
            entries.push((name, text));
            lines.clear();
            Ok(())
        };

        for line in contents.lines() {
            let trimmed = line.trim_start();

            if let Some(comment) = trimmed.strip_prefix(';') {
                // A comment ends the level being read and names the next one
                flush(&mut current_level, &mut pending_name)?;
                let comment = comment.trim();
                if !comment.is_empty() {
                    pending_name = Some(comment.to_string());
                }
                continue;
            }

            if line.trim().is_empty() {
                flush(&mut current_level, &mut pending_name)?;
                continue;
            }

            current_level.push(line.trim_end());
        }

        // Don't forget the last level if file doesn't end with empty line
        flush(&mut current_level, &mut pending_name)?;

        Self::from_entries(entries)
    }

    /// Load a catalog from disk; `.json` files are read as JSON, anything
    /// else as XSB.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            _ => Self::from_xsb(&contents)?,
        };
        info!(path = %path.display(), levels = catalog.len(), "loaded level catalog");
        Ok(catalog)
    }

    /// Compact text of the named level.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.levels.get(name).map(String::as_str)
    }

    /// A fresh board for the named level.
    pub fn board(&self, name: &str) -> Result<Board, LevelError> {
        let text = self
            .get(name)
            .ok_or_else(|| LevelError::UnknownLevel(name.to_string()))?;
        Board::from_text(text, &Compact)
    }

    /// Level names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    /// Names containing `query`, ignoring case, for autocompletion.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.names()
            .filter(|name| name.to_lowercase().contains(&query))
            .take(MAX_SEARCH_RESULTS)
            .collect()
    }

    /// Pick a level name uniformly at random.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.names().choose(rng)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Translate the rows of one XSB level into compact text.
fn xsb_to_compact(lines: &[&str]) -> Result<String, DecodeError> {
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let mut row = String::with_capacity(line.len());
        let mut outside = true;
        for ch in line.chars() {
            let tile = match ch {
                ' ' | '-' | '_' if outside => '0',
                ' ' | '-' | '_' => ' ',
                '#' => '#',
                '.' => 'T',
                '$' => 'B',
                '*' => 'Z',
                '@' => 'P',
                '+' => 'X',
                _ => {
                    return Err(DecodeError {
                        token: ch.to_string(),
                    });
                }
            };
            if tile != '0' {
                outside = false;
            }
            row.push(tile);
        }
        rows.push(row);
    }
    Ok(rows.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_builtin() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(DEFAULT_LEVEL_NAME), Some(DEFAULT_LEVEL));

        let board = catalog.board(DEFAULT_LEVEL_NAME).unwrap();
        assert_eq!(board.width(), 8);
        assert_eq!(board.height(), 9);
        assert_eq!(board.to_string(), DEFAULT_LEVEL);
    }

    #[test]
    fn test_unknown_level() {
        let catalog = LevelCatalog::builtin();
        assert!(catalog.get("missing").is_none());
        assert!(matches!(
            catalog.board("missing"),
            Err(LevelError::UnknownLevel(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_from_json() {
        let catalog = LevelCatalog::from_json(r##"{"tiny": "#PBT#", "line": "P B T"}"##).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["line", "tiny"]);
        assert_eq!(catalog.get("tiny"), Some("#PBT#"));
    }

    #[test]
    fn test_from_json_invalid_level() {
        let result = LevelCatalog::from_json(r##"{"ok": "#PBT#", "broken": "#PPT#"}"##);
        match result {
            Err(LevelError::InvalidLevel { name, source }) => {
                assert_eq!(name, "broken");
                assert!(matches!(*source, LevelError::Board(BoardError::MultiplePlayers)));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let result = LevelCatalog::from_json(r##"{"bad": "#P?T#"}"##);
        assert!(matches!(result, Err(LevelError::InvalidLevel { .. })));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            LevelCatalog::from_json("[1, 2]"),
            Err(LevelError::Json(_))
        ));
    }

    #[test]
    fn test_from_xsb() {
        let level1 = "####
# .#
#  ###
#*@  #
#  $ #
#  ###
####";

        let level2 = "  ####
###  ####
#     $ #
# #  #$ #
# . .#@ #
#########";

        let xsb_content = format!("; First\n\n{}\n\n{}\n", level1, level2);

        let catalog = LevelCatalog::from_xsb(&xsb_content).unwrap();
        assert_eq!(catalog.len(), 2);

        assert_eq!(
            catalog.get("First"),
            Some("####.# T#.#  ###.#ZP  #.#  B #.#  ###.####")
        );
        assert_eq!(
            catalog.get("2"),
            Some("00####.###  ####.#     B #.# #  #B #.# T T#P #.#########")
        );

        let board = catalog.board("2").unwrap();
        assert_eq!(board.locate_player(), (6, 4));
    }

    #[test]
    fn test_from_xsb_invalid_level() {
        let xsb_content = "; 1

####
# .#
#@@  #
####
";

        let result = LevelCatalog::from_xsb(xsb_content);
        assert!(matches!(result, Err(LevelError::InvalidLevel { name, .. }) if name == "1"));

        let result = LevelCatalog::from_xsb("#@$.!#\n");
        assert!(matches!(result, Err(LevelError::InvalidLevel { .. })));
    }

    #[test]
    fn test_from_xsb_duplicate_names() {
        // The second level is unnamed and numbered 2, clashing with the first
        let result = LevelCatalog::from_xsb("; 2\n#@$.#\n\n#.$@#\n");
        assert!(matches!(result, Err(LevelError::DuplicateLevel(name)) if name == "2"));

        let result = LevelCatalog::from_xsb("; Twin\n#@$.#\n; Twin\n#.$@#\n");
        assert!(matches!(result, Err(LevelError::DuplicateLevel(name)) if name == "Twin"));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = LevelCatalog::from_file("nonexistent_file.xsb");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), LevelError::Io(_)));
    }

    #[test]
    fn test_search() {
        let entries = (1..=30).map(|i| (format!("Level {:02}", i), "#P#".to_string()));
        let catalog = LevelCatalog::from_entries(entries).unwrap();

        assert_eq!(catalog.search("level").len(), MAX_SEARCH_RESULTS);
        let expected: Vec<String> = (10..=19).map(|i| format!("Level {}", i)).collect();
        assert_eq!(catalog.search("LEVEL 1"), expected);
        assert_eq!(catalog.search("30"), vec!["Level 30"]);
        assert!(catalog.search("nothing").is_empty());
    }

    #[test]
    fn test_random_is_seeded() {
        let entries = (1..=10).map(|i| (i.to_string(), "#P#".to_string()));
        let catalog = LevelCatalog::from_entries(entries).unwrap();

        let mut first = ChaCha8Rng::seed_from_u64(7);
        let mut second = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..5 {
            let pick = catalog.random(&mut first);
            assert!(pick.is_some());
            assert_eq!(pick, catalog.random(&mut second));
        }

        let empty = LevelCatalog::from_entries(Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.random(&mut first), None);
    }
}
