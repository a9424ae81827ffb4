use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::character::CharacterState;

/// Read-only snapshot of everything a condition can look at.
///
/// The caller filters `characters` down to the players a condition is
/// about before building the snapshot; the condition language has no
/// player selection of its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameData {
    pub characters: Vec<CharacterState>,
    pub encounter_traits: Vec<String>,
    pub session_traits: Vec<String>,
}

impl GameData {
    pub fn new(
        characters: Vec<CharacterState>,
        encounter_traits: Vec<String>,
        session_traits: Vec<String>,
    ) -> Self {
        Self {
            characters,
            encounter_traits,
            session_traits,
        }
    }

    /// A snapshot holding only the given characters and no scoped traits.
    pub fn with_characters(characters: Vec<CharacterState>) -> Self {
        Self {
            characters,
            ..Self::default()
        }
    }

    pub fn living_characters(&self) -> impl Iterator<Item = &CharacterState> {
        self.characters.iter().filter(|c| c.is_alive())
    }

    /// A copy narrowed to the roster indices in `players`, keeping the
    /// encounter and session traits. Out of range indices are skipped.
    pub fn for_players(&self, players: &[usize]) -> GameData {
        GameData {
            characters: players
                .iter()
                .filter_map(|&index| self.characters.get(index).cloned())
                .collect(),
            encounter_traits: self.encounter_traits.clone(),
            session_traits: self.session_traits.clone(),
        }
    }

    /// Union of every trait held by any character in the snapshot.
    pub fn party_traits(&self) -> FxHashSet<&str> {
        self.characters
            .iter()
            .flat_map(|c| c.traits.iter().map(String::as_str))
            .collect()
    }

    /// Load a snapshot from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<GameData, GameDataError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a snapshot from a RON string.
    pub fn parse_ron(input: &str) -> Result<GameData, GameDataError> {
        Ok(ron::from_str(input)?)
    }
}

#[derive(Debug, Error)]
pub enum GameDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
