use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::character::StatChange;

/// Panel property naming an image to show behind the panel.
pub const PROP_BACKDROP: &str = "backdrop";
/// Panel property: players picking the same continuation travel together.
pub const PROP_MERGE: &str = "merge";
/// Panel property: queued continuations interrupt the current board.
pub const PROP_INTERRUPT: &str = "interrupt";
/// Panel property: branches are resolved per player instead of per group.
pub const PROP_PARTY_SPLIT: &str = "can-split-party";

/// Every mutation a narration panel applies when it is committed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NarrativeEffect {
    pub stat_changes: Vec<StatChange>,
    pub character_traits: Vec<String>,
    pub encounter_traits: Vec<String>,
    pub session_traits: Vec<String>,
}

impl NarrativeEffect {
    pub fn is_empty(&self) -> bool {
        self.stat_changes.is_empty()
            && self.character_traits.is_empty()
            && self.encounter_traits.is_empty()
            && self.session_traits.is_empty()
    }
}

/// A button a player can pick on a decision panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub text: String,
    pub target_uri: String,
    /// Guard in the condition language. `None` means always available.
    pub condition: Option<String>,
    /// Base initiative order.
    pub order: i32,
}

/// An automatic continuation on a branch panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOption {
    pub target_uri: String,
    pub condition: Option<String>,
    pub order: i32,
}

/// Discriminant of a [`PanelInfo`], handy for summaries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelType {
    Narrative,
    Decision,
    Branch,
}

/// One step of a storyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelInfo {
    Narrative {
        properties: HashMap<String, String>,
        text: String,
        effect: NarrativeEffect,
    },
    Decision {
        properties: HashMap<String, String>,
        prompt: String,
        options: Vec<DecisionOption>,
    },
    Branch {
        properties: HashMap<String, String>,
        options: Vec<BranchOption>,
    },
}

impl PanelInfo {
    pub fn panel_type(&self) -> PanelType {
        match self {
            Self::Narrative { .. } => PanelType::Narrative,
            Self::Decision { .. } => PanelType::Decision,
            Self::Branch { .. } => PanelType::Branch,
        }
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        match self {
            Self::Narrative { properties, .. }
            | Self::Decision { properties, .. }
            | Self::Branch { properties, .. } => properties,
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties().get(key).map(String::as_str)
    }

    /// Read a boolean property, falling back to `default` when the key is
    /// missing or its value is not `true`/`false`.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.property(key).map(str::to_ascii_lowercase).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => default,
        }
    }

    pub fn backdrop(&self) -> Option<&str> {
        self.property(PROP_BACKDROP)
    }
}
