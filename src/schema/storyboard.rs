use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::panel::PanelInfo;

/// Scheme for storyboards parsed from markup assets.
pub const DATA_SCHEME: &str = "data";
/// Scheme for hand-built storyboards.
pub const PREFAB_SCHEME: &str = "prefab";

/// One named, playable unit of narrative content.
///
/// Built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryboardData {
    pub id: String,
    pub panels: Vec<PanelInfo>,
    pub properties: HashMap<String, String>,
}

/// A `scheme:path` reference to a storyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryboardUri {
    pub scheme: String,
    pub path: String,
}

impl StoryboardUri {
    /// Resolve an authored target against the asset it was written in.
    ///
    /// A bare name is local to the asset and becomes `data:{asset}-{name}`.
    /// Anything carrying a scheme is kept verbatim.
    pub fn resolve(asset_name: &str, target: &str) -> String {
        let target = target.trim();
        if target.contains(':') {
            target.to_string()
        } else {
            format!("{DATA_SCHEME}:{asset_name}-{target}")
        }
    }

    /// Split a resolved URI. Returns `None` when there is no scheme.
    pub fn parse(uri: &str) -> Option<StoryboardUri> {
        let (scheme, path) = uri.split_once(':')?;
        Some(StoryboardUri {
            scheme: scheme.trim().to_string(),
            path: path.trim().to_string(),
        })
    }

    pub fn is_data(&self) -> bool {
        self.scheme == DATA_SCHEME
    }

    /// The storyboard name: everything after the last `/` of the path.
    pub fn board_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }

    /// The asset location: everything before the last `/`, if any.
    pub fn asset_path(&self) -> Option<&str> {
        self.path.rfind('/').map(|index| &self.path[..index])
    }
}

impl std::fmt::Display for StoryboardUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}
