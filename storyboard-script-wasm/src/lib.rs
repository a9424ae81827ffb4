//! WASM bindings for storyboard-script — powers the web authoring preview.

use std::collections::HashMap;
use wasm_bindgen::prelude::*;

use storyboard_script::core::condition;
use storyboard_script::core::parser::{ParseWarning, StoryboardParser};
use storyboard_script::core::playback::{available_decisions, resolve_branch};
use storyboard_script::core::text::{player_name_string, replace_player};
use storyboard_script::core::tree::ConditionTree;
use storyboard_script::schema::game_data::GameData;
use storyboard_script::schema::panel::PanelInfo;
use storyboard_script::schema::storyboard::StoryboardData;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct WarningInfo {
    lines: Vec<usize>,
    message: String,
}

impl From<&ParseWarning> for WarningInfo {
    fn from(warning: &ParseWarning) -> Self {
        Self {
            lines: warning.lines.clone(),
            message: warning.kind.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct ParseOutput<'a> {
    storyboards: &'a HashMap<String, StoryboardData>,
    warnings: Vec<WarningInfo>,
}

#[derive(serde::Serialize)]
struct OptionInfo<'a> {
    text: &'a str,
    target_uri: &'a str,
    order: i32,
}

fn parse_game_data(json: &str) -> Result<GameData, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Game data parse error: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Stateless helpers
// ---------------------------------------------------------------------------

/// Evaluate a condition script against a JSON game data snapshot.
#[wasm_bindgen]
pub fn evaluate_condition(script: &str, game_data_json: &str) -> Result<bool, JsError> {
    let data = parse_game_data(game_data_json)?;
    condition::evaluate(script, &data).map_err(|e| JsError::new(&e.to_string()))
}

/// Check a condition script without evaluating it. Returns the error
/// message, or an empty string when the script is valid.
#[wasm_bindgen]
pub fn check_condition(script: &str) -> String {
    if script.trim().is_empty() {
        return String::new();
    }
    match ConditionTree::parse(script) {
        Ok(_) => String::new(),
        Err(e) => e.to_string(),
    }
}

/// Parse a storyboard asset and return its storyboards and warnings as JSON.
#[wasm_bindgen]
pub fn parse_storyboards(asset_name: &str, text: &str) -> Result<String, JsError> {
    let report = StoryboardParser::new().parse_report(asset_name, text);
    to_json(&ParseOutput {
        storyboards: &report.storyboards,
        warnings: report.warnings.iter().map(WarningInfo::from).collect(),
    })
}

// ---------------------------------------------------------------------------
// Stateful preview
// ---------------------------------------------------------------------------

/// A parsed asset plus a game data snapshot to step through it with.
#[wasm_bindgen]
pub struct StoryboardPreview {
    storyboards: HashMap<String, StoryboardData>,
    warnings: Vec<ParseWarning>,
    data: GameData,
}

#[wasm_bindgen]
impl StoryboardPreview {
    /// Parse `text` as the asset `asset_name`.
    #[wasm_bindgen(constructor)]
    pub fn new(asset_name: &str, text: &str) -> StoryboardPreview {
        let report = StoryboardParser::new().parse_report(asset_name, text);
        StoryboardPreview {
            storyboards: report.storyboards,
            warnings: report.warnings,
            data: GameData::default(),
        }
    }

    /// Replace the game data snapshot.
    pub fn set_game_data(&mut self, game_data_json: &str) -> Result<(), JsError> {
        self.data = parse_game_data(game_data_json)?;
        Ok(())
    }

    pub fn storyboard_names(&self) -> Result<String, JsError> {
        let mut names: Vec<&str> = self.storyboards.keys().map(String::as_str).collect();
        names.sort_unstable();
        to_json(&names)
    }

    pub fn warnings(&self) -> Result<String, JsError> {
        let warnings: Vec<WarningInfo> = self.warnings.iter().map(WarningInfo::from).collect();
        to_json(&warnings)
    }

    pub fn storyboard(&self, name: &str) -> Result<String, JsError> {
        to_json(self.board(name)?)
    }

    /// Narration text with `{player}` filled in for the given roster indices.
    pub fn narration(
        &self,
        name: &str,
        panel: usize,
        players_json: &str,
    ) -> Result<String, JsError> {
        let players: Vec<usize> = serde_json::from_str(players_json)
            .map_err(|e| JsError::new(&format!("Player list parse error: {e}")))?;
        let PanelInfo::Narrative { text, .. } = self.panel(name, panel)? else {
            return Err(JsError::new(&format!("Panel {panel} of {name} is not narration")));
        };
        let is_party = !players.is_empty() && players.len() == self.data.characters.len();
        let characters = players
            .iter()
            .filter_map(|&index| self.data.characters.get(index));
        Ok(replace_player(text, &player_name_string(characters, is_party)))
    }

    /// Target of the branch taken by the whole snapshot, or `undefined`.
    pub fn resolve_branch(&self, name: &str, panel: usize) -> Result<Option<String>, JsError> {
        let PanelInfo::Branch { options, .. } = self.panel(name, panel)? else {
            return Err(JsError::new(&format!("Panel {panel} of {name} is not a branch")));
        };
        let taken = resolve_branch(options, &self.data).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(taken.map(|option| option.target_uri.clone()))
    }

    /// JSON list of the decision options the given player may pick.
    pub fn available_decisions(
        &self,
        name: &str,
        panel: usize,
        player: usize,
    ) -> Result<String, JsError> {
        let PanelInfo::Decision { options, .. } = self.panel(name, panel)? else {
            return Err(JsError::new(&format!("Panel {panel} of {name} is not a decision")));
        };
        let data = self.data.for_players(&[player]);
        let available =
            available_decisions(options, &data).map_err(|e| JsError::new(&e.to_string()))?;
        let info: Vec<OptionInfo<'_>> = available
            .into_iter()
            .map(|option| OptionInfo {
                text: &option.text,
                target_uri: &option.target_uri,
                order: option.order,
            })
            .collect();
        to_json(&info)
    }
}

impl StoryboardPreview {
    fn board(&self, name: &str) -> Result<&StoryboardData, JsError> {
        self.storyboards
            .get(name)
            .ok_or_else(|| JsError::new(&format!("Unknown storyboard: {name}")))
    }

    fn panel(&self, name: &str, panel: usize) -> Result<&PanelInfo, JsError> {
        self.board(name)?
            .panels
            .get(panel)
            .ok_or_else(|| JsError::new(&format!("Storyboard {name} has no panel {panel}")))
    }
}
