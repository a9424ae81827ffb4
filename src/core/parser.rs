/// Storyboard markup parser — text asset → named storyboards.
///
/// The format is line oriented; the first character of a line decides
/// what it is:
///
/// ```text
/// # comment
/// >>name              start a storyboard (blank name = the asset's name)
/// ^&key=value         storyboard property
/// &key=value          property for the next panel
/// |text               narration line
/// :effect             effects of the narration above
/// ?text               decision prompt line
/// [condition]         guard for the option line below it
/// -order-text-<target decision option
/// -order-<target      branch option
/// ```
///
/// Authoring mistakes never abort a parse. Each one becomes a
/// [`ParseWarning`] naming the asset and line, is logged, and the
/// offending construct is dropped.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

use crate::core::effect::{parse_effect_line, EffectIssue};
use crate::core::lexer::ConditionError;
use crate::core::tree::ConditionTree;
use crate::schema::panel::{BranchOption, DecisionOption, NarrativeEffect, PanelInfo};
use crate::schema::storyboard::{StoryboardData, StoryboardUri};

static DECISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*(\d+)\s*-(.*?)-<(.*)$").expect("valid regex"));
static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*(\d+)\s*-<(.*)$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ParserConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Limits and switches for a parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Most `|` lines a single narration panel may hold.
    pub max_narration_lines: usize,
    /// Most `?` lines a single decision prompt may hold.
    pub max_prompt_lines: usize,
    /// Compile every guard while parsing and warn about broken ones.
    pub validate_conditions: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_narration_lines: 3,
            max_prompt_lines: 2,
            validate_conditions: true,
        }
    }
}

impl ParserConfig {
    /// Load a parser config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ParserConfig, ParserConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a parser config from a RON string. Missing fields keep their defaults.
    pub fn parse_ron(input: &str) -> Result<ParserConfig, ParserConfigError> {
        Ok(ron::from_str(input)?)
    }
}

/// What went wrong on a line. Only used for its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarningKind {
    #[error("extra storyboard label \"{0}\"; each storyboard name may only appear once per asset")]
    DuplicateStoryboard(String),
    #[error("line \"{0}\" is not inside any storyboard")]
    OutsideStoryboard(String),
    #[error("invalid property \"{0}\"; must be of format {{key}}={{value}}")]
    InvalidProperty(String),
    #[error("panel properties at the end of the storyboard are not attached to any panel")]
    UnusedPanelProperties,
    #[error("invalid stat \"{0}\"")]
    InvalidStat(String),
    #[error("invalid stat value in \"{0}\"")]
    InvalidStatValue(String),
    #[error("unknown trait scope \"{0}\"; expected encounter, session or nothing")]
    UnknownTraitScope(String),
    #[error("too many narration lines; maximum narration lines = {0}")]
    TooManyNarrationLines(usize),
    #[error("too many prompt lines; maximum prompt lines = {0}")]
    TooManyPromptLines(usize),
    #[error("decision panel has no options")]
    EmptyDecision,
    #[error("malformed decision option \"{0}\"; expected -order-text-<target")]
    MalformedDecision(String),
    #[error("malformed branch option \"{0}\"; expected -order-<target")]
    MalformedBranch(String),
    #[error("option \"{0}\" does not belong to any decision or branch panel")]
    OrphanOption(String),
    #[error("condition is not followed by an option line")]
    DanglingCondition,
    #[error("condition is never closed with ']'")]
    UnclosedCondition,
    #[error("invalid condition \"{condition}\": {error}")]
    InvalidCondition {
        condition: String,
        error: ConditionError,
    },
    #[error("unrecognized line \"{0}\"")]
    UnrecognizedLine(String),
}

/// A recoverable problem found while parsing an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub asset: String,
    /// 1-based line numbers in the raw asset.
    pub lines: Vec<usize>,
    pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .lines
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match self.lines.len() {
            0 => write!(f, "storyboard asset \"{}\": {}", self.asset, self.kind),
            1 => write!(f, "storyboard asset \"{}\" line {}: {}", self.asset, lines, self.kind),
            _ => write!(f, "storyboard asset \"{}\" lines {}: {}", self.asset, lines, self.kind),
        }
    }
}

/// Everything a parse produced.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub storyboards: HashMap<String, StoryboardData>,
    pub warnings: Vec<ParseWarning>,
}

/// Parses storyboard markup assets.
#[derive(Debug, Clone, Default)]
pub struct StoryboardParser {
    config: ParserConfig,
}

/// Builder for constructing a `StoryboardParser`.
#[derive(Debug, Clone, Default)]
pub struct StoryboardParserBuilder {
    config: ParserConfig,
}

impl StoryboardParserBuilder {
    pub fn max_narration_lines(mut self, lines: usize) -> Self {
        self.config.max_narration_lines = lines;
        self
    }

    pub fn max_prompt_lines(mut self, lines: usize) -> Self {
        self.config.max_prompt_lines = lines;
        self
    }

    pub fn validate_conditions(mut self, validate: bool) -> Self {
        self.config.validate_conditions = validate;
        self
    }

    /// Replace every setting at once, e.g. with a config loaded from RON.
    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> StoryboardParser {
        StoryboardParser {
            config: self.config,
        }
    }
}

impl StoryboardParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StoryboardParserBuilder {
        StoryboardParserBuilder::default()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse an asset into storyboards keyed by name, logging any warnings.
    pub fn parse(&self, asset_name: &str, raw_text: &str) -> HashMap<String, StoryboardData> {
        self.parse_report(asset_name, raw_text).storyboards
    }

    /// Parse an asset, returning the storyboards together with the warnings.
    pub fn parse_report(&self, asset_name: &str, raw_text: &str) -> ParseReport {
        let mut run = ParseRun {
            asset: asset_name,
            config: &self.config,
            lines: preprocess(raw_text),
            warnings: Vec::new(),
        };
        let storyboards = run.process();
        ParseReport {
            storyboards,
            warnings: run.warnings,
        }
    }
}

#[derive(Debug, Clone)]
struct NumberedLine {
    number: usize,
    text: String,
}

fn is_blank(line: &NumberedLine) -> bool {
    line.text.is_empty()
}

/// Trim every line, drop comments and collapse runs of blank lines.
fn preprocess(raw_text: &str) -> VecDeque<NumberedLine> {
    let mut lines = VecDeque::new();
    let mut previous_blank = false;
    for (index, raw) in raw_text.lines().enumerate() {
        let text = raw.trim();
        if text.starts_with('#') {
            continue;
        }
        if text.is_empty() && previous_blank {
            continue;
        }
        previous_blank = text.is_empty();
        lines.push_back(NumberedLine {
            number: index + 1,
            text: text.to_string(),
        });
    }
    lines
}

/// How the line at the front of the queue starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    BoardStart,
    BoardProperty,
    PanelProperty,
    Narration,
    Prompt,
    Option,
    Blank,
    Other,
}

fn classify(text: &str) -> LineKind {
    if text.starts_with(">>") {
        LineKind::BoardStart
    } else if text.starts_with("^&") {
        LineKind::BoardProperty
    } else if text.starts_with('&') {
        LineKind::PanelProperty
    } else if text.starts_with('|') {
        LineKind::Narration
    } else if text.starts_with('?') {
        LineKind::Prompt
    } else if text.starts_with('[') || text.starts_with('-') {
        LineKind::Option
    } else if text.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Other
    }
}

/// Shape of an option line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionForm {
    Decision,
    Branch,
    Malformed,
}

fn option_form(text: &str) -> OptionForm {
    if DECISION_RE.is_match(text) {
        OptionForm::Decision
    } else if BRANCH_RE.is_match(text) {
        OptionForm::Branch
    } else {
        OptionForm::Malformed
    }
}

/// State of one `parse` call.
struct ParseRun<'a> {
    asset: &'a str,
    config: &'a ParserConfig,
    lines: VecDeque<NumberedLine>,
    warnings: Vec<ParseWarning>,
}

impl ParseRun<'_> {
    fn warn(&mut self, lines: Vec<usize>, kind: WarningKind) {
        tracing::warn!(asset = self.asset, lines = ?lines, "{kind}");
        self.warnings.push(ParseWarning {
            asset: self.asset.to_string(),
            lines,
            kind,
        });
    }

    fn front_kind(&self) -> Option<LineKind> {
        self.lines.front().map(|line| classify(&line.text))
    }

    fn next_if_starts_with(&mut self, prefix: char) -> Option<NumberedLine> {
        if self
            .lines
            .front()
            .is_some_and(|line| line.text.starts_with(prefix))
        {
            self.lines.pop_front()
        } else {
            None
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.lines.front().is_some_and(is_blank) {
            self.lines.pop_front();
        }
    }

    fn process(&mut self) -> HashMap<String, StoryboardData> {
        let mut storyboards = HashMap::new();

        while let Some(line) = self.lines.pop_front() {
            if let Some(rest) = line.text.strip_prefix(">>") {
                let name = match rest.trim() {
                    "" => self.asset.to_string(),
                    name => name.to_string(),
                };
                if storyboards.contains_key(&name) {
                    self.warn(vec![line.number], WarningKind::DuplicateStoryboard(name));
                    self.skip_storyboard();
                } else {
                    let board = self.storyboard(name.clone());
                    tracing::debug!(
                        asset = self.asset,
                        storyboard = %name,
                        panels = board.panels.len(),
                        "parsed storyboard"
                    );
                    storyboards.insert(name, board);
                }
            } else if !line.text.is_empty() {
                self.warn(
                    vec![line.number],
                    WarningKind::OutsideStoryboard(line.text),
                );
            }
        }

        storyboards
    }

    fn skip_storyboard(&mut self) {
        while self
            .front_kind()
            .is_some_and(|kind| kind != LineKind::BoardStart)
        {
            self.lines.pop_front();
        }
    }

    fn storyboard(&mut self, id: String) -> StoryboardData {
        let mut panels = Vec::new();
        let mut properties = HashMap::new();
        let mut panel_properties = HashMap::new();
        let mut pending_property_lines = Vec::new();

        while let Some(kind) = self.front_kind() {
            let panel = match kind {
                LineKind::BoardStart => break,
                LineKind::BoardProperty => {
                    if let Some(line) = self.lines.pop_front() {
                        self.property(line, &mut properties);
                    }
                    None
                }
                LineKind::PanelProperty => {
                    if let Some(line) = self.lines.pop_front() {
                        pending_property_lines.push(line.number);
                        self.property(line, &mut panel_properties);
                    }
                    None
                }
                LineKind::Narration => {
                    Some(self.narrative_panel(std::mem::take(&mut panel_properties)))
                }
                LineKind::Prompt => {
                    Some(self.decision_panel(std::mem::take(&mut panel_properties)))
                }
                LineKind::Option => self.branch_panel(&mut panel_properties),
                LineKind::Blank => {
                    self.lines.pop_front();
                    None
                }
                LineKind::Other => {
                    if let Some(line) = self.lines.pop_front() {
                        self.warn(vec![line.number], WarningKind::UnrecognizedLine(line.text));
                    }
                    None
                }
            };
            if let Some(panel) = panel {
                panels.push(panel);
                pending_property_lines.clear();
            }
        }

        if !panel_properties.is_empty() {
            self.warn(pending_property_lines, WarningKind::UnusedPanelProperties);
        }

        StoryboardData {
            id,
            panels,
            properties,
        }
    }

    /// `&key=value` or `^&key=value`.
    fn property(&mut self, line: NumberedLine, properties: &mut HashMap<String, String>) {
        let body = match line.text.find('&') {
            Some(index) => &line.text[index + 1..],
            None => line.text.as_str(),
        };
        let pair = body
            .split_once('=')
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty());
        match pair {
            Some((key, value)) => {
                properties.insert(key, value);
            }
            None => self.warn(vec![line.number], WarningKind::InvalidProperty(line.text)),
        }
    }

    fn narrative_panel(&mut self, properties: HashMap<String, String>) -> PanelInfo {
        let max = self.config.max_narration_lines;
        let mut narration = Vec::new();
        while let Some(line) = self.next_if_starts_with('|') {
            if narration.len() < max {
                narration.push(line.text[1..].trim_start().to_string());
            } else {
                self.warn(vec![line.number], WarningKind::TooManyNarrationLines(max));
            }
        }

        // Effect lines directly below the narration, blank lines allowed in between.
        let mut effect_text = Vec::new();
        let mut effect_lines = Vec::new();
        loop {
            self.skip_blank_lines();
            let Some(line) = self.next_if_starts_with(':') else {
                break;
            };
            effect_text.push(line.text[1..].trim().to_string());
            effect_lines.push(line.number);
        }

        let effect = if effect_text.is_empty() {
            NarrativeEffect::default()
        } else {
            let (effect, issues) = parse_effect_line(&effect_text.join(" "));
            for issue in issues {
                let kind = match issue {
                    EffectIssue::UnknownStat(stat) => WarningKind::InvalidStat(stat),
                    EffectIssue::UnknownTraitScope(scope) => WarningKind::UnknownTraitScope(scope),
                    EffectIssue::InvalidValue(text) => WarningKind::InvalidStatValue(text),
                };
                self.warn(effect_lines.clone(), kind);
            }
            effect
        };

        PanelInfo::Narrative {
            properties,
            text: narration.join("\n"),
            effect,
        }
    }

    fn decision_panel(&mut self, properties: HashMap<String, String>) -> PanelInfo {
        let max = self.config.max_prompt_lines;
        let mut prompt = Vec::new();
        let mut first_line = None;
        while let Some(line) = self.next_if_starts_with('?') {
            first_line.get_or_insert(line.number);
            if prompt.len() < max {
                prompt.push(line.text[1..].trim_start().to_string());
            } else {
                self.warn(vec![line.number], WarningKind::TooManyPromptLines(max));
            }
        }

        let mut options = Vec::new();
        while matches!(
            self.upcoming_option(),
            Some(OptionForm::Decision | OptionForm::Malformed)
        ) {
            let condition = self.read_condition();
            self.skip_blank_lines();
            let Some(line) = self.lines.pop_front() else {
                break;
            };
            match self.decision_option(&line.text, condition) {
                Some(option) => options.push(option),
                None => self.warn(vec![line.number], WarningKind::MalformedDecision(line.text)),
            }
        }

        if options.is_empty() {
            self.warn(first_line.into_iter().collect(), WarningKind::EmptyDecision);
        }

        PanelInfo::Decision {
            properties,
            prompt: prompt.join("\n"),
            options,
        }
    }

    /// Parses a branch panel. Returns `None` when the lines at the front
    /// do not form a single usable branch; those lines are consumed and
    /// the pending properties stay for the next panel.
    fn branch_panel(&mut self, properties: &mut HashMap<String, String>) -> Option<PanelInfo> {
        let mut options = Vec::new();
        while matches!(
            self.upcoming_option(),
            Some(OptionForm::Branch | OptionForm::Malformed)
        ) {
            let condition = self.read_condition();
            self.skip_blank_lines();
            let Some(line) = self.lines.pop_front() else {
                break;
            };
            match self.branch_option(&line.text, condition) {
                Some(option) => options.push(option),
                None => self.warn(vec![line.number], WarningKind::MalformedBranch(line.text)),
            }
        }

        if options.is_empty() {
            self.drop_orphan_option();
            return None;
        }

        Some(PanelInfo::Branch {
            properties: std::mem::take(properties),
            options,
        })
    }

    /// Consume a condition and/or option line that no panel can use.
    fn drop_orphan_option(&mut self) {
        let had_condition = self
            .lines
            .front()
            .is_some_and(|line| line.text.starts_with('['));
        let condition_start = self.lines.front().map(|line| line.number);
        let condition = self.read_condition();
        self.skip_blank_lines();
        match self.next_if_starts_with('-') {
            Some(line) => {
                let malformed = option_form(&line.text) == OptionForm::Decision
                    && self.decision_option(&line.text, None).is_none();
                let kind = if malformed {
                    WarningKind::MalformedDecision(line.text)
                } else {
                    WarningKind::OrphanOption(line.text)
                };
                self.warn(vec![line.number], kind);
            }
            None if had_condition && condition.is_some() => {
                self.warn(condition_start.into_iter().collect(), WarningKind::DanglingCondition)
            }
            None => {}
        }
    }

    /// Find the form of the next option line, looking past an optional
    /// condition, without consuming anything.
    fn upcoming_option(&self) -> Option<OptionForm> {
        let mut lines = self.lines.iter().skip_while(|line| is_blank(line));
        let mut line = lines.next()?;
        if line.text.starts_with('[') {
            while !line.text.ends_with(']') {
                line = lines.next()?;
                if line.text.starts_with(">>") {
                    return None;
                }
            }
            line = lines.find(|line| !is_blank(line))?;
        }
        if line.text.starts_with('-') {
            Some(option_form(&line.text))
        } else {
            None
        }
    }

    /// Consume a `[...]` condition, possibly spread over several lines.
    /// Returns the text between the brackets, or `None` if there is no
    /// condition or it is empty.
    fn read_condition(&mut self) -> Option<String> {
        self.skip_blank_lines();
        let first = self.next_if_starts_with('[')?;
        let start = first.number;
        let mut parts = vec![first.text];

        while !parts.last().is_some_and(|text| text.ends_with(']')) {
            let next = match self.front_kind() {
                Some(LineKind::BoardStart) | None => None,
                Some(_) => self.lines.pop_front(),
            };
            match next {
                Some(line) => parts.push(line.text),
                None => {
                    self.warn(vec![start], WarningKind::UnclosedCondition);
                    return None;
                }
            }
        }

        let joined = parts.join("\n");
        let condition = joined
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or_default()
            .trim();
        if condition.is_empty() {
            return None;
        }

        if self.config.validate_conditions {
            if let Err(error) = ConditionTree::parse(condition) {
                self.warn(
                    vec![start],
                    WarningKind::InvalidCondition {
                        condition: condition.to_string(),
                        error,
                    },
                );
            }
        }
        Some(condition.to_string())
    }

    fn decision_option(&self, text: &str, condition: Option<String>) -> Option<DecisionOption> {
        let caps = DECISION_RE.captures(text)?;
        let order = caps[1].parse().ok()?;
        let target = caps[3].trim();
        if target.is_empty() {
            return None;
        }
        Some(DecisionOption {
            text: caps[2].trim().to_string(),
            target_uri: StoryboardUri::resolve(self.asset, target),
            condition,
            order,
        })
    }

    fn branch_option(&self, text: &str, condition: Option<String>) -> Option<BranchOption> {
        let caps = BRANCH_RE.captures(text)?;
        let order = caps[1].parse().ok()?;
        let target = caps[2].trim();
        if target.is_empty() {
            return None;
        }
        Some(BranchOption {
            target_uri: StoryboardUri::resolve(self.asset, target),
            condition,
            order,
        })
    }
}
