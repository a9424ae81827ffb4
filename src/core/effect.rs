/// Effect-line grammar: `str+5 dex-1 money=0 +"Brave" session+"Alarm raised"`.
///
/// Two independent regex passes run over the same text, so stat and
/// trait mutations can be mixed freely on one logical line.

use regex_lite::Regex;
use std::sync::LazyLock;

use crate::schema::character::StatChange;
use crate::schema::panel::NarrativeEffect;
use crate::schema::stat::CharacterStat;

static STAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z]+)\s*([+=-])\s*(-?[0-9]+)").expect("valid regex")
});
static TRAIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)([a-z]+)?\s*\+\s*"([^"]*)""#).expect("valid regex"));

/// Something in an effect line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectIssue {
    UnknownStat(String),
    UnknownTraitScope(String),
    /// The value does not fit in a stat.
    InvalidValue(String),
}

/// Extract every stat and trait mutation from an effect line.
///
/// Unrecognised pieces are reported back instead of aborting, so one
/// typo does not cost the whole line.
pub fn parse_effect_line(input: &str) -> (NarrativeEffect, Vec<EffectIssue>) {
    let mut effect = NarrativeEffect::default();
    let mut issues = Vec::new();

    for caps in STAT_RE.captures_iter(input) {
        let name = &caps[1];
        let Some(stat) = CharacterStat::from_keyword(name) else {
            issues.push(EffectIssue::UnknownStat(name.to_string()));
            continue;
        };
        let Ok(value) = caps[3].parse::<i32>() else {
            issues.push(EffectIssue::InvalidValue(caps[0].to_string()));
            continue;
        };
        let change = match &caps[2] {
            "+" => StatChange::add(stat, value),
            "-" => StatChange::add(stat, value.saturating_neg()),
            _ => StatChange::set(stat, value),
        };
        effect.stat_changes.push(change);
    }

    for caps in TRAIT_RE.captures_iter(input) {
        let name = caps[2].to_string();
        let scope = caps.get(1).map(|m| m.as_str().to_ascii_lowercase());
        match scope.as_deref() {
            None => effect.character_traits.push(name),
            Some("encounter") => effect.encounter_traits.push(name),
            Some("session") => effect.session_traits.push(name),
            Some(other) => issues.push(EffectIssue::UnknownTraitScope(other.to_string())),
        }
    }

    (effect, issues)
}
