/// Condition evaluation against a game state snapshot.

use crate::core::lexer::{BoolOp, ConditionError, Phrase, StatPhrase, Target, TraitPhrase};
use crate::core::tree::{ConditionTree, ExpressionNode};
use crate::schema::character::CharacterState;
use crate::schema::game_data::GameData;

/// What a phrase is currently being tested against.
#[derive(Debug, Clone, Copy)]
enum Binding<'a> {
    /// No target encloses the phrase yet.
    Unbound,
    Character(&'a CharacterState),
    Party,
    Encounter,
    Session,
}

/// Evaluates condition scripts against one [`GameData`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConditionParser<'a> {
    data: &'a GameData,
}

impl<'a> ConditionParser<'a> {
    pub fn new(data: &'a GameData) -> Self {
        Self { data }
    }

    /// Lex, build and evaluate a script.
    ///
    /// A blank script has no requirements and is always satisfied. Any
    /// lexing or structural problem is returned as an error so authoring
    /// mistakes surface instead of silently picking a branch.
    pub fn evaluate(&self, script: &str) -> Result<bool, ConditionError> {
        if script.trim().is_empty() {
            return Ok(true);
        }
        let tree = ConditionTree::parse(script)?;
        let result = evaluate_tree(&tree.root, self.data);
        tracing::trace!(script, result, "evaluated condition");
        Ok(result)
    }

    /// Same as [`evaluate`](Self::evaluate), with a missing script treated as blank.
    pub fn evaluate_optional(&self, script: Option<&str>) -> Result<bool, ConditionError> {
        self.evaluate(script.unwrap_or_default())
    }
}

/// Evaluate a script against a snapshot in one call.
pub fn evaluate(script: &str, data: &GameData) -> Result<bool, ConditionError> {
    ConditionParser::new(data).evaluate(script)
}

/// Evaluate an already built tree. Infallible: the builder has already
/// rejected anything that could not be evaluated.
pub fn evaluate_tree(root: &ExpressionNode, data: &GameData) -> bool {
    evaluate_node(root, data, Binding::Unbound)
}

fn evaluate_node(node: &ExpressionNode, data: &GameData, binding: Binding<'_>) -> bool {
    match node {
        ExpressionNode::Phrase(phrase) => evaluate_phrase(phrase, data, binding),
        ExpressionNode::Bool { op, lhs, rhs } => match op {
            BoolOp::And => evaluate_node(lhs, data, binding) && evaluate_node(rhs, data, binding),
            BoolOp::Or => evaluate_node(lhs, data, binding) || evaluate_node(rhs, data, binding),
        },
        ExpressionNode::Target { scope, inner } => match scope {
            // First character that satisfies the clause wins.
            Target::Character => data
                .characters
                .iter()
                .any(|character| evaluate_node(inner, data, Binding::Character(character))),
            Target::Party => evaluate_node(inner, data, Binding::Party),
            Target::Encounter => evaluate_node(inner, data, Binding::Encounter),
            Target::Session => evaluate_node(inner, data, Binding::Session),
        },
    }
}

fn evaluate_phrase(phrase: &Phrase, data: &GameData, binding: Binding<'_>) -> bool {
    match (phrase, binding) {
        // Outside any target a phrase reads as if it said `character`.
        (_, Binding::Unbound) => data
            .characters
            .iter()
            .any(|character| evaluate_phrase(phrase, data, Binding::Character(character))),

        (Phrase::Trait(t), Binding::Character(character)) => {
            character.has_all_traits(&t.traits) != t.inverse
        }
        (Phrase::Trait(t), Binding::Party) => {
            let traits = data.party_traits();
            trait_check(t, |name| traits.contains(name))
        }
        (Phrase::Trait(t), Binding::Encounter) => {
            trait_check(t, |name| data.encounter_traits.iter().any(|e| e == name))
        }
        (Phrase::Trait(t), Binding::Session) => {
            trait_check(t, |name| data.session_traits.iter().any(|s| s == name))
        }

        (Phrase::Stat(s), Binding::Character(character)) => {
            stat_check(s, i64::from(character.stat(s.stat)))
        }
        (Phrase::Stat(s), Binding::Party) => {
            let sum = data
                .characters
                .iter()
                .map(|character| i64::from(character.stat(s.stat)))
                .sum();
            stat_check(s, sum)
        }
        // Rejected by the builder; only reachable with hand-made trees.
        (Phrase::Stat(_), Binding::Encounter | Binding::Session) => false,
    }
}

fn trait_check(phrase: &TraitPhrase, has: impl Fn(&str) -> bool) -> bool {
    let has_all = phrase.traits.iter().all(|name| has(name));
    has_all != phrase.inverse
}

fn stat_check(phrase: &StatPhrase, value: i64) -> bool {
    phrase.comparison.compare(value, i64::from(phrase.number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::CharacterStat;

    fn character(name: &str, strength: i32, traits: &[&str]) -> CharacterState {
        let mut c = CharacterState::new(name);
        c.set_stat(CharacterStat::Str, strength);
        for t in traits {
            c.add_trait(*t);
        }
        c
    }

    fn party() -> GameData {
        GameData::new(
            vec![
                character("Ada", 6, &["Brave", "Clever"]),
                character("Bo", 5, &["Cursed"]),
            ],
            vec!["Ambush".to_string()],
            vec!["Night".to_string(), "Rain".to_string()],
        )
    }

    #[test]
    fn blank_scripts_are_satisfied() {
        let data = GameData::default();
        let parser = ConditionParser::new(&data);
        assert!(parser.evaluate("").unwrap());
        assert!(parser.evaluate("  \t\n ").unwrap());
        assert!(parser.evaluate_optional(None).unwrap());
    }

    #[test]
    fn character_target_is_any_character() {
        let data = party();
        assert!(evaluate(r#"character has trait "Cursed""#, &data).unwrap());
        assert!(!evaluate(r#"character has trait "Lucky""#, &data).unwrap());
        // Both traits must hold on the same character.
        assert!(!evaluate(r#"character has trait "Brave" and has trait "Cursed""#, &data).unwrap());
        assert!(evaluate(r#"character has trait "Brave" and str > 5"#, &data).unwrap());
        assert!(!evaluate(r#"character has trait "Cursed" and str > 5"#, &data).unwrap());
    }

    #[test]
    fn empty_roster_fails_character_checks() {
        let data = GameData::default();
        assert!(!evaluate(r#"character has trait "Brave""#, &data).unwrap());
        assert!(!evaluate(r#"character has not trait "Brave""#, &data).unwrap());
    }

    #[test]
    fn party_sums_stats_and_unions_traits() {
        let data = party();
        assert!(evaluate("party strength > 10", &data).unwrap());
        assert!(!evaluate("party strength > 11", &data).unwrap());
        assert!(evaluate("party str = 11", &data).unwrap());
        assert!(evaluate(r#"party has trait "Brave" "Cursed""#, &data).unwrap());
        assert!(!evaluate(r#"party has trait "Brave" "Lucky""#, &data).unwrap());
    }

    #[test]
    fn scoped_traits() {
        let data = party();
        assert!(evaluate(r#"encounter has trait "Ambush""#, &data).unwrap());
        assert!(evaluate(r#"storyboard has trait "Ambush""#, &data).unwrap());
        assert!(!evaluate(r#"session has trait "Ambush""#, &data).unwrap());
        assert!(evaluate(r#"session has trait "Night" "Rain""#, &data).unwrap());
    }

    #[test]
    fn inverse_means_not_all() {
        let data = party();
        assert!(evaluate(r#"session has not trait "Night" "Fog""#, &data).unwrap());
        assert!(!evaluate(r#"session has not trait "Night" "Rain""#, &data).unwrap());
    }

    #[test]
    fn comparisons() {
        let data = GameData::with_characters(vec![character("Ada", 6, &[])]);
        assert!(evaluate("str > 5", &data).unwrap());
        assert!(evaluate("str < 7", &data).unwrap());
        assert!(evaluate("str = 6", &data).unwrap());
        assert!(evaluate("str != 5", &data).unwrap());
        assert!(!evaluate("str != 6", &data).unwrap());
        assert!(evaluate("money > -1", &data).unwrap());
    }

    #[test]
    fn comma_requires_every_clause() {
        let data = party();
        let rain = r#"character has trait "Brave", session has trait "Rain""#;
        assert!(evaluate(rain, &data).unwrap());
        let snow = r#"character has trait "Brave", session has trait "Snow""#;
        assert!(!evaluate(snow, &data).unwrap());
    }

    #[test]
    fn errors_propagate() {
        let data = party();
        assert!(evaluate("character has trait", &data).is_err());
        assert!(evaluate("session str > 1", &data).is_err());
        assert!(matches!(
            evaluate("str > 1 $", &data),
            Err(ConditionError::InvalidCharacter { character: '$', .. })
        ));
    }

    #[test]
    fn hand_built_stat_under_session_is_false() {
        let root = ExpressionNode::Target {
            scope: Target::Session,
            inner: Box::new(ExpressionNode::Phrase(Phrase::Stat(StatPhrase {
                stat: CharacterStat::Str,
                comparison: crate::core::lexer::Comparison::Gt,
                number: -100,
            }))),
        };
        assert!(!evaluate_tree(&root, &party()));
    }
}
