/// Condition language integration tests against a RON party fixture.

use std::path::Path;

use proptest::prelude::*;
use storyboard_script::core::condition::{evaluate, ConditionParser};
use storyboard_script::core::lexer::ConditionError;
use storyboard_script::schema::character::CharacterState;
use storyboard_script::schema::game_data::GameData;
use storyboard_script::schema::stat::CharacterStat;

fn party() -> GameData {
    GameData::load_from_ron(Path::new("tests/fixtures/party.ron")).unwrap()
}

fn holding(traits: &[&str]) -> GameData {
    let mut character = CharacterState::new("Solo");
    for t in traits {
        character.add_trait(*t);
    }
    GameData::with_characters(vec![character])
}

#[test]
fn party_fixture_loads() {
    let data = party();
    assert_eq!(data.characters.len(), 3);
    assert_eq!(data.characters[0].first_name(), "Ada");
    assert_eq!(data.characters[0].title, "the Clever");
    assert_eq!(data.characters[1].stat(CharacterStat::Money), -2);
    assert_eq!(data.encounter_traits, vec!["Ambush".to_string()]);
}

#[test]
fn blank_scripts_are_true() {
    let data = party();
    let parser = ConditionParser::new(&data);
    assert_eq!(parser.evaluate(""), Ok(true));
    assert_eq!(parser.evaluate("   \n\t"), Ok(true));
    assert_eq!(parser.evaluate_optional(None), Ok(true));
}

#[test]
fn any_character_may_satisfy_a_trait_check() {
    let data = party();
    assert_eq!(evaluate(r#"character has trait "Sneaky""#, &data), Ok(true));
    assert_eq!(evaluate(r#"character has trait "Scholar" "Brave""#, &data), Ok(true));
    assert_eq!(evaluate(r#"character has trait "Sneaky" "Brave""#, &data), Ok(false));
    assert_eq!(evaluate(r#"character has trait "Royal""#, &data), Ok(false));
    assert_eq!(
        evaluate(r#"character has trait "Brave""#, &GameData::default()),
        Ok(false)
    );
}

#[test]
fn party_stats_are_summed() {
    let data = party();
    assert_eq!(evaluate("party strength > 15", &data), Ok(true));
    assert_eq!(evaluate("party str = 16", &data), Ok(true));
    assert_eq!(evaluate("party money > 39", &data), Ok(true));
    assert_eq!(evaluate("party dough > 40", &data), Ok(false));

    let mut a = CharacterState::new("A");
    a.set_stat(CharacterStat::Str, 6);
    let mut b = CharacterState::new("B");
    b.set_stat(CharacterStat::Str, 5);
    let pair = GameData::with_characters(vec![a, b]);
    assert_eq!(evaluate("party strength > 10", &pair), Ok(true));
}

#[test]
fn inverse_trait_checks() {
    let data = party();
    // Ada and Cass are not cursed.
    assert_eq!(evaluate(r#"character has not trait "Cursed""#, &data), Ok(true));
    assert_eq!(evaluate(r#"party has not trait "Cursed""#, &data), Ok(false));
    assert_eq!(evaluate(r#"session has not trait "Night" "Fog""#, &data), Ok(true));

    let cursed = holding(&["Cursed"]);
    assert_eq!(evaluate(r#"character has not trait "Cursed""#, &cursed), Ok(false));
    assert_eq!(evaluate(r#"character has not trait "Blessed""#, &cursed), Ok(true));
}

#[test]
fn and_binds_tighter_than_or() {
    let script = r#"trait "A" or trait "B" and trait "C""#;
    assert_eq!(evaluate(script, &holding(&["A"])), Ok(true));
    assert_eq!(evaluate(script, &holding(&["B"])), Ok(false));
    assert_eq!(evaluate(script, &holding(&["B", "C"])), Ok(true));
    assert_eq!(evaluate(r#"(trait "A" or trait "B") and trait "C""#, &holding(&["A"])), Ok(false));
}

#[test]
fn scoped_and_grouped_expressions() {
    let data = party();
    assert_eq!(
        evaluate(
            r#"session has trait "Night" and (encounter has trait "Ambush" or party dex > 100)"#,
            &data
        ),
        Ok(true)
    );
    assert_eq!(
        evaluate(r#"storyboard has trait "Ambush" and has not trait "Alarm""#, &data),
        Ok(true)
    );
    assert_eq!(
        evaluate(r#"character has trait "Sneaky", session has trait "Rain""#, &data),
        Ok(true)
    );
    assert_eq!(
        evaluate(r#"character has trait "Sneaky", session has trait "Snow""#, &data),
        Ok(false)
    );
    assert_eq!(evaluate(r#"CHARACTER Has Trait "Brave" AND Swagger > 4"#, &data), Ok(true));
}

#[test]
fn narrowed_snapshots() {
    let data = party();
    let cass = data.for_players(&[2]);
    assert_eq!(evaluate("money > 20", &cass), Ok(true));
    let ada = data.for_players(&[0]);
    assert_eq!(evaluate("money > 20", &ada), Ok(false));
    assert_eq!(evaluate(r#"encounter has trait "Ambush""#, &ada), Ok(true));
}

#[test]
fn malformed_scripts_are_errors() {
    let data = party();
    assert!(matches!(
        evaluate("character has trait", &data),
        Err(ConditionError::Lexing(_))
    ));
    assert!(matches!(
        evaluate("str > 5 % 2", &data),
        Err(ConditionError::InvalidCharacter { character: '%', position: 8 })
    ));
    for script in [
        r#"trait "A" and"#,
        r#"(trait "A""#,
        r#"trait "A")"#,
        r#"session str > 1"#,
        r#"trait "A", trait "B""#,
        r#"trait "unterminated"#,
        "luck > 3",
    ] {
        assert!(evaluate(script, &data).is_err(), "expected an error for {script:?}");
    }
}

#[test]
fn overly_long_chains_are_errors() {
    let data = party();
    let short = vec![r#"trait "Brave""#; 100].join(" and ");
    assert_eq!(evaluate(&short, &data), Ok(true));

    let long = vec![r#"trait "Brave""#; 5000].join(" and ");
    assert!(matches!(evaluate(&long, &data), Err(ConditionError::Lexing(_))));
    let long = vec!["str > 1"; 5000].join(" or ");
    assert!(matches!(
        evaluate(&long, &GameData::default()),
        Err(ConditionError::Lexing(_))
    ));
}

const STAT_WORDS: &[&str] = &[
    "strength", "str", "STR", "toughness", "tuf", "dexterity", "dex", "perception", "per",
    "magic", "mag", "knowledge", "kno", "charisma", "cha", "swagger", "madlad", "willpower",
    "wil", "lethality", "let", "money", "dough",
];
const COMPARISONS: &[&str] = &[">", "<", "=", "!="];

fn stat_phrase() -> impl Strategy<Value = String> {
    (
        prop::sample::select(STAT_WORDS),
        prop::sample::select(COMPARISONS),
        -1000i32..1000,
    )
        .prop_map(|(stat, comparison, number)| format!("{stat} {comparison} {number}"))
}

fn trait_phrase() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::collection::vec("[A-Za-z][A-Za-z ]{0,10}", 1..4),
    )
        .prop_map(|(has, not, names)| {
            let prefix = match (has, not) {
                (true, true) => "has not ",
                (true, false) => "has ",
                _ => "",
            };
            let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
            format!("{prefix}trait {}", quoted.join(" "))
        })
}

fn trait_expression() -> impl Strategy<Value = String> {
    trait_phrase().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} and {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} or {b}")),
            inner.prop_map(|a| format!("({a})")),
        ]
    })
}

fn condition() -> impl Strategy<Value = String> {
    let trait_scope = (
        prop::sample::select(vec!["encounter", "storyboard", "session"]),
        trait_expression(),
    )
        .prop_map(|(target, inner)| format!("({target} {inner})"));
    let leaf = prop_oneof![stat_phrase(), trait_phrase(), trait_scope];

    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} and {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} or {b}")),
            inner.clone().prop_map(|a| format!("({a})")),
            (prop::sample::select(vec!["character", "party"]), inner.clone())
                .prop_map(|(target, a)| format!("({target} {a})")),
            (inner.clone(), inner).prop_map(|(a, b)| format!("(character {a}, party {b})")),
        ]
    })
}

proptest! {
    #[test]
    fn well_formed_conditions_always_evaluate(script in condition()) {
        let data = party();
        prop_assert!(evaluate(&script, &data).is_ok(), "failed on {}", script);
        prop_assert!(evaluate(&script, &GameData::default()).is_ok(), "failed on {}", script);
    }

    #[test]
    fn whitespace_only_is_true(script in "[ \t\r\n]{0,16}") {
        prop_assert_eq!(evaluate(&script, &GameData::default()), Ok(true));
    }
}
