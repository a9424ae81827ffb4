/// Tavern Night example — parses a storyboard asset and plays it through.
///
/// A party of three walks into a tavern, splits up over a decision and
/// regroups on a branch. Every player picks the first option open to them,
/// rotated by roster index so the party actually splits.
///
/// Run with: cargo run --example tavern_night

use std::collections::VecDeque;

use storyboard_script::core::parser::StoryboardParser;
use storyboard_script::core::playback::{available_decisions, resolve_branch, NarrativeFork};
use storyboard_script::core::text::{player_name_string, replace_player};
use storyboard_script::schema::character::{CharacterState, Thresholds};
use storyboard_script::schema::game_data::GameData;
use storyboard_script::schema::panel::{PanelInfo, PROP_MERGE, PROP_PARTY_SPLIT};
use storyboard_script::schema::stat::CharacterStat;
use storyboard_script::schema::storyboard::{StoryboardData, StoryboardUri};

const ASSET_NAME: &str = "tavern_night";
const ASSET_TEXT: &str = include_str!("data/tavern_night.txt");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // --- Parse the asset ---
    let parser = StoryboardParser::builder().max_narration_lines(3).build();
    let report = parser.parse_report(ASSET_NAME, ASSET_TEXT);
    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }
    let storyboards = report.storyboards;

    // --- Define the party ---
    let mut data = GameData::new(
        vec![
            adventurer("Mira Vale", 4, 6, 3, &["Sneaky"]),
            adventurer("Brann Holt", 7, 2, 2, &["Loud"]),
            adventurer("Tessaly Quinn", 3, 3, 5, &[]),
        ],
        Vec::new(),
        Vec::new(),
    );

    println!("========================================");
    println!("   THE CROOKED LANTERN");
    println!("   A Tavern Night in Storyboards");
    println!("========================================");
    println!();

    let everyone: Vec<usize> = (0..data.characters.len()).collect();
    let mut queue: VecDeque<(String, Vec<usize>)> = VecDeque::new();
    queue.push_back((ASSET_NAME.to_string(), everyone));

    while let Some((name, players)) = queue.pop_front() {
        let Some(board) = storyboards.get(&name) else {
            println!("[Missing storyboard: {}]", name);
            continue;
        };
        for (uri, group) in play_storyboard(board, &players, &mut data) {
            match local_board(&uri) {
                Some(next) => queue.push_back((next, group)),
                None => println!("[Skipping non-local target {}]", uri),
            }
        }
    }

    println!("========================================");
    println!("   FIN");
    println!("========================================");
    println!();
    for character in &data.characters {
        println!(
            "{:<14} STR {:>2}  TUF {:>2}  DEX {:>2}  WIL {:>2}  MONEY {:>3}  [{}]",
            character.name,
            character.stat(CharacterStat::Str),
            character.stat(CharacterStat::Tuf),
            character.stat(CharacterStat::Dex),
            character.stat(CharacterStat::Wil),
            character.stat(CharacterStat::Money),
            character.traits.join(", ")
        );
    }
    println!("Session: {}", data.session_traits.join(", "));
}

fn adventurer(
    name: &str,
    strength: i32,
    dexterity: i32,
    perception: i32,
    traits: &[&str],
) -> CharacterState {
    let mut character = CharacterState::new(name);
    for stat in CharacterStat::ALL {
        character.set_stat(stat, 5);
    }
    character.set_stat(CharacterStat::Str, strength);
    character.set_stat(CharacterStat::Dex, dexterity);
    character.set_stat(CharacterStat::Per, perception);
    character.set_stat(CharacterStat::Money, 10);
    character.thresholds = Thresholds {
        physical: 0,
        mental: 0,
        debt: -20,
    };
    for t in traits {
        character.add_trait(*t);
    }
    character
}

/// Strip the `data:{asset}-` prefix from a local target.
fn local_board(uri: &str) -> Option<String> {
    let uri = StoryboardUri::parse(uri)?;
    if !uri.is_data() {
        return None;
    }
    let prefix = format!("{}-", ASSET_NAME);
    uri.board_name()
        .strip_prefix(&prefix)
        .map(str::to_string)
}

/// Play every panel of a storyboard for `players`, returning the
/// storyboards to queue next, in playback order.
fn play_storyboard(
    board: &StoryboardData,
    players: &[usize],
    data: &mut GameData,
) -> Vec<(String, Vec<usize>)> {
    let mut next = Vec::new();
    let is_party = players.len() == data.characters.len();
    let names = player_name_string(
        players.iter().filter_map(|&i| data.characters.get(i)),
        is_party,
    );
    println!("--- {} ({}) ---", board.id, names);

    for panel in &board.panels {
        let mut fork = NarrativeFork::new();
        match panel {
            PanelInfo::Narrative { text, effect, .. } => {
                println!("{}", replace_player(text, &names));
                for &player in players {
                    let Some(character) = data.characters.get_mut(player) else {
                        continue;
                    };
                    for change in &effect.stat_changes {
                        character.apply_change(change);
                    }
                    for t in &effect.character_traits {
                        character.add_trait(t.clone());
                    }
                }
                data.encounter_traits.extend(effect.encounter_traits.iter().cloned());
                data.session_traits.extend(effect.session_traits.iter().cloned());
                record_deaths(players, data);
            }
            PanelInfo::Decision {
                prompt, options, ..
            } => {
                println!("{}", replace_player(prompt, &names));
                let merge = panel.flag(PROP_MERGE, true);
                for &player in players {
                    let snapshot = data.for_players(&[player]);
                    let open = match available_decisions(options, &snapshot) {
                        Ok(open) => open,
                        Err(e) => {
                            println!("[Condition error: {}]", e);
                            continue;
                        }
                    };
                    if open.is_empty() {
                        continue;
                    }
                    let choice = open[player % open.len()];
                    let chooser = snapshot.characters.first().map_or("?", |c| c.first_name());
                    println!("  {} chooses: {}", chooser, choice.text);
                    fork.pick_decision(player, choice, merge);
                }
            }
            PanelInfo::Branch { options, .. } => {
                let merge = panel.flag(PROP_MERGE, true);
                let groups: Vec<Vec<usize>> = if panel.flag(PROP_PARTY_SPLIT, true) {
                    players.iter().map(|&p| vec![p]).collect()
                } else {
                    vec![players.to_vec()]
                };
                for group in groups {
                    match resolve_branch(options, &data.for_players(&group)) {
                        Ok(Some(option)) => fork.pick_branch(&group, option, merge),
                        Ok(None) => {}
                        Err(e) => println!("[Condition error: {}]", e),
                    }
                }
            }
        }
        next.extend(
            fork.send_off(&data.characters)
                .into_iter()
                .map(|group| (group.target_uri, group.players)),
        );
    }
    println!();
    next
}

fn record_deaths(players: &[usize], data: &mut GameData) {
    let mut deaths: Vec<(usize, CharacterStat)> = Vec::new();
    for &player in players {
        if let Some(character) = data.characters.get(player) {
            if let Some(stat) = character.limits_reached().first() {
                deaths.push((player, *stat));
            }
        }
    }
    for (player, stat) in deaths {
        let trait_name = stat.death_trait().to_string();
        if !data.session_traits.contains(&trait_name) {
            println!("  [{} has fallen: {}]", data.characters[player].name, trait_name);
            data.session_traits.push(trait_name);
        }
    }
}
