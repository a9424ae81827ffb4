/// Playback helpers: choosing branches, filtering decisions and ordering
/// the groups a fork sends off.

use crate::core::condition::ConditionParser;
use crate::core::lexer::ConditionError;
use crate::schema::character::CharacterState;
use crate::schema::game_data::GameData;
use crate::schema::panel::{BranchOption, DecisionOption};

/// The first branch, in listed order, whose condition holds.
pub fn resolve_branch<'o>(
    options: &'o [BranchOption],
    data: &GameData,
) -> Result<Option<&'o BranchOption>, ConditionError> {
    let parser = ConditionParser::new(data);
    for option in options {
        if parser.evaluate_optional(option.condition.as_deref())? {
            tracing::debug!(target_uri = %option.target_uri, "branch taken");
            return Ok(Some(option));
        }
    }
    Ok(None)
}

/// The decision options a player may pick, in listed order.
///
/// `data` should hold only the choosing player's character.
pub fn available_decisions<'o>(
    options: &'o [DecisionOption],
    data: &GameData,
) -> Result<Vec<&'o DecisionOption>, ConditionError> {
    let parser = ConditionParser::new(data);
    let mut available = Vec::with_capacity(options.len());
    for option in options {
        if parser.evaluate_optional(option.condition.as_deref())? {
            available.push(option);
        }
    }
    Ok(available)
}

/// Players heading to the same storyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkGroup {
    /// Roster indices.
    pub players: Vec<usize>,
    pub target_uri: String,
    /// Base playback order of the picked option.
    pub order: i32,
}

impl ForkGroup {
    /// Playback order adjusted by the group's initiative.
    ///
    /// Average initiative (rounded half to even) plus a bonus of one for
    /// every two extra members is subtracted from the base order, so
    /// quicker and bigger groups play first. Players missing from the
    /// roster do not count.
    pub fn final_order(&self, roster: &[CharacterState]) -> i32 {
        let initiatives: Vec<i32> = self
            .players
            .iter()
            .filter_map(|&index| roster.get(index))
            .map(CharacterState::initiative)
            .collect();
        if initiatives.is_empty() {
            return self.order;
        }

        let size = initiatives.len() as i32;
        let sum: i64 = initiatives.iter().map(|&i| i64::from(i)).sum();
        let average = (sum as f64 / f64::from(size)).round_ties_even() as i32;
        let size_bonus = (size - 1) / 2;
        self.order.saturating_sub(average.saturating_add(size_bonus))
    }
}

/// Collects player picks, then hands back groups in playback order.
///
/// Call [`pick`](Self::pick) once per player (or group) and choice, then
/// [`send_off`](Self::send_off).
#[derive(Debug, Clone, Default)]
pub struct NarrativeFork {
    /// Each group with whether later picks may join it.
    groups: Vec<(ForkGroup, bool)>,
}

impl NarrativeFork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `players` chose `target_uri`. With `merge`, they join
    /// an earlier mergeable group headed to the same target.
    pub fn pick(&mut self, players: &[usize], target_uri: &str, order: i32, merge: bool) {
        if merge {
            let existing = self
                .groups
                .iter_mut()
                .find(|(group, mergeable)| *mergeable && group.target_uri == target_uri);
            if let Some((group, _)) = existing {
                for &player in players {
                    if !group.players.contains(&player) {
                        group.players.push(player);
                    }
                }
                return;
            }
        }

        self.groups.push((
            ForkGroup {
                players: players.to_vec(),
                target_uri: target_uri.to_string(),
                order,
            },
            merge,
        ));
    }

    pub fn pick_decision(&mut self, player: usize, option: &DecisionOption, merge: bool) {
        self.pick(&[player], &option.target_uri, option.order, merge);
    }

    pub fn pick_branch(&mut self, players: &[usize], option: &BranchOption, merge: bool) {
        self.pick(players, &option.target_uri, option.order, merge);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drain every group, lowest final order first. Ties keep pick order.
    pub fn send_off(&mut self, roster: &[CharacterState]) -> Vec<ForkGroup> {
        let mut groups: Vec<(i32, ForkGroup)> = self
            .groups
            .drain(..)
            .map(|(group, _)| (group.final_order(roster), group))
            .collect();
        groups.sort_by_key(|(order, _)| *order);
        groups.into_iter().map(|(_, group)| group).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::CharacterStat;

    fn runner(name: &str, dexterity: i32, perception: i32) -> CharacterState {
        let mut c = CharacterState::new(name);
        c.set_stat(CharacterStat::Dex, dexterity);
        c.set_stat(CharacterStat::Per, perception);
        c
    }

    fn branch(target: &str, condition: Option<&str>) -> BranchOption {
        BranchOption {
            target_uri: target.to_string(),
            condition: condition.map(str::to_string),
            order: 0,
        }
    }

    #[test]
    fn first_satisfied_branch_wins() {
        let mut strong = CharacterState::new("Ada");
        strong.set_stat(CharacterStat::Str, 8);
        let data = GameData::with_characters(vec![strong]);

        let options = vec![
            branch("data:a-weak", Some("str < 3")),
            branch("data:a-strong", Some("str > 5")),
            branch("data:a-fallback", None),
        ];
        let taken = resolve_branch(&options, &data).unwrap();
        assert_eq!(taken.map(|o| o.target_uri.as_str()), Some("data:a-strong"));
    }

    #[test]
    fn no_branch_when_nothing_holds() {
        let data = GameData::default();
        let options = vec![branch("data:a-x", Some(r#"session has trait "Never""#))];
        assert_eq!(resolve_branch(&options, &data).unwrap(), None);
        assert_eq!(resolve_branch(&[], &data).unwrap(), None);
    }

    #[test]
    fn broken_condition_is_an_error() {
        let data = GameData::default();
        let options = vec![branch("data:a-x", Some("has trait"))];
        assert!(resolve_branch(&options, &data).is_err());
    }

    #[test]
    fn decisions_filtered_per_player() {
        let mut sneaky = CharacterState::new("Ada");
        sneaky.add_trait("Sneaky");
        let data = GameData::with_characters(vec![sneaky]);

        let options = vec![
            DecisionOption {
                text: "Fight".to_string(),
                target_uri: "data:a-fight".to_string(),
                condition: None,
                order: 10,
            },
            DecisionOption {
                text: "Sneak".to_string(),
                target_uri: "data:a-sneak".to_string(),
                condition: Some(r#"has trait "Sneaky""#.to_string()),
                order: 5,
            },
            DecisionOption {
                text: "Bribe".to_string(),
                target_uri: "data:a-bribe".to_string(),
                condition: Some("money > 10".to_string()),
                order: 5,
            },
        ];
        let texts: Vec<&str> = available_decisions(&options, &data)
            .unwrap()
            .into_iter()
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Fight", "Sneak"]);
    }

    #[test]
    fn final_order_uses_group_initiative() {
        let roster = vec![runner("Ada", 3, 2), runner("Bo", 1, 1), runner("Cy", 4, 4)];
        let solo = ForkGroup {
            players: vec![0],
            target_uri: "data:a-x".to_string(),
            order: 10,
        };
        assert_eq!(solo.final_order(&roster), 5);

        // Average of 5, 2 and 8 is 5, plus one for the extra members.
        let trio = ForkGroup {
            players: vec![0, 1, 2],
            ..solo.clone()
        };
        assert_eq!(trio.final_order(&roster), 4);

        // Index 4 is not on the roster.
        let pair = ForkGroup {
            players: vec![1, 4],
            ..solo.clone()
        };
        assert_eq!(pair.final_order(&roster), 8);
        // 3.5 rounds to 4.
        let pair = ForkGroup {
            players: vec![1, 0],
            ..solo.clone()
        };
        assert_eq!(pair.final_order(&roster), 6);

        let nobody = ForkGroup {
            players: vec![],
            ..solo
        };
        assert_eq!(nobody.final_order(&roster), 10);
    }

    #[test]
    fn fork_merges_same_target() {
        let mut fork = NarrativeFork::new();
        fork.pick(&[0], "data:a-x", 10, true);
        fork.pick(&[1], "data:a-y", 10, true);
        fork.pick(&[2, 0], "data:a-x", 10, true);
        assert_eq!(fork.len(), 2);

        let roster = vec![runner("Ada", 0, 0), runner("Bo", 0, 0), runner("Cy", 0, 0)];
        let groups = fork.send_off(&roster);
        assert!(fork.is_empty());
        assert_eq!(groups[0].players, vec![0, 2]);
        assert_eq!(groups[1].players, vec![1]);
    }

    #[test]
    fn fork_without_merge_keeps_groups_apart() {
        let mut fork = NarrativeFork::new();
        fork.pick(&[0], "data:a-x", 10, false);
        fork.pick(&[1], "data:a-x", 10, true);
        fork.pick(&[2], "data:a-x", 10, true);
        let groups = fork.send_off(&[]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].players, vec![0]);
        assert_eq!(groups[1].players, vec![1, 2]);
    }

    #[test]
    fn send_off_orders_by_final_order_then_pick_order() {
        let roster = vec![runner("Slow", 1, 0), runner("Quick", 6, 3), runner("Mid", 2, 2)];
        let mut fork = NarrativeFork::new();
        fork.pick(&[0], "data:a-slow", 10, true);
        fork.pick(&[1], "data:a-quick", 10, true);
        fork.pick(&[2], "data:a-early", 7, true);
        fork.pick(&[2], "data:a-late", 20, false);

        let targets: Vec<String> = fork
            .send_off(&roster)
            .into_iter()
            .map(|g| g.target_uri)
            .collect();
        // Final orders: slow 9, quick 1, early 3, late 16.
        assert_eq!(
            targets,
            vec!["data:a-quick", "data:a-early", "data:a-slow", "data:a-late"]
        );
    }
}
