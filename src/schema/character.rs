use serde::{Deserialize, Serialize};

use super::stat::{CharacterStat, StatGroup};

/// The raw stat values of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    pub strength: i32,
    pub toughness: i32,
    pub dexterity: i32,
    pub perception: i32,
    pub magic: i32,
    pub knowledge: i32,
    pub charisma: i32,
    pub willpower: i32,
    pub lethality: i32,
    pub money: i32,
}

impl StatBlock {
    pub fn get(&self, stat: CharacterStat) -> i32 {
        match stat {
            CharacterStat::Str => self.strength,
            CharacterStat::Tuf => self.toughness,
            CharacterStat::Dex => self.dexterity,
            CharacterStat::Per => self.perception,
            CharacterStat::Mag => self.magic,
            CharacterStat::Kno => self.knowledge,
            CharacterStat::Cha => self.charisma,
            CharacterStat::Wil => self.willpower,
            CharacterStat::Let => self.lethality,
            CharacterStat::Money => self.money,
        }
    }

    pub fn set(&mut self, stat: CharacterStat, value: i32) {
        let slot = match stat {
            CharacterStat::Str => &mut self.strength,
            CharacterStat::Tuf => &mut self.toughness,
            CharacterStat::Dex => &mut self.dexterity,
            CharacterStat::Per => &mut self.perception,
            CharacterStat::Mag => &mut self.magic,
            CharacterStat::Kno => &mut self.knowledge,
            CharacterStat::Cha => &mut self.charisma,
            CharacterStat::Wil => &mut self.willpower,
            CharacterStat::Let => &mut self.lethality,
            CharacterStat::Money => &mut self.money,
        };
        *slot = value;
    }
}

/// Values at or below which a stat group kills the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub physical: i32,
    pub mental: i32,
    pub debt: i32,
}

impl Thresholds {
    pub fn for_group(&self, group: StatGroup) -> i32 {
        match group {
            StatGroup::Physical => self.physical,
            StatGroup::Mental => self.mental,
            StatGroup::Debt => self.debt,
        }
    }
}

/// A single stat mutation described by an effect line.
///
/// Additive changes add `value` to the current stat; absolute changes
/// overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatChange {
    pub stat: CharacterStat,
    pub value: i32,
    pub additive: bool,
}

impl StatChange {
    pub fn add(stat: CharacterStat, value: i32) -> Self {
        Self {
            stat,
            value,
            additive: true,
        }
    }

    pub fn set(stat: CharacterStat, value: i32) -> Self {
        Self {
            stat,
            value,
            additive: false,
        }
    }
}

/// A character's stat block, traits and death thresholds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterState {
    pub name: String,
    pub title: String,
    pub stats: StatBlock,
    /// Insertion ordered. Kept as a list so authored order survives round trips.
    pub traits: Vec<String>,
    pub thresholds: Thresholds,
}

impl CharacterState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Everything before the first space of the name, or the whole name.
    pub fn first_name(&self) -> &str {
        match self.name.find(' ') {
            Some(index) if index > 0 => &self.name[..index],
            _ => &self.name,
        }
    }

    /// Everything after the first space of the name, or "".
    pub fn last_name(&self) -> &str {
        match self.name.find(' ') {
            Some(index) if index > 0 => &self.name[index + 1..],
            _ => "",
        }
    }

    pub fn stat(&self, stat: CharacterStat) -> i32 {
        self.stats.get(stat)
    }

    pub fn set_stat(&mut self, stat: CharacterStat, value: i32) {
        self.stats.set(stat, value);
    }

    /// Apply a stat change in place.
    pub fn apply_change(&mut self, change: &StatChange) {
        let value = if change.additive {
            self.stat(change.stat).saturating_add(change.value)
        } else {
            change.value
        };
        self.set_stat(change.stat, value);
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t == name)
    }

    /// Returns true if this character has ALL of the given traits.
    pub fn has_all_traits<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| self.has_trait(name.as_ref()))
    }

    pub fn add_trait(&mut self, name: impl Into<String>) {
        self.traits.push(name.into());
    }

    /// Removes the first occurrence. Returns false if the trait was absent.
    pub fn remove_trait(&mut self, name: &str) -> bool {
        match self.traits.iter().position(|t| t == name) {
            Some(index) => {
                self.traits.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn limit_reached(&self, stat: CharacterStat) -> bool {
        match stat.group() {
            Some(group) => self.stat(stat) <= self.thresholds.for_group(group),
            None => false,
        }
    }

    /// Every stat currently at or past its group's threshold, in stat order.
    pub fn limits_reached(&self) -> Vec<CharacterStat> {
        CharacterStat::ALL
            .into_iter()
            .filter(|stat| self.limit_reached(*stat))
            .collect()
    }

    /// False as soon as any threshold is breached.
    pub fn is_alive(&self) -> bool {
        !CharacterStat::ALL
            .iter()
            .any(|stat| self.limit_reached(*stat))
    }

    /// Base initiative used to order branch playback.
    pub fn initiative(&self) -> i32 {
        self.stats.dexterity + self.stats.perception
    }
}
