use serde::{Deserialize, Serialize};

/// The ten numeric stats every character carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterStat {
    Str,
    Tuf,
    Dex,
    Per,
    Mag,
    Kno,
    Cha,
    Wil,
    Let,
    Money,
}

/// Which limit threshold a stat is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatGroup {
    Physical,
    Mental,
    Debt,
}

impl CharacterStat {
    pub const ALL: [CharacterStat; 10] = [
        Self::Str,
        Self::Tuf,
        Self::Dex,
        Self::Per,
        Self::Mag,
        Self::Kno,
        Self::Cha,
        Self::Wil,
        Self::Let,
        Self::Money,
    ];

    /// Resolve a stat keyword or synonym, ignoring case.
    ///
    /// Shared by the condition lexer and the effect-line grammar so the
    /// two languages always agree on what `str`, `swagger` or `dough` mean.
    pub fn from_keyword(word: &str) -> Option<CharacterStat> {
        let stat = match word.to_ascii_lowercase().as_str() {
            "strength" | "str" => Self::Str,
            "toughness" | "tuf" => Self::Tuf,
            "dexterity" | "dex" => Self::Dex,
            "perception" | "per" => Self::Per,
            "magic" | "mag" => Self::Mag,
            "knowledge" | "kno" => Self::Kno,
            "charisma" | "cha" | "swagger" | "madlad" => Self::Cha,
            "willpower" | "wil" => Self::Wil,
            "lethality" | "let" => Self::Let,
            "money" | "dough" => Self::Money,
            _ => return None,
        };
        Some(stat)
    }

    /// Short display name, e.g. "STR".
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Str => "STR",
            Self::Tuf => "TUF",
            Self::Dex => "DEX",
            Self::Per => "PER",
            Self::Mag => "MAG",
            Self::Kno => "KNO",
            Self::Cha => "CHA",
            Self::Wil => "WIL",
            Self::Let => "LET",
            Self::Money => "MONEY",
        }
    }

    /// The threshold group this stat dies against. Lethality has none.
    pub fn group(&self) -> Option<StatGroup> {
        match self {
            Self::Str | Self::Tuf | Self::Dex | Self::Per => Some(StatGroup::Physical),
            Self::Mag | Self::Kno | Self::Cha | Self::Wil => Some(StatGroup::Mental),
            Self::Money => Some(StatGroup::Debt),
            Self::Let => None,
        }
    }

    /// Session trait recorded when a character dies from this stat's limit.
    pub fn death_trait(&self) -> &'static str {
        match self {
            Self::Str => "Strength Limit Death",
            Self::Tuf => "Toughness Limit Death",
            Self::Dex => "Dexterity Limit Death",
            Self::Per => "Perception Limit Death",
            Self::Mag => "Magic Limit Death",
            Self::Kno => "Knowledge Limit Death",
            Self::Cha => "Charisma Limit Death",
            Self::Wil => "Willpower Limit Death",
            Self::Let => "Lethality Limit Death",
            Self::Money => "Debt Limit Death",
        }
    }
}

impl std::fmt::Display for CharacterStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}
