//! Combatant records and the numeric stat block they own.

use strum::{Display, EnumString};

use super::{CharacterId, PlayerId};

/// Which roster a combatant belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    /// Enemy combatant controlled by the host's AI.
    Hostile,
    /// Character controlled by a human participant.
    PlayerAlly,
    /// Friendly combatant controlled by the host's AI.
    AiAlly,
}

impl Faction {
    /// Board side this faction stands on.
    pub const fn side(self) -> Side {
        match self {
            Faction::Hostile => Side::Hostile,
            Faction::PlayerAlly | Faction::AiAlly => Side::Friendly,
        }
    }

    pub const fn is_ai_controlled(self) -> bool {
        matches!(self, Faction::Hostile | Faction::AiAlly)
    }
}

/// One half of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Hostile,
    Friendly,
}

impl Side {
    pub const fn opposite(self) -> Side {
        match self {
            Side::Hostile => Side::Friendly,
            Side::Friendly => Side::Hostile,
        }
    }
}

/// Final numeric profile of a combatant, produced by stat generation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    pub max_health: u32,
    pub defence: u32,
    pub min_damage: u32,
    pub max_damage: u32,
    pub action_points: u32,
    /// Crit chance on the crit-roll scale (see [`crate::combat::CRIT_ROLL_CEILING`]).
    pub crit_chance: i32,
    pub crit_multiplier: f32,
}

/// Character ability that overrides default targeting.
///
/// Tags are parsed case-insensitively; unknown tags are preserved in
/// [`SpecialAbility::Other`] and have no targeting effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialAbility {
    /// Ranged attacks may reach the whole opposing roster.
    Sharpshooter,
    /// Random damage/heal effects hit every eligible target instead of one.
    Barrage,
    #[strum(default)]
    Other(String),
}

impl SpecialAbility {
    /// Parses a special-ability tag. Blank tags mean "no ability".
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("none") {
            return None;
        }
        tag.parse().ok()
    }
}

/// Combat-ready state of one character.
///
/// The combatant exclusively owns its stat block after setup. Current values
/// (`health`, `defence`, `action_points`) are mutated by delivered effects.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CharacterId,
    pub name: String,
    pub faction: Faction,
    /// Controlling participant for player characters.
    pub owner: Option<PlayerId>,
    /// Archetype kind for AI-spawned combatants.
    pub archetype: Option<String>,
    pub upgrade_points: u32,
    pub stats: StatBlock,
    pub health: u32,
    pub defence: u32,
    pub action_points: u32,
    pub alive: bool,
    pub special: Option<SpecialAbility>,
    pub action_ids: Vec<u32>,
    /// Combatant currently absorbing damage aimed at this one.
    pub guardian: Option<CharacterId>,
    pub turn_ended: bool,
}

impl Combatant {
    /// Creates a living combatant with an empty stat block.
    ///
    /// Stats arrive later through `SetCharacterStats`.
    pub fn new(id: CharacterId, name: impl Into<String>, faction: Faction) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            owner: None,
            archetype: None,
            upgrade_points: 0,
            stats: StatBlock::default(),
            health: 0,
            defence: 0,
            action_points: 0,
            alive: true,
            special: None,
            action_ids: Vec::new(),
            guardian: None,
            turn_ended: false,
        }
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_archetype(mut self, kind: impl Into<String>, upgrade_points: u32) -> Self {
        self.archetype = Some(kind.into());
        self.upgrade_points = upgrade_points;
        self
    }

    /// Replaces the stat block and resets current values from it.
    pub fn apply_stats(&mut self, stats: StatBlock) {
        self.health = stats.max_health;
        self.defence = stats.defence;
        self.action_points = stats.action_points;
        self.stats = stats;
    }

    pub fn is_damaged(&self) -> bool {
        self.health < self.stats.max_health
    }

    pub fn side(&self) -> Side {
        self.faction.side()
    }

    pub fn has_ability(&self, ability: &SpecialAbility) -> bool {
        self.special.as_ref() == Some(ability)
    }
}
