//! Structured attack payload passed through the relay.

use strum::Display;

use super::TargetingMode;
use crate::state::Location;

/// What a delivered hit does to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Damage,
    Heal,
    BuffDefence,
    DebuffDefence,
    /// The attacker becomes the target's guardian and absorbs its damage.
    Protect,
}

impl EffectKind {
    /// Effects aimed at the opposing side.
    pub const fn is_damage_like(self) -> bool {
        matches!(self, EffectKind::Damage | EffectKind::DebuffDefence)
    }

    /// Effects aimed at the issuer's own side.
    pub const fn is_supportive(self) -> bool {
        !self.is_damage_like()
    }
}

/// Who issued an attack command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Issuer {
    Player,
    /// Hostile AI.
    Ai,
    /// Friendly AI.
    AllyAi,
}

impl Issuer {
    pub const fn is_ai(self) -> bool {
        matches!(self, Issuer::Ai | Issuer::AllyAi)
    }
}

/// Per-attack payload.
///
/// `resolved_damage == 0` means "roll at delivery". Once rolled the value is
/// final for that hit; recipients of a `DeliverAttack` never re-roll.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackCommand {
    pub targeting: TargetingMode,
    pub attacker: Location,
    /// Rewritten per target while a sequence is resolved.
    pub target: Location,
    pub resolved_damage: u32,
    pub min_damage: u32,
    pub max_damage: u32,
    /// Crit triggers when the crit roll is `<=` this value; `-1` never crits.
    pub crit_chance: i32,
    /// `0.0` means unset and is treated as `1.0`.
    pub crit_multiplier: f32,
    /// Set by hit delivery when the crit roll succeeded.
    pub critical: bool,
    pub effect: EffectKind,
    pub issuer: Issuer,
    pub name: String,
    pub action_id: u32,
    pub action_cost: u32,
}

impl AttackCommand {
    /// Crit chance that no roll can satisfy.
    pub const NEVER_CRIT: i32 = -1;

    pub fn new(
        name: impl Into<String>,
        targeting: TargetingMode,
        effect: EffectKind,
        issuer: Issuer,
        attacker: Location,
    ) -> Self {
        Self {
            targeting,
            attacker,
            target: Location::none(),
            resolved_damage: 0,
            min_damage: 0,
            max_damage: 0,
            crit_chance: Self::NEVER_CRIT,
            crit_multiplier: 0.0,
            critical: false,
            effect,
            issuer,
            name: name.into(),
            action_id: 0,
            action_cost: 0,
        }
    }

    pub fn with_damage(mut self, min: u32, max: u32) -> Self {
        self.min_damage = min;
        self.max_damage = max;
        self
    }

    pub fn with_crit(mut self, chance: i32, multiplier: f32) -> Self {
        self.crit_chance = chance;
        self.crit_multiplier = multiplier;
        self
    }

    /// Pins the amount instead of rolling it at delivery.
    pub fn with_fixed_amount(mut self, amount: u32) -> Self {
        self.resolved_damage = amount;
        self
    }

    pub fn with_target(mut self, target: Location) -> Self {
        self.target = target;
        self
    }

    pub fn with_action(mut self, action_id: u32, cost: u32) -> Self {
        self.action_id = action_id;
        self.action_cost = cost;
        self
    }

    pub fn is_rolled(&self) -> bool {
        self.resolved_damage != 0
    }

    /// Prolonged-fight debuff issued by the turn controller.
    ///
    /// Hits everyone, has no attacker and a fixed magnitude.
    pub fn fatigue(magnitude: u32) -> Self {
        Self::new(
            "Fatigue",
            TargetingMode::Everyone,
            EffectKind::DebuffDefence,
            Issuer::Ai,
            Location::none(),
        )
        .with_fixed_amount(magnitude)
    }
}
