//! Targeting system for attack commands.
//!
//! Turns a [`TargetingMode`] plus board occupancy into either a candidate set
//! for a human choice or an ordered list of targets. The computation reads
//! only slot occupancy and living status; the only randomness comes from the
//! caller's [`DiceRoller`], so the same board and seed always produce the same
//! plan.

use strum::Display;

use super::{AttackCommand, EffectKind, Issuer};
use crate::env::DiceRoller;
use crate::error::CombatError;
use crate::state::{Battlefield, Location, Rank, Side, SpecialAbility};

// ============================================================================
// Targeting Mode
// ============================================================================

/// How an attack command selects its target(s).
///
/// "Opponents" and "own side" are relative to the attacker: a hostile attacker
/// targets the friendly side and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetingMode {
    // --- single target, chosen by a human when player-issued ---
    /// Any living opponent.
    AnyHostile,
    /// Any living opponent in the front rank.
    HostileFront,
    /// Any living opponent in a rank reachable at range (front and mid).
    Ranged,
    /// Any living combatant on the attacker's side.
    AnyAlly,
    /// Any living combatant in the front rank of the attacker's own side.
    ReverseFront,
    /// Any slot on the attacker's side other than its own; resolves to a move.
    Relocation,
    /// Any living opponent except the command's current target.
    RandomExcept,

    // --- automatic ---
    AllHostile,
    AllAlly,
    /// Every living opponent in the front and mid ranks.
    FrontAndMid,
    FrontRank,
    MidRank,
    BackRank,
    SelfOnly,
    /// Every living combatant on both sides.
    Everyone,
    /// The command's current target, as given.
    PreChosen,
    /// One target picked at random from an effect-dependent pool.
    Random,
}

impl TargetingMode {
    /// Modes where a player-issued command waits for a human choice.
    pub const fn requires_selection(self) -> bool {
        matches!(
            self,
            TargetingMode::AnyHostile
                | TargetingMode::HostileFront
                | TargetingMode::Ranged
                | TargetingMode::AnyAlly
                | TargetingMode::ReverseFront
                | TargetingMode::Relocation
                | TargetingMode::RandomExcept
        )
    }

    /// Multi-target modes; these are applied as sweeps.
    pub const fn is_sweep(self) -> bool {
        matches!(
            self,
            TargetingMode::AllHostile
                | TargetingMode::AllAlly
                | TargetingMode::FrontAndMid
                | TargetingMode::FrontRank
                | TargetingMode::MidRank
                | TargetingMode::BackRank
                | TargetingMode::Everyone
        )
    }
}

// ============================================================================
// Target Plan
// ============================================================================

/// Result of target computation for one attack command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetPlan {
    /// Player-issued single-target mode: wait for a choice among candidates.
    AwaitSelection { candidates: Vec<Location> },
    /// Targets in computed order.
    Strike { targets: Vec<Location>, sweep: bool },
    /// Nothing eligible; the command produces no effect.
    NoTargets,
}

impl TargetPlan {
    fn strike(targets: Vec<Location>, sweep: bool) -> Self {
        if targets.is_empty() {
            TargetPlan::NoTargets
        } else {
            TargetPlan::Strike { targets, sweep }
        }
    }

    /// Order in which hits are delivered.
    ///
    /// Sweeps run in reverse: the last computed target is hit first.
    pub fn application_order(&self) -> Vec<Location> {
        match self {
            TargetPlan::Strike { targets, sweep } if *sweep => {
                targets.iter().rev().cloned().collect()
            }
            TargetPlan::Strike { targets, .. } => targets.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_sweep(&self) -> bool {
        matches!(self, TargetPlan::Strike { sweep: true, .. })
    }
}

/// Sides as seen from the attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Perspective {
    own: Side,
    opponents: Side,
}

impl Perspective {
    fn from_side(own: Side) -> Self {
        Self {
            own,
            opponents: own.opposite(),
        }
    }
}

const FRONT: &[Rank] = &[Rank::Front];
const MID: &[Rank] = &[Rank::Mid];
const BACK: &[Rank] = &[Rank::Back];
const FRONT_AND_MID: &[Rank] = &[Rank::Front, Rank::Mid];

// ============================================================================
// Plan computation
// ============================================================================

/// Computes the target plan for `cmd` against the current board.
///
/// # Errors
///
/// Returns [`CombatError::AttackerMissing`] when the mode needs an attacker's
/// point of view and the attacker slot is unknown, empty or fallen.
pub fn plan_targets(
    field: &Battlefield,
    cmd: &AttackCommand,
    roller: &mut DiceRoller,
) -> Result<TargetPlan, CombatError> {
    // Modes that do not depend on who is attacking.
    match cmd.targeting {
        TargetingMode::Everyone => {
            let mut targets = owned(field.living_on(Side::Hostile, None));
            targets.extend(owned(field.living_on(Side::Friendly, None)));
            return Ok(TargetPlan::strike(targets, true));
        }
        TargetingMode::PreChosen => {
            let alive = field.occupant(&cmd.target).is_some_and(|c| c.alive);
            let targets = if alive { vec![cmd.target.clone()] } else { Vec::new() };
            return Ok(TargetPlan::strike(targets, false));
        }
        _ => {}
    }

    let view = perspective(field, cmd)?;
    let special = field
        .occupant(&cmd.attacker)
        .and_then(|c| c.special.clone());

    if cmd.targeting.requires_selection() {
        let candidates = selection_candidates_for(field, cmd, view, special.as_ref());
        if candidates.is_empty() {
            return Ok(TargetPlan::NoTargets);
        }
        if cmd.issuer.is_ai() {
            return Ok(pick_one(candidates, roller));
        }
        return Ok(TargetPlan::AwaitSelection { candidates });
    }

    let plan = match cmd.targeting {
        TargetingMode::AllHostile => {
            TargetPlan::strike(owned(field.living_on(view.opponents, None)), true)
        }
        TargetingMode::AllAlly => TargetPlan::strike(owned(field.living_on(view.own, None)), true),
        TargetingMode::FrontAndMid => TargetPlan::strike(
            owned(field.living_on(view.opponents, Some(FRONT_AND_MID))),
            true,
        ),
        TargetingMode::FrontRank => {
            TargetPlan::strike(owned(field.living_on(view.opponents, Some(FRONT))), true)
        }
        TargetingMode::MidRank => {
            TargetPlan::strike(owned(field.living_on(view.opponents, Some(MID))), true)
        }
        TargetingMode::BackRank => {
            TargetPlan::strike(owned(field.living_on(view.opponents, Some(BACK))), true)
        }
        TargetingMode::SelfOnly => TargetPlan::strike(vec![cmd.attacker.clone()], false),
        TargetingMode::Random => random_plan(field, cmd, view, special.as_ref(), roller),
        // Handled above.
        _ => TargetPlan::NoTargets,
    };
    Ok(plan)
}

fn owned(locations: Vec<&Location>) -> Vec<Location> {
    locations.into_iter().cloned().collect()
}

fn pick_one(candidates: Vec<Location>, roller: &mut DiceRoller) -> TargetPlan {
    match roller.pick_index(candidates.len()) {
        Some(i) => TargetPlan::strike(vec![candidates[i].clone()], false),
        None => TargetPlan::NoTargets,
    }
}

/// Resolves the attacker's side, falling back to the issuer when the command
/// has no attacker.
fn perspective(field: &Battlefield, cmd: &AttackCommand) -> Result<Perspective, CombatError> {
    if cmd.attacker.is_none() {
        let own = match cmd.issuer {
            Issuer::Ai => Side::Hostile,
            Issuer::Player | Issuer::AllyAi => Side::Friendly,
        };
        return Ok(Perspective::from_side(own));
    }
    match field.occupant(&cmd.attacker) {
        Some(attacker) if attacker.alive => Ok(Perspective::from_side(attacker.side())),
        _ => Err(CombatError::AttackerMissing(cmd.attacker.clone())),
    }
}

/// Candidate set for the single-target modes, in board order.
fn selection_candidates_for(
    field: &Battlefield,
    cmd: &AttackCommand,
    view: Perspective,
    special: Option<&SpecialAbility>,
) -> Vec<Location> {
    match cmd.targeting {
        TargetingMode::AnyHostile => owned(field.living_on(view.opponents, None)),
        TargetingMode::HostileFront => owned(field.living_on(view.opponents, Some(FRONT))),
        TargetingMode::Ranged => {
            let ranks = match special {
                Some(SpecialAbility::Sharpshooter) => None,
                _ => Some(FRONT_AND_MID),
            };
            owned(field.living_on(view.opponents, ranks))
        }
        TargetingMode::AnyAlly => owned(field.living_on(view.own, None)),
        TargetingMode::ReverseFront => owned(field.living_on(view.own, Some(FRONT))),
        TargetingMode::Relocation => field
            .slots()
            .iter()
            .filter(|s| s.side == view.own && s.location != cmd.attacker)
            .map(|s| s.location.clone())
            .collect(),
        TargetingMode::RandomExcept => field
            .living_on(view.opponents, None)
            .into_iter()
            .filter(|l| **l != cmd.target)
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// `Random` mode: an effect-dependent pool, one pick.
///
/// AI issuers only consider the front rank of the relevant side, falling back
/// to the whole side when that rank has nobody eligible.
fn random_plan(
    field: &Battlefield,
    cmd: &AttackCommand,
    view: Perspective,
    special: Option<&SpecialAbility>,
    roller: &mut DiceRoller,
) -> TargetPlan {
    if special == Some(&SpecialAbility::Barrage) {
        match cmd.effect {
            EffectKind::Damage => {
                return TargetPlan::strike(owned(field.living_on(view.opponents, None)), true);
            }
            EffectKind::Heal => {
                return TargetPlan::strike(owned(field.living_on(view.own, None)), true);
            }
            _ => {}
        }
    }

    let pool = |ranks: Option<&[Rank]>| random_pool(field, cmd, view, ranks);
    let candidates = if cmd.issuer.is_ai() {
        let front = pool(Some(FRONT));
        if front.is_empty() { pool(None) } else { front }
    } else {
        pool(None)
    };
    pick_one(candidates, roller)
}

fn random_pool(
    field: &Battlefield,
    cmd: &AttackCommand,
    view: Perspective,
    ranks: Option<&[Rank]>,
) -> Vec<Location> {
    let side = if cmd.effect.is_damage_like() {
        view.opponents
    } else {
        view.own
    };
    field
        .living_on(side, ranks)
        .into_iter()
        .filter(|location| match cmd.effect {
            EffectKind::Heal => field.occupant(location).is_some_and(|c| c.is_damaged()),
            EffectKind::Protect => **location != cmd.attacker,
            _ => true,
        })
        .cloned()
        .collect()
}
