//! Relay operations.
//!
//! Every state change that must be observed identically by all participants is
//! one [`GameCommand`]. The relay carries these values verbatim and never
//! interprets them; the engine is the only consumer.

use strum::IntoStaticStr;

use super::{AttackCommand, CharacterSetupPayload};
use crate::state::{Location, PlayerId};

#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameCommand {
    /// Spawns the player-controlled character owned by `player`.
    SpawnCharacter { location: Location, player: PlayerId },
    /// Spawns a hostile, or an AI-controlled ally when `is_ai_ally` is set.
    SpawnEnemyOrAlly {
        location: Location,
        kind: String,
        is_ai_ally: bool,
        upgrade_points: u32,
    },
    /// Applies one finalized, pre-rolled hit.
    DeliverAttack(AttackCommand),
    /// Spends the action's cost on the attacker.
    NotifyActionUsed(AttackCommand),
    SetCharacterStats(CharacterSetupPayload),
    MoveCharacter { from: Location, to: Location },
    MarkTurnEnded(Location),
    AdvanceTurn,
    StartSession,
    ChangeScene(u32),
    SelectQuest(u32),
    NotifyHostLeft,
    AllReadyForTurnEnd,
    AllReadyForCombatStart,
    /// Latches the encounter result once one side has been wiped out.
    /// Only the authoritative participant issues it.
    ResolveRound,
    /// Ends the turn of every character `PlayerId` owns, fallen or not.
    ForceEndTurn(PlayerId),
}

impl GameCommand {
    /// Variant name, for logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}
