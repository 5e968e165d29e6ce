//! Typed events published by participant workers, resolvers and the relay hub.

use serde::{Deserialize, Serialize};

use combat_core::{
    AttackCommand, CharacterId, Faction, HitReport, Location, PlayerId, RoundOutcome,
};

use crate::admission::ConnectionId;

/// Turn counter, phase and round transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    /// Combat opened; fallen combatants were cleared and the counter reset.
    CombatStarted,

    /// A new player turn began.
    TurnAdvanced {
        turn: u32,
        /// Fatigue debuff the host resolves for this turn.
        fatigue: Option<AttackCommand>,
    },

    /// Every player marked their turn ended; AI combatants act next.
    EnemyPhaseStarted,

    /// A relayed round check latched the end of the encounter.
    RoundResolved { outcome: RoundOutcome },

    /// The local player has no living character at the start of `turn`.
    LocalPlayerMissing { player: PlayerId, turn: u32 },

    /// Every character of `player` was marked done through the relay.
    TurnForfeited { player: PlayerId },
}

/// Board mutations and resolution-sequence progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CombatEvent {
    Spawned {
        id: CharacterId,
        location: Location,
        faction: Faction,
    },
    StatsApplied {
        id: CharacterId,
    },
    HitApplied {
        seq: u64,
        target: Location,
        report: HitReport,
    },
    CombatantFell {
        id: CharacterId,
    },
    ActionUsed {
        id: CharacterId,
        remaining: u32,
    },
    Moved {
        from: Location,
        to: Location,
    },
    TurnEndMarked {
        id: CharacterId,
    },

    /// A relayed command failed to apply and was skipped.
    CommandRejected {
        seq: u64,
        command: String,
        error: String,
    },

    /// Target highlights of the previous sequence should be removed.
    HighlightsCleared,
    /// A player-issued command waits for one of these targets.
    CandidatesOffered {
        attacker: Location,
        candidates: Vec<Location>,
    },
    SequenceStarted {
        name: String,
        attacker: Location,
    },
    SequenceCompleted {
        name: String,
        hits: usize,
    },
    SequenceCancelled {
        name: String,
    },
}

/// Membership, session selection and divergence reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    SessionStarted,
    SceneChanged { scene: u32 },
    QuestSelected { quest: u32, boss_wave: bool },
    HostLeft,

    /// This participant was admitted by the host.
    Admitted { connection: ConnectionId },
    PlayerJoined {
        connection: ConnectionId,
        player: PlayerId,
        display_name: String,
    },
    PlayerLeft {
        connection: ConnectionId,
        player: PlayerId,
    },
    AdmissionDenied { reason: String },
    /// The link to the host closed.
    ConnectionLost,

    /// State digests reported for `seq` disagree.
    DesyncDetected { seq: u64 },
}
