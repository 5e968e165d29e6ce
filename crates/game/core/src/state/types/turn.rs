use strum::Display;

/// Phase of the round state machine, derived from [`TurnState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    PlayerTurn,
    EnemyTurn,
    RoundResolved,
    GameOver,
}

/// Terminal result of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundOutcome {
    /// Hostiles were cleared while friendlies remain.
    WaveCleared {
        /// 1-based index of the wave that comes next.
        next_wave: u32,
        /// Boss flag of the next wave, `None` if the quest has no such wave.
        next_is_boss: Option<bool>,
    },
    /// Every friendly combatant has fallen.
    Defeat,
}

/// Turn and wave counters shared by every participant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    /// Monotonic turn counter, reset at session start and per encounter.
    pub turn: u32,
    /// 1-based wave index.
    pub wave: u32,
    /// Boss flag of the active wave.
    pub boss_wave: bool,
    /// Quest chosen through `SelectQuest`.
    pub quest: Option<u32>,
    /// Scene chosen through `ChangeScene`.
    pub scene: Option<u32>,
    pub enemy_turn: bool,
    /// An encounter is running; round checks are ignored otherwise.
    pub in_combat: bool,
    /// Latched once per encounter by the round check.
    pub game_ended: bool,
    pub outcome: Option<RoundOutcome>,
    /// Set once the host has left the session.
    pub host_left: bool,
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            turn: 0,
            wave: 1,
            boss_wave: false,
            quest: None,
            scene: None,
            enemy_turn: false,
            in_combat: false,
            game_ended: false,
            outcome: None,
            host_left: false,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        match (self.game_ended, self.outcome) {
            (true, Some(RoundOutcome::Defeat)) => TurnPhase::GameOver,
            (true, _) => TurnPhase::RoundResolved,
            (false, _) if self.enemy_turn => TurnPhase::EnemyTurn,
            _ => TurnPhase::PlayerTurn,
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}
