//! Turn counter and round-status state machine.

use tracing::debug;

use super::{CombatEngine, TurnHook};
use crate::action::AttackCommand;
use crate::env::CombatEnv;
use crate::state::{CharacterId, PlayerId, RoundOutcome};

impl<'a> CombatEngine<'a> {
    /// Increments the turn, runs the per-turn hooks and returns the fatigue
    /// debuff due this turn, if any.
    pub(super) fn advance_turn(&mut self, hook: &dyn TurnHook) -> Option<AttackCommand> {
        let turn = &mut self.state.turn;
        turn.enemy_turn = false;
        turn.turn += 1;

        let roster = &self.state.battlefield.roster;
        let npcs: Vec<CharacterId> = roster.ai_controlled().collect();
        let players = roster.player_allies.clone();
        for id in npcs {
            hook.on_npc_turn(&mut self.state.battlefield, id);
        }
        for id in players {
            hook.on_player_turn(&mut self.state.battlefield, id);
        }

        self.fatigue_due()
    }

    /// Fatigue debuff for the current turn: magnitude `turn - threshold`
    /// once the wave's threshold is exceeded.
    pub fn fatigue_due(&self) -> Option<AttackCommand> {
        let turn = &self.state.turn;
        let threshold = self.config.fatigue_threshold(turn.boss_wave);
        (turn.turn > threshold).then(|| AttackCommand::fatigue(turn.turn - threshold))
    }

    /// Latches the end of the encounter once one side has been wiped out.
    ///
    /// Returns the outcome only on the call that latches; every later call is
    /// a no-op until the encounter is reset.
    pub(super) fn resolve_round(&mut self, env: &CombatEnv<'_>) -> Option<RoundOutcome> {
        if !self.state.round_over() {
            return None;
        }

        let outcome = if self.state.battlefield.roster.has_friendlies() {
            let next_wave = self.state.turn.wave + 1;
            let next_is_boss = match env.boss_flag(self.state.turn.quest, next_wave) {
                Ok(flag) => Some(flag),
                Err(e) => {
                    debug!(wave = next_wave, error = %e, "next wave has no boss flag");
                    None
                }
            };
            let turn = &mut self.state.turn;
            turn.wave = next_wave;
            turn.boss_wave = next_is_boss.unwrap_or(false);
            RoundOutcome::WaveCleared {
                next_wave,
                next_is_boss,
            }
        } else {
            RoundOutcome::Defeat
        };

        let turn = &mut self.state.turn;
        turn.game_ended = true;
        turn.in_combat = false;
        turn.outcome = Some(outcome);
        Some(outcome)
    }

    /// Marks every character owned by `player` as done for this turn.
    pub(super) fn force_end_turn(&mut self, player: &PlayerId) -> Vec<CharacterId> {
        let field = &mut self.state.battlefield;
        let owned: Vec<CharacterId> = field
            .characters()
            .filter(|c| c.owner.as_ref() == Some(player))
            .map(|c| c.id)
            .collect();
        for id in &owned {
            if let Some(c) = field.character_mut(*id) {
                c.turn_ended = true;
            }
        }
        owned
    }
}
