//! Command application.
//!
//! [`CombatEngine`] is the authoritative reducer for [`CombatState`]. Every
//! relayed [`GameCommand`] is applied through [`CombatEngine::apply`] on every
//! participant, in the host's broadcast order, so equal inputs produce equal
//! states. Failures are returned to the caller and leave the state untouched.

mod hook;
mod turns;

pub use hook::{RefreshTurn, TurnHook};

use tracing::debug;

use crate::action::{AttackCommand, CharacterSetupPayload, GameCommand};
use crate::combat::{HitReport, apply_hit};
use crate::config::CombatConfig;
use crate::env::CombatEnv;
use crate::error::CombatError;
use crate::state::{
    CharacterId, CombatState, Combatant, Faction, Location, PlayerId, RoundOutcome,
    SpecialAbility,
};

/// What applying one command changed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Spawned {
        id: CharacterId,
        location: Location,
        faction: Faction,
    },
    StatsApplied {
        id: CharacterId,
    },
    HitDelivered {
        target: Location,
        report: HitReport,
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
    TurnAdvanced {
        turn: u32,
        /// Fatigue debuff due this turn; only the host resolves it.
        fatigue: Option<AttackCommand>,
    },
    SessionStarted,
    SceneChanged(u32),
    QuestSelected {
        quest: u32,
        boss_wave: bool,
    },
    HostLeft,
    EnemyPhase,
    CombatStarted,
    /// `None` when the round was not over or had already been latched.
    RoundChecked(Option<RoundOutcome>),
    TurnForceEnded {
        player: PlayerId,
        ids: Vec<CharacterId>,
    },
}

/// Reducer over one participant's [`CombatState`].
pub struct CombatEngine<'a> {
    state: &'a mut CombatState,
    config: &'a CombatConfig,
}

impl<'a> CombatEngine<'a> {
    pub fn new(state: &'a mut CombatState, config: &'a CombatConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    /// Applies one relayed command.
    ///
    /// # Errors
    ///
    /// Returns a [`CombatError`] when the command refers to missing slots or
    /// characters, or needs configuration the environment does not provide.
    /// The state is not modified in that case.
    pub fn apply(
        &mut self,
        env: &CombatEnv<'_>,
        hook: &dyn TurnHook,
        command: &GameCommand,
    ) -> Result<Outcome, CombatError> {
        debug!(command = command.name(), "applying command");
        match command {
            GameCommand::SpawnCharacter { location, player } => {
                self.spawn_player(location, player)
            }
            GameCommand::SpawnEnemyOrAlly {
                location,
                kind,
                is_ai_ally,
                upgrade_points,
            } => {
                let faction = if *is_ai_ally {
                    Faction::AiAlly
                } else {
                    Faction::Hostile
                };
                self.spawn(location, faction, |id| {
                    Combatant::new(id, kind.clone(), faction)
                        .with_archetype(kind.clone(), *upgrade_points)
                })
            }
            GameCommand::SetCharacterStats(payload) => self.set_stats(payload),
            GameCommand::DeliverAttack(hit) => {
                let report = apply_hit(&mut self.state.battlefield, hit)?;
                Ok(Outcome::HitDelivered {
                    target: hit.target.clone(),
                    report,
                })
            }
            GameCommand::NotifyActionUsed(cmd) => {
                let attacker = self
                    .state
                    .battlefield
                    .occupant_mut(&cmd.attacker)
                    .filter(|c| c.alive)
                    .ok_or_else(|| CombatError::AttackerMissing(cmd.attacker.clone()))?;
                attacker.action_points = attacker.action_points.saturating_sub(cmd.action_cost);
                Ok(Outcome::ActionUsed {
                    id: attacker.id,
                    remaining: attacker.action_points,
                })
            }
            GameCommand::MoveCharacter { from, to } => self.move_character(from, to),
            GameCommand::MarkTurnEnded(location) => {
                let c = self
                    .state
                    .battlefield
                    .occupant_mut(location)
                    .ok_or_else(|| CombatError::EmptySlot(location.clone()))?;
                c.turn_ended = true;
                Ok(Outcome::TurnEndMarked { id: c.id })
            }
            GameCommand::AdvanceTurn => {
                let fatigue = self.advance_turn(hook);
                Ok(Outcome::TurnAdvanced {
                    turn: self.state.turn.turn,
                    fatigue,
                })
            }
            GameCommand::StartSession => {
                let turn = &mut self.state.turn;
                turn.turn = 0;
                turn.enemy_turn = false;
                turn.in_combat = false;
                turn.game_ended = false;
                turn.outcome = None;
                turn.host_left = false;
                Ok(Outcome::SessionStarted)
            }
            GameCommand::ChangeScene(index) => {
                self.state.turn.scene = Some(*index);
                Ok(Outcome::SceneChanged(*index))
            }
            GameCommand::SelectQuest(quest) => {
                let boss_wave = env.boss_flag(Some(*quest), 1)?;
                let turn = &mut self.state.turn;
                turn.quest = Some(*quest);
                turn.wave = 1;
                turn.boss_wave = boss_wave;
                Ok(Outcome::QuestSelected {
                    quest: *quest,
                    boss_wave,
                })
            }
            GameCommand::NotifyHostLeft => {
                self.state.turn.host_left = true;
                Ok(Outcome::HostLeft)
            }
            GameCommand::AllReadyForTurnEnd => {
                self.state.turn.enemy_turn = true;
                Ok(Outcome::EnemyPhase)
            }
            GameCommand::AllReadyForCombatStart => {
                self.state.battlefield.clear_fallen();
                let turn = &mut self.state.turn;
                turn.turn = 0;
                turn.enemy_turn = false;
                turn.game_ended = false;
                turn.outcome = None;
                turn.in_combat = true;
                Ok(Outcome::CombatStarted)
            }
            GameCommand::ResolveRound => Ok(Outcome::RoundChecked(self.resolve_round(env))),
            GameCommand::ForceEndTurn(player) => {
                let ids = self.force_end_turn(player);
                Ok(Outcome::TurnForceEnded {
                    player: player.clone(),
                    ids,
                })
            }
        }
    }

    fn spawn_player(
        &mut self,
        location: &Location,
        player: &PlayerId,
    ) -> Result<Outcome, CombatError> {
        self.spawn(location, Faction::PlayerAlly, |id| {
            Combatant::new(id, player.as_str(), Faction::PlayerAlly).with_owner(player.clone())
        })
    }

    fn spawn(
        &mut self,
        location: &Location,
        faction: Faction,
        build: impl FnOnce(CharacterId) -> Combatant,
    ) -> Result<Outcome, CombatError> {
        let field = &mut self.state.battlefield;
        if field.slot(location).is_none() {
            return Err(CombatError::SlotNotFound(location.clone()));
        }
        if field.occupant(location).is_some_and(|c| c.alive) {
            return Err(CombatError::SlotOccupied(location.clone()));
        }

        let id = field.allocate_id();
        if !field.place(location, build(id)) {
            return Err(CombatError::SlotOccupied(location.clone()));
        }
        Ok(Outcome::Spawned {
            id,
            location: location.clone(),
            faction,
        })
    }

    fn set_stats(&mut self, payload: &CharacterSetupPayload) -> Result<Outcome, CombatError> {
        let c = self
            .state
            .battlefield
            .character_mut(payload.id)
            .ok_or(CombatError::CharacterNotFound(payload.id))?;
        c.name = payload.name.clone();
        c.apply_stats(payload.stats.clone());
        c.special = SpecialAbility::from_tag(&payload.special);
        c.action_ids = payload.action_ids.clone();
        Ok(Outcome::StatsApplied { id: payload.id })
    }

    fn move_character(&mut self, from: &Location, to: &Location) -> Result<Outcome, CombatError> {
        let field = &mut self.state.battlefield;
        let (Some(source), Some(dest)) = (field.slot(from), field.slot(to)) else {
            let missing = if field.slot(from).is_none() { from } else { to };
            return Err(CombatError::SlotNotFound(missing.clone()));
        };
        if source.side != dest.side {
            return Err(CombatError::CrossSideMove {
                from: from.clone(),
                to: to.clone(),
            });
        }
        if !field.relocate(from, to) {
            return Err(CombatError::EmptySlot(from.clone()));
        }
        Ok(Outcome::Moved {
            from: from.clone(),
            to: to.clone(),
        })
    }
}
