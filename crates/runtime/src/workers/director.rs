//! Host-only effects.
//!
//! The [`HostDirector`] listens to the host's own events and performs the
//! work that must happen exactly once per session: resolving the fatigue
//! debuff, aggregating turn-end readiness, playing AI turns and deciding
//! when a round is over. Everything it does goes through the relay like any
//! other command, so every participant latches the round at the same
//! sequence number.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use combat_core::{CombatState, GameCommand};

use crate::api::{ActionProvider, ParticipantHandle, Result};
use crate::clock::{Clock, TokioClock};
use crate::events::{CombatEvent, Event, Topic, TurnEvent};
use crate::relay::CommandDispatcher;
use crate::resolver::AttackResolver;

pub struct HostDirector {
    handle: ParticipantHandle,
    dispatcher: Arc<dyn CommandDispatcher>,
    resolver: AttackResolver,
    provider: Arc<dyn ActionProvider>,
    turn_rx: broadcast::Receiver<Event>,
    combat_rx: broadcast::Receiver<Event>,
    clock: Arc<dyn Clock>,
    round_debounce: Duration,
    /// Only the newest scheduled round check runs.
    round_generation: u64,
    round_tx: mpsc::Sender<u64>,
    round_rx: mpsc::Receiver<u64>,
    /// Turn for which `AllReadyForTurnEnd` has been dispatched.
    ready_sent: Option<u32>,
    /// `(wave, turn)` whose enemy phase has been played.
    enemy_phase: Option<(u32, u32)>,
}

impl HostDirector {
    pub fn new(
        handle: ParticipantHandle,
        dispatcher: Arc<dyn CommandDispatcher>,
        resolver: AttackResolver,
        provider: Arc<dyn ActionProvider>,
    ) -> Self {
        let turn_rx = handle.subscribe(Topic::Turn);
        let combat_rx = handle.subscribe(Topic::Combat);
        let (round_tx, round_rx) = mpsc::channel(16);
        Self {
            handle,
            dispatcher,
            resolver,
            provider,
            turn_rx,
            combat_rx,
            clock: Arc::new(TokioClock),
            round_debounce: Duration::from_millis(250),
            round_generation: 0,
            round_tx,
            round_rx,
            ready_sent: None,
            enemy_phase: None,
        }
    }

    /// Quiet period after a board change before the round is checked.
    pub fn with_round_check(mut self, clock: Arc<dyn Clock>, debounce: Duration) -> Self {
        self.clock = clock;
        self.round_debounce = debounce;
        self
    }

    pub async fn run(mut self) {
        loop {
            let result = tokio::select! {
                event = self.turn_rx.recv() => self.on_recv(event).await,
                event = self.combat_rx.recv() => self.on_recv(event).await,
                Some(generation) = self.round_rx.recv() => {
                    if generation == self.round_generation {
                        self.resolve_round().await.map(|()| true)
                    } else {
                        Ok(true)
                    }
                }
            };
            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("host director stopped: {}", e);
                    break;
                }
            }
        }
        debug!("host director stopped");
    }

    /// `Ok(false)` once the event bus is gone.
    async fn on_recv(&mut self, event: std::result::Result<Event, RecvError>) -> Result<bool> {
        match event {
            Ok(event) => self.handle_event(event).await.map(|()| true),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "host director lagged behind events; resyncing");
                self.resync().await.map(|()| true)
            }
            Err(RecvError::Closed) => Ok(false),
        }
    }

    async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Turn(TurnEvent::CombatStarted) => {
                self.ready_sent = None;
                self.enemy_phase = None;
                self.schedule_round_check();
                self.check_readiness().await
            }
            Event::Turn(TurnEvent::TurnAdvanced { turn, fatigue }) => {
                if let Some(fatigue) = fatigue {
                    info!(turn, magnitude = fatigue.resolved_damage, "resolving fatigue");
                    self.resolver.resolve(fatigue).await?;
                    self.dispatcher.flush().await?;
                }
                self.schedule_round_check();
                self.check_readiness().await
            }
            Event::Turn(TurnEvent::TurnForfeited { player }) => {
                info!(player = player.as_str(), "turn forfeited");
                self.resolve_round().await?;
                self.check_readiness().await
            }
            Event::Turn(TurnEvent::EnemyPhaseStarted) => self.run_enemy_phase().await,
            Event::Combat(CombatEvent::TurnEndMarked { .. }) => self.check_readiness().await,
            Event::Combat(CombatEvent::CombatantFell { .. }) => {
                self.schedule_round_check();
                self.check_readiness().await
            }
            Event::Combat(CombatEvent::Spawned { .. } | CombatEvent::Moved { .. }) => {
                self.schedule_round_check();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Catches up after missed events by acting on the current state.
    async fn resync(&mut self) -> Result<()> {
        self.schedule_round_check();
        let state = self.handle.query_state().await?;
        if state.turn.enemy_turn {
            self.run_enemy_phase().await
        } else {
            self.check_readiness().await
        }
    }

    /// Restarts the debounce window; the check runs once the board is quiet.
    fn schedule_round_check(&mut self) {
        self.round_generation += 1;
        let generation = self.round_generation;
        let tx = self.round_tx.clone();
        let clock = Arc::clone(&self.clock);
        let delay = self.round_debounce;
        tokio::spawn(async move {
            clock.sleep(delay).await;
            let _ = tx.send(generation).await;
        });
    }

    /// Relays `ResolveRound` once one side has nobody left standing.
    async fn resolve_round(&mut self) -> Result<()> {
        let state = self.handle.query_state().await?;
        if !state.round_over() {
            return Ok(());
        }
        debug!(wave = state.turn.wave, turn = state.turn.turn, "side wiped out");
        self.dispatcher.dispatch(GameCommand::ResolveRound).await
    }

    /// Dispatches `AllReadyForTurnEnd` once every living player character
    /// has ended its turn.
    async fn check_readiness(&mut self) -> Result<()> {
        let state = self.handle.query_state().await?;
        let turn = &state.turn;
        if !turn.in_combat || turn.game_ended || turn.enemy_turn {
            return Ok(());
        }
        if self.ready_sent == Some(turn.turn) {
            return Ok(());
        }
        if !all_players_ready(&state) {
            return Ok(());
        }

        debug!(turn = turn.turn, "all players ready");
        self.ready_sent = Some(turn.turn);
        self.dispatcher
            .dispatch(GameCommand::AllReadyForTurnEnd)
            .await
    }

    /// Plays every AI-controlled combatant in roster order, then advances
    /// the turn unless the encounter is over. Runs at most once per turn.
    async fn run_enemy_phase(&mut self) -> Result<()> {
        let state = self.handle.query_state().await?;
        let key = (state.turn.wave, state.turn.turn);
        if !state.turn.enemy_turn || self.enemy_phase == Some(key) {
            return Ok(());
        }
        self.enemy_phase = Some(key);

        let actors: Vec<_> = state.battlefield.roster.ai_controlled().collect();
        for actor in actors {
            let state = self.handle.query_state().await?;
            if !encounter_running(&state) {
                return Ok(());
            }
            match self.provider.provide_attack(actor, &state).await {
                Ok(Some(command)) => {
                    self.resolver.resolve(command).await?;
                    self.dispatcher.flush().await?;
                }
                Ok(None) => debug!(%actor, "AI combatant passes"),
                Err(e) => warn!(%actor, "AI provider failed: {}", e),
            }
        }

        let state = self.handle.query_state().await?;
        if encounter_running(&state) {
            self.dispatcher.dispatch(GameCommand::AdvanceTurn).await?;
        }
        Ok(())
    }
}

fn all_players_ready(state: &CombatState) -> bool {
    let field = &state.battlefield;
    field
        .roster
        .player_allies
        .iter()
        .filter_map(|id| field.character(*id))
        .filter(|c| c.alive)
        .all(|c| c.turn_ended)
}

/// Both sides still stand and the round has not latched.
fn encounter_running(state: &CombatState) -> bool {
    let roster = &state.battlefield.roster;
    state.turn.in_combat
        && !state.turn.game_ended
        && roster.has_hostiles()
        && roster.has_friendlies()
}
