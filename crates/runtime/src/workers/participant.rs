//! Participant worker that owns one [`CombatState`].
//!
//! Receives relayed [`Envelope`]s in broadcast order, applies them through
//! [`CombatEngine`], and publishes the resulting events. Networked
//! participants report a state digest after every command.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use combat_core::{
    CombatConfig, CombatEngine, CombatError, CombatState, GameError, Outcome, PlayerId,
    RefreshTurn, TurnHook,
};

use crate::events::{CombatEvent, EventBus, SessionEvent, TurnEvent};
use crate::oracle::OracleManager;
use crate::relay::{DigestReport, Envelope};

/// Commands that can be sent to the participant worker
pub enum Command {
    /// Apply a relayed command.
    Apply(Envelope),
    /// Query the current combat state (read-only).
    QueryState { reply: oneshot::Sender<CombatState> },
    /// Digest of the current combat state.
    QueryDigest { reply: oneshot::Sender<[u8; 32]> },
    /// Replies once every command queued before it has been applied.
    Barrier { reply: oneshot::Sender<()> },
    Shutdown,
}

/// Background task that applies relayed commands.
pub struct ParticipantWorker {
    state: CombatState,
    config: CombatConfig,
    oracles: OracleManager,
    hook: Arc<dyn TurnHook>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    local_player: Option<PlayerId>,
    digest_tx: Option<mpsc::Sender<DigestReport>>,
    applied_tx: watch::Sender<u64>,
}

impl ParticipantWorker {
    pub fn new(
        state: CombatState,
        config: CombatConfig,
        oracles: OracleManager,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            state,
            config,
            oracles,
            hook: Arc::new(RefreshTurn),
            command_rx,
            event_bus,
            local_player: None,
            digest_tx: None,
            applied_tx: watch::channel(0).0,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn TurnHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Player whose character this participant controls.
    pub fn with_local_player(mut self, player: Option<PlayerId>) -> Self {
        self.local_player = player;
        self
    }

    /// Reports a digest after every applied command.
    pub fn with_digest_reports(mut self, digest_tx: mpsc::Sender<DigestReport>) -> Self {
        self.digest_tx = Some(digest_tx);
        self
    }

    /// Publishes the sequence number of the last applied command.
    pub fn with_applied_watch(mut self, applied_tx: watch::Sender<u64>) -> Self {
        self.applied_tx = applied_tx;
        self
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                Command::Apply(envelope) => self.apply(envelope),
                Command::QueryState { reply } => {
                    if reply.send(self.state.clone()).is_err() {
                        debug!("QueryState reply channel closed (caller dropped)");
                    }
                }
                Command::QueryDigest { reply } => {
                    if reply.send(self.state.digest()).is_err() {
                        debug!("QueryDigest reply channel closed (caller dropped)");
                    }
                }
                Command::Barrier { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown => break,
            }
        }
        debug!("participant worker stopped");
    }

    fn apply(&mut self, envelope: Envelope) {
        let Envelope { seq, command } = envelope;

        let env = self.oracles.as_combat_env();
        let result =
            CombatEngine::new(&mut self.state, &self.config).apply(&env, self.hook.as_ref(), &command);

        match result {
            Ok(outcome) => self.publish_outcome(seq, outcome),
            Err(e) => self.reject(seq, command.name(), &e),
        }

        self.applied_tx.send_replace(seq);
        self.report_digest(seq);
    }

    fn reject(&self, seq: u64, name: &'static str, error: &CombatError) {
        if error.severity().is_recoverable() {
            warn!(seq, command = name, code = error.error_code(), "command skipped: {}", error);
        } else {
            error!(seq, command = name, code = error.error_code(), "command failed: {}", error);
        }
        self.event_bus.publish(CombatEvent::CommandRejected {
            seq,
            command: name.to_string(),
            error: error.to_string(),
        });
    }

    fn publish_outcome(&mut self, seq: u64, outcome: Outcome) {
        match outcome {
            Outcome::Spawned {
                id,
                location,
                faction,
            } => self.event_bus.publish(CombatEvent::Spawned {
                id,
                location,
                faction,
            }),
            Outcome::StatsApplied { id } => self.event_bus.publish(CombatEvent::StatsApplied { id }),
            Outcome::HitDelivered { target, report } => {
                let fell = report.fell.then_some(report.receiver);
                self.event_bus.publish(CombatEvent::HitApplied {
                    seq,
                    target,
                    report,
                });
                if let Some(id) = fell {
                    info!(%id, "combatant fell");
                    self.event_bus.publish(CombatEvent::CombatantFell { id });
                }
            }
            Outcome::ActionUsed { id, remaining } => {
                self.event_bus
                    .publish(CombatEvent::ActionUsed { id, remaining })
            }
            Outcome::Moved { from, to } => self.event_bus.publish(CombatEvent::Moved { from, to }),
            Outcome::TurnEndMarked { id } => {
                self.event_bus.publish(CombatEvent::TurnEndMarked { id })
            }
            Outcome::TurnAdvanced { turn, fatigue } => {
                self.event_bus
                    .publish(TurnEvent::TurnAdvanced { turn, fatigue });
                self.check_local_player();
            }
            Outcome::SessionStarted => self.event_bus.publish(SessionEvent::SessionStarted),
            Outcome::SceneChanged(scene) => {
                self.event_bus.publish(SessionEvent::SceneChanged { scene })
            }
            Outcome::QuestSelected { quest, boss_wave } => self
                .event_bus
                .publish(SessionEvent::QuestSelected { quest, boss_wave }),
            Outcome::HostLeft => {
                warn!("host left the session");
                self.event_bus.publish(SessionEvent::HostLeft);
            }
            Outcome::EnemyPhase => self.event_bus.publish(TurnEvent::EnemyPhaseStarted),
            Outcome::CombatStarted => self.event_bus.publish(TurnEvent::CombatStarted),
            Outcome::RoundChecked(Some(outcome)) => {
                info!(?outcome, wave = self.state.turn.wave, "round resolved");
                self.event_bus.publish(TurnEvent::RoundResolved { outcome });
            }
            Outcome::RoundChecked(None) => debug!(seq, "round still open"),
            Outcome::TurnForceEnded { player, ids } => {
                for id in ids {
                    self.event_bus.publish(CombatEvent::TurnEndMarked { id });
                }
                self.event_bus.publish(TurnEvent::TurnForfeited { player });
            }
        }
    }

    /// Reports a local player left without a living character mid-encounter.
    fn check_local_player(&self) {
        let Some(player) = &self.local_player else {
            return;
        };
        let turn = &self.state.turn;
        if !turn.in_combat || turn.game_ended {
            return;
        }
        if self.state.battlefield.living_character_of(player).is_some() {
            return;
        }

        warn!(player = player.as_str(), "local player has no living character");
        self.event_bus.publish(TurnEvent::LocalPlayerMissing {
            player: player.clone(),
            turn: turn.turn,
        });
    }

    fn report_digest(&self, seq: u64) {
        let Some(tx) = &self.digest_tx else {
            return;
        };
        let report = DigestReport {
            seq,
            digest: self.state.digest(),
        };
        if let Err(e) = tx.try_send(report) {
            debug!(seq, "digest report dropped: {}", e);
        }
    }
}
