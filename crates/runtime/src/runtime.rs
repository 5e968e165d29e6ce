//! Participant orchestration.
//!
//! [`Participant`] wires a worker, a relay backend, the attack resolver and,
//! on the authoritative side, the [`HostDirector`]. [`ParticipantBuilder`]
//! chooses the relay backend once: solo participants apply commands locally,
//! hosts run a relay hub, peers join a host over a [`Link`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use combat_core::{
    AttackCommand, CharacterId, CombatState, Combatant, DiceRoller, GameCommand, Location,
    OracleError, PcgRng, PlayerId, RngOracle, TurnHook,
};

use crate::admission::{AdmissionGate, ConnectionId, ConnectionRequest};
use crate::api::{
    ActionProvider, BasicAttackProvider, FirstCandidateSelector, ParticipantHandle, Result,
    RuntimeError, TargetSelector,
};
use crate::clock::{Clock, TokioClock};
use crate::config::RuntimeConfig;
use crate::events::{EventBus, SessionEvent};
use crate::oracle::OracleManager;
use crate::relay::hub::{HubInput, RelayHub};
use crate::relay::peer::{self, PeerLink};
use crate::relay::{CommandDispatcher, LocalDispatcher, NetworkDispatcher};
use crate::resolver::{AttackResolver, SequenceOutcome};
use crate::transport::{Link, tcp};
use crate::workers::{Command, HostDirector, ParticipantWorker, TurnForfeiter};

/// How this participant takes part in the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// No session; commands apply locally.
    Solo,
    /// Session host; originates every broadcast.
    Host,
    /// Remote participant admitted by a host.
    Peer { connection: ConnectionId },
}

impl Role {
    /// Solo participants and hosts perform host-only effects.
    pub fn has_authority(&self) -> bool {
        matches!(self, Role::Solo | Role::Host)
    }
}

enum SessionMode {
    Solo,
    Host {
        identity: PlayerId,
    },
    Peer {
        link: Link,
        request: ConnectionRequest,
    },
}

/// One participant of a combat encounter
///
/// Design: Participant owns workers and coordinates shutdown.
/// [`ParticipantHandle`] provides a cloneable façade for presentation.
pub struct Participant {
    handle: ParticipantHandle,
    dispatcher: Arc<dyn CommandDispatcher>,
    resolver: AttackResolver,
    oracles: OracleManager,
    role: Role,
    hub_tx: Option<mpsc::Sender<HubInput>>,
    link_buffer_size: usize,

    // Background workers
    worker_handle: JoinHandle<()>,
    hub_handle: Option<JoinHandle<()>>,
    background: Vec<JoinHandle<()>>,
}

impl Participant {
    /// Create a new participant builder
    pub fn builder() -> ParticipantBuilder {
        ParticipantBuilder::new()
    }

    /// Get a cloneable handle to this participant
    pub fn handle(&self) -> ParticipantHandle {
        self.handle.clone()
    }

    pub fn resolver(&self) -> AttackResolver {
        self.resolver.clone()
    }

    pub fn dispatcher(&self) -> Arc<dyn CommandDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Relay one command to every participant.
    pub async fn dispatch(&self, command: GameCommand) -> Result<()> {
        self.dispatcher.dispatch(command).await
    }

    /// Resolve an attack, pre-empting the running sequence.
    pub async fn resolve(&self, command: AttackCommand) -> Result<SequenceOutcome> {
        self.resolver.resolve(command).await
    }

    /// Wait until everything dispatched so far was applied locally.
    pub async fn flush(&self) -> Result<()> {
        self.dispatcher.flush().await
    }

    /// Hand an incoming connection to the relay hub for admission.
    pub async fn accept(&self, link: Link) -> Result<()> {
        let hub = self.hub_tx.as_ref().ok_or(RuntimeError::NotHost)?;
        hub.send(HubInput::Connect(link))
            .await
            .map_err(|_| RuntimeError::RelayClosed)
    }

    /// Accept TCP connections on `addr`; returns the bound address.
    pub async fn listen(&mut self, addr: impl ToSocketAddrs) -> Result<SocketAddr> {
        let hub = self.hub_tx.clone().ok_or(RuntimeError::NotHost)?;
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        let buffer = self.link_buffer_size;

        let (links_tx, mut links_rx) = mpsc::channel::<Link>(buffer);
        self.background
            .push(tokio::spawn(tcp::accept_loop(listener, links_tx, buffer)));
        self.background.push(tokio::spawn(async move {
            while let Some(link) = links_rx.recv().await {
                if hub.send(HubInput::Connect(link)).await.is_err() {
                    break;
                }
            }
        }));

        Ok(local)
    }

    /// Spawn a hostile or AI ally and apply its generated stats.
    ///
    /// # Errors
    ///
    /// Requires host authority and a configured archetype for `kind`.
    pub async fn spawn_enemy_or_ally(
        &self,
        location: Location,
        kind: &str,
        is_ai_ally: bool,
        upgrade_points: u32,
    ) -> Result<CharacterId> {
        self.require_authority()?;
        self.oracles
            .archetype(kind)
            .ok_or_else(|| RuntimeError::UnknownArchetype(kind.to_string()))?;

        self.dispatch(GameCommand::SpawnEnemyOrAlly {
            location: location.clone(),
            kind: kind.to_string(),
            is_ai_ally,
            upgrade_points,
        })
        .await?;

        self.apply_generated_stats(location, kind, upgrade_points, |c| {
            c.archetype.as_deref() == Some(kind)
        })
        .await
    }

    /// Spawn `player`'s character with stats generated from `kind`.
    pub async fn spawn_player(
        &self,
        location: Location,
        player: PlayerId,
        kind: &str,
    ) -> Result<CharacterId> {
        self.require_authority()?;
        self.oracles
            .archetype(kind)
            .ok_or_else(|| RuntimeError::UnknownArchetype(kind.to_string()))?;

        self.dispatch(GameCommand::SpawnCharacter {
            location: location.clone(),
            player: player.clone(),
        })
        .await?;

        self.apply_generated_stats(location, kind, 0, |c| c.owner.as_ref() == Some(&player))
            .await
    }

    /// Spawn every combatant of `wave` (1-based) in `quest`.
    ///
    /// Spawns that fail are logged and skipped.
    pub async fn spawn_wave(&self, quest: u32, wave: u32) -> Result<Vec<CharacterId>> {
        self.require_authority()?;
        let specs = self
            .oracles
            .wave_spawns(quest, wave)
            .ok_or(RuntimeError::Combat(OracleError::WaveNotFound { quest, wave }.into()))?
            .to_vec();

        let mut spawned = Vec::with_capacity(specs.len());
        for spec in specs {
            let location = Location::new(spec.location.as_str());
            match self
                .spawn_enemy_or_ally(location, &spec.kind, spec.ai_ally, spec.upgrade_points)
                .await
            {
                Ok(id) => spawned.push(id),
                Err(e) => warn!(
                    slot = spec.location.as_str(),
                    kind = spec.kind.as_str(),
                    "spawn skipped: {}",
                    e
                ),
            }
        }
        info!(quest, wave, count = spawned.len(), "wave spawned");
        Ok(spawned)
    }

    async fn apply_generated_stats(
        &self,
        location: Location,
        kind: &str,
        upgrade_points: u32,
        spawned: impl Fn(&Combatant) -> bool,
    ) -> Result<CharacterId> {
        self.flush().await?;
        let state = self.handle.query_state().await?;
        let id = state
            .battlefield
            .occupant(&location)
            .filter(|c| c.alive && spawned(c))
            .map(|c| c.id)
            .ok_or_else(|| RuntimeError::SpawnNotObserved(location.to_string()))?;

        let definition = self
            .oracles
            .archetype(kind)
            .ok_or_else(|| RuntimeError::UnknownArchetype(kind.to_string()))?;
        let payload =
            self.oracles
                .stat_generator()
                .setup_payload(id, location, definition, upgrade_points);
        self.dispatch(GameCommand::SetCharacterStats(payload)).await?;
        Ok(id)
    }

    fn require_authority(&self) -> Result<()> {
        if self.role.has_authority() {
            Ok(())
        } else {
            Err(RuntimeError::NotHost)
        }
    }

    /// Gracefully stop all background workers.
    ///
    /// A host tells its peers it is leaving before the relay shuts down.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(hub) = &self.hub_tx {
            if self.dispatch(GameCommand::NotifyHostLeft).await.is_ok() {
                let _ = self.flush().await;
            }
            let _ = hub.send(HubInput::Shutdown).await;
        }
        if let Some(hub_handle) = self.hub_handle {
            hub_handle.await.map_err(RuntimeError::WorkerJoin)?;
        }

        for task in &self.background {
            task.abort();
        }

        let _ = self.handle.command_sender().send(Command::Shutdown).await;
        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        info!(role = ?self.role, "participant stopped");
        Ok(())
    }
}

/// Builder for [`Participant`] with flexible configuration.
pub struct ParticipantBuilder {
    config: RuntimeConfig,
    state: Option<CombatState>,
    oracles: Option<OracleManager>,
    hook: Option<Arc<dyn TurnHook>>,
    clock: Option<Arc<dyn Clock>>,
    selector: Option<Arc<dyn TargetSelector>>,
    npc_provider: Option<Arc<dyn ActionProvider>>,
    rng: Option<Arc<dyn RngOracle>>,
    local_player: Option<PlayerId>,
    mode: SessionMode,
}

impl ParticipantBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
            oracles: None,
            hook: None,
            clock: None,
            selector: None,
            npc_provider: None,
            rng: None,
            local_player: None,
            mode: SessionMode::Solo,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide initial combat state
    pub fn initial_state(mut self, state: CombatState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Replace the per-turn hook (default: `RefreshTurn`)
    pub fn turn_hook(mut self, hook: impl TurnHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the selector consulted for player-issued single-target commands
    pub fn target_selector(mut self, selector: impl TargetSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Set NPC action provider (host only; default: `BasicAttackProvider`)
    pub fn npc_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.npc_provider = Some(Arc::new(provider));
        self
    }

    /// Replace the random source behind this participant's dice
    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Player whose character this participant controls
    pub fn local_player(mut self, player: PlayerId) -> Self {
        self.local_player = Some(player);
        self
    }

    /// Run without a session (default)
    pub fn solo(mut self) -> Self {
        self.mode = SessionMode::Solo;
        self
    }

    /// Host a session as `identity`
    pub fn host(mut self, identity: PlayerId) -> Self {
        self.mode = SessionMode::Host { identity };
        self
    }

    /// Join the host at the other end of `link`
    pub fn peer(mut self, link: Link, request: ConnectionRequest) -> Self {
        self.mode = SessionMode::Peer { link, request };
        self
    }

    /// Build the participant
    ///
    /// # Errors
    ///
    /// Fails without an oracle manager, or when a peer is not admitted.
    pub async fn build(self) -> Result<Participant> {
        let oracles = self
            .oracles
            .ok_or(RuntimeError::MissingService("oracle manager"))?;
        let config = self.config;

        let state = self
            .state
            .unwrap_or_else(|| CombatState::new(config.combat.layout));
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let (applied_tx, applied_rx) = watch::channel(0);
        let handle = ParticipantHandle::new(command_tx.clone(), event_bus.clone(), applied_rx);
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));

        let mut worker = ParticipantWorker::new(
            state,
            config.combat.clone(),
            oracles.clone(),
            command_rx,
            event_bus.clone(),
        )
        .with_local_player(self.local_player.clone())
        .with_applied_watch(applied_tx);
        if let Some(hook) = self.hook {
            worker = worker.with_hook(hook);
        }

        let mut background = Vec::new();
        let mut hub_handle = None;
        let (dispatcher, role, hub_tx): (Arc<dyn CommandDispatcher>, Role, _) = match self.mode {
            SessionMode::Solo => (
                Arc::new(LocalDispatcher::new(command_tx.clone())),
                Role::Solo,
                None,
            ),
            SessionMode::Host { identity } => {
                let (digest_tx, digest_rx) = mpsc::channel(config.link_buffer_size);
                worker = worker.with_digest_reports(digest_tx);

                let (hub_tx, hub_rx) = mpsc::channel(config.command_buffer_size);
                let gate = AdmissionGate::new(identity, config.capacity, config.protocol_version);
                let hub = RelayHub::new(
                    gate,
                    command_tx.clone(),
                    &hub_tx,
                    hub_rx,
                    digest_rx,
                    event_bus.clone(),
                );
                hub_handle = Some(tokio::spawn(hub.run()));

                (
                    Arc::new(NetworkDispatcher::Host {
                        hub: hub_tx.clone(),
                    }),
                    Role::Host,
                    Some(hub_tx),
                )
            }
            SessionMode::Peer { mut link, request } => {
                let connection = peer::join(&mut link, &request).await?;
                event_bus.publish(SessionEvent::Admitted { connection });

                let (digest_tx, digest_rx) = mpsc::channel(config.link_buffer_size);
                worker = worker.with_digest_reports(digest_tx);

                let dispatcher = NetworkDispatcher::Peer {
                    link: link.tx.clone(),
                    worker: command_tx.clone(),
                };
                let peer_link = PeerLink::new(
                    connection,
                    link,
                    command_tx.clone(),
                    digest_rx,
                    event_bus.clone(),
                );
                background.push(tokio::spawn(peer_link.run()));

                (Arc::new(dispatcher), Role::Peer { connection }, None)
            }
        };

        let worker_handle = tokio::spawn(worker.run());

        let rng = self.rng.unwrap_or_else(|| Arc::new(PcgRng));
        let resolver = AttackResolver::new(
            Arc::clone(&dispatcher),
            handle.clone(),
            self.selector
                .unwrap_or_else(|| Arc::new(FirstCandidateSelector)),
            Arc::clone(&clock),
            config.timing,
            config.combat.crit_roll_ceiling,
            DiceRoller::new(rng, config.session_seed),
        );

        if role.has_authority() {
            let provider = self
                .npc_provider
                .unwrap_or_else(|| Arc::new(BasicAttackProvider));
            let director = HostDirector::new(
                handle.clone(),
                Arc::clone(&dispatcher),
                resolver.clone(),
                provider,
            )
            .with_round_check(Arc::clone(&clock), config.round_check_debounce);
            background.push(tokio::spawn(director.run()));
        }

        if let Some(player) = self.local_player {
            let forfeiter = TurnForfeiter::new(player, &handle, Arc::clone(&dispatcher));
            background.push(tokio::spawn(forfeiter.run()));
        }

        info!(?role, "participant started");
        Ok(Participant {
            handle,
            dispatcher,
            resolver,
            oracles,
            role,
            hub_tx,
            link_buffer_size: config.link_buffer_size,
            worker_handle,
            hub_handle,
            background,
        })
    }
}
