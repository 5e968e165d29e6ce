//! Headless encounter driver.
//!
//! Hosts a session, joins an in-process companion peer over a memory link,
//! plays the first wave of a quest with AI combatants on both sides and
//! reports the result. Useful for soak-testing the relay without a frontend.
//!
//! ```bash
//! COMBAT_QUEST=0 RUST_LOG=combat_runtime=debug cargo run -p combat-headless
//! ```
mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use combat_content::ContentFactory;
use combat_core::{GameCommand, Location, PlayerId};
use combat_runtime::{
    ConnectionRequest, Event, OracleManager, Participant, RuntimeConfig, SessionEvent, Topic,
    TurnEvent, memory_pair,
};
use tokio::sync::broadcast::error::RecvError;

use crate::config::HeadlessConfig;

/// Allies fielded by the host, one per slot.
const ALLIES: [(&str, &str); 2] = [("FriendlyFront1", "squire"), ("FriendlyMid1", "squire")];

const ENCOUNTER_TIMEOUT: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = HeadlessConfig::from_env();
    logging::setup_logging(&config.session_id)?;

    let factory = ContentFactory::new(&config.data_dir);
    let quests = factory
        .load_quests()
        .with_context(|| format!("loading quests from {}", config.data_dir.display()))?;
    let archetypes = factory.load_archetypes().context("loading archetypes")?;
    let oracles = OracleManager::new(Arc::new(quests), Arc::new(archetypes));

    let mut runtime_config = RuntimeConfig::from_env();
    runtime_config.combat = factory.load_config().context("loading combat config")?;

    tracing::info!("Starting headless session: quest={}", config.quest);
    let mut host = Participant::builder()
        .config(runtime_config.clone())
        .oracles(oracles.clone())
        .host(PlayerId::new(config.host_name.as_str()))
        .build()
        .await?;
    if let Some(addr) = &config.listen {
        let bound = host.listen(addr.as_str()).await?;
        tracing::info!("Accepting peers on {}", bound);
    }

    let (host_end, peer_end) = memory_pair(runtime_config.link_buffer_size);
    host.accept(host_end).await?;
    let companion = Participant::builder()
        .config(runtime_config)
        .oracles(oracles)
        .peer(
            peer_end,
            ConnectionRequest::new(config.companion_name.as_str(), config.companion_name.as_str()),
        )
        .build()
        .await?;
    tracing::info!("Companion joined as {:?}", companion.role());

    let outcome = play(&host, config.quest).await;

    host.flush().await?;
    let seq = host.handle().applied_seq();
    companion.handle().wait_for_seq(seq).await?;
    let host_digest = host.handle().digest().await?;
    let peer_digest = companion.handle().digest().await?;
    if host_digest == peer_digest {
        tracing::info!("Participants agree after {} commands", seq);
    } else {
        tracing::warn!("Participants diverged after {} commands", seq);
    }

    companion.shutdown().await?;
    host.shutdown().await?;

    let outcome = outcome?;
    tracing::info!("Encounter finished: {:?}", outcome);
    Ok(())
}

async fn play(host: &Participant, quest: u32) -> Result<combat_core::RoundOutcome> {
    let mut turns = host.handle().subscribe(Topic::Turn);
    let mut session = host.handle().subscribe(Topic::Session);

    host.dispatch(GameCommand::StartSession).await?;
    host.dispatch(GameCommand::SelectQuest(quest)).await?;
    let spawned = host.spawn_wave(quest, 1).await?;
    tracing::info!("Wave 1 spawned {} combatants", spawned.len());

    for (slot, kind) in ALLIES {
        if let Err(e) = host
            .spawn_enemy_or_ally(Location::new(slot), kind, true, 0)
            .await
        {
            tracing::warn!("Ally {} at {} not spawned: {}", kind, slot, e);
        }
    }

    host.dispatch(GameCommand::AllReadyForCombatStart).await?;

    let wait = async {
        loop {
            tokio::select! {
                event = turns.recv() => match event {
                    Ok(Event::Turn(TurnEvent::RoundResolved { outcome })) => return Ok(outcome),
                    Ok(Event::Turn(TurnEvent::TurnAdvanced { turn, .. })) => {
                        tracing::info!("Turn {}", turn);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => tracing::debug!("Skipped {} turn events", n),
                    Err(RecvError::Closed) => bail!("event bus closed before the round resolved"),
                },
                event = session.recv() => match event {
                    Ok(Event::Session(SessionEvent::DesyncDetected { seq })) => {
                        tracing::warn!("Desync detected at seq {}", seq);
                    }
                    Ok(Event::Session(SessionEvent::PlayerJoined { display_name, .. })) => {
                        tracing::info!("{} joined the session", display_name);
                    }
                    Ok(Event::Session(SessionEvent::PlayerLeft { player, .. })) => {
                        tracing::info!("{} left the session", player.as_str());
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => bail!("event bus closed before the round resolved"),
                },
            }
        }
    };
    tokio::time::timeout(ENCOUNTER_TIMEOUT, wait)
        .await
        .context("encounter did not resolve in time")?
}
