//! Relays a forfeited turn when the local player has no living character.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use combat_core::{GameCommand, PlayerId};

use crate::api::ParticipantHandle;
use crate::events::{Event, Topic, TurnEvent};
use crate::relay::CommandDispatcher;

/// Turns a local `LocalPlayerMissing` report into a relayed `ForceEndTurn`
/// so the host can aggregate readiness without waiting on this participant.
pub struct TurnForfeiter {
    player: PlayerId,
    dispatcher: Arc<dyn CommandDispatcher>,
    turn_rx: broadcast::Receiver<Event>,
    /// Last turn forfeited, so repeated reports relay once.
    forfeited: Option<u32>,
}

impl TurnForfeiter {
    pub fn new(
        player: PlayerId,
        handle: &ParticipantHandle,
        dispatcher: Arc<dyn CommandDispatcher>,
    ) -> Self {
        Self {
            player,
            dispatcher,
            turn_rx: handle.subscribe(Topic::Turn),
            forfeited: None,
        }
    }

    pub async fn run(mut self) {
        loop {
            match self.turn_rx.recv().await {
                Ok(Event::Turn(TurnEvent::LocalPlayerMissing { player, turn }))
                    if player == self.player =>
                {
                    if self.forfeited == Some(turn) {
                        continue;
                    }
                    self.forfeited = Some(turn);
                    info!(player = player.as_str(), turn, "forfeiting turn");
                    let command = GameCommand::ForceEndTurn(player);
                    if let Err(e) = self.dispatcher.dispatch(command).await {
                        warn!("turn forfeit not relayed: {}", e);
                        break;
                    }
                }
                Ok(Event::Turn(TurnEvent::CombatStarted)) => self.forfeited = None,
                Ok(_) => {}
                // The worker reports again on the next turn.
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "forfeit watcher lagged"),
                Err(RecvError::Closed) => break,
            }
        }
        debug!("turn forfeiter stopped");
    }
}
