//! Broadcast fan-out of participant events, one channel per [`Topic`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{CombatEvent, SessionEvent, TurnEvent};

/// Channel an [`Event`] is published on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Turn counter, phase and round transitions
    Turn,
    /// Spawns, hits, moves and resolution sequences
    Combat,
    /// Membership, scene/quest selection and desync reports
    Session,
}

/// Any event a participant publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Turn(TurnEvent),
    Combat(CombatEvent),
    Session(SessionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Combat(_) => Topic::Combat,
            Event::Session(_) => Topic::Session,
        }
    }
}

impl From<TurnEvent> for Event {
    fn from(event: TurnEvent) -> Self {
        Event::Turn(event)
    }
}

impl From<CombatEvent> for Event {
    fn from(event: CombatEvent) -> Self {
        Event::Combat(event)
    }
}

impl From<SessionEvent> for Event {
    fn from(event: SessionEvent) -> Self {
        Event::Session(event)
    }
}

/// Cloneable publisher shared by workers, the resolver and the relay.
///
/// Every topic's channel exists from construction on; the map is read-only.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// `capacity` slots per topic before slow subscribers start lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = [Topic::Turn, Topic::Combat, Topic::Session]
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!(?topic, "event dropped without subscribers");
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is registered in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    /// One receiver per requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
