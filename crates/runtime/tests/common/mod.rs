//! Shared fixtures for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use combat_content::{ArchetypeCatalog, QuestCatalog, QuestDefinition, SpawnSpec, WaveDefinition};
use combat_core::{ArchetypeDefinition, Location, RoundOutcome, StatBlock};
use combat_runtime::{Event, OracleManager, TurnEvent};
use tokio::sync::broadcast::{self, error::RecvError};

fn archetype(kind: &str, health: u32, defence: u32, damage: (u32, u32)) -> ArchetypeDefinition {
    ArchetypeDefinition {
        kind: kind.to_string(),
        display_name: kind.to_string(),
        base: StatBlock {
            max_health: health,
            defence,
            min_damage: damage.0,
            max_damage: damage.1,
            action_points: 2,
            crit_chance: 5,
            crit_multiplier: 1.5,
        },
        action_ids: vec![1],
        special: String::new(),
        upgrade_focus: (1, 1, 1),
    }
}

pub fn oracles() -> OracleManager {
    let archetypes = ArchetypeCatalog::new([
        archetype("goblin", 12, 1, (3, 5)),
        archetype("squire", 20, 2, (4, 6)),
    ]);
    let quests = QuestCatalog::new(vec![QuestDefinition {
        name: "Test Road".to_string(),
        waves: vec![
            WaveDefinition {
                boss: false,
                spawns: vec![
                    SpawnSpec {
                        location: "HostileFront1".to_string(),
                        kind: "goblin".to_string(),
                        ai_ally: false,
                        upgrade_points: 0,
                    },
                    SpawnSpec {
                        location: "FriendlyFront1".to_string(),
                        kind: "squire".to_string(),
                        ai_ally: true,
                        upgrade_points: 0,
                    },
                ],
            },
            WaveDefinition {
                boss: true,
                spawns: Vec::new(),
            },
        ],
    }]);
    OracleManager::new(Arc::new(quests), Arc::new(archetypes))
}

pub fn loc(key: &str) -> Location {
    Location::from(key)
}

/// Waits for the next round result on a `Topic::Turn` receiver.
pub async fn next_round(rx: &mut broadcast::Receiver<Event>) -> RoundOutcome {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(Event::Turn(TurnEvent::RoundResolved { outcome })) => return outcome,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(3600), wait)
        .await
        .expect("round resolves")
}

/// Drains every event currently queued on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
