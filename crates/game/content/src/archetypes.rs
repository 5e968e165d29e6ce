//! Archetype catalog.

use std::collections::HashMap;

use combat_core::{ArchetypeDefinition, ArchetypeOracle, StatBlock, StatGenerator};

/// Archetypes keyed by kind.
///
/// Doubles as the default [`StatGenerator`]: spawned combatants receive the
/// archetype's base stats unchanged. Spending the upgrade budget along
/// `upgrade_focus` is left to generators supplied by the embedding game.
#[derive(Clone, Debug, Default)]
pub struct ArchetypeCatalog {
    archetypes: HashMap<String, ArchetypeDefinition>,
}

impl ArchetypeCatalog {
    pub fn new(definitions: impl IntoIterator<Item = ArchetypeDefinition>) -> Self {
        Self {
            archetypes: definitions
                .into_iter()
                .map(|d| (d.kind.clone(), d))
                .collect(),
        }
    }

    pub fn insert(&mut self, definition: ArchetypeDefinition) {
        self.archetypes.insert(definition.kind.clone(), definition);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.archetypes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

impl ArchetypeOracle for ArchetypeCatalog {
    fn archetype(&self, kind: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.get(kind)
    }
}

impl StatGenerator for ArchetypeCatalog {
    fn generate(&self, definition: &ArchetypeDefinition, _upgrade_points: u32) -> StatBlock {
        definition.base.clone()
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{CharacterId, Location};

    use super::*;

    fn goblin() -> ArchetypeDefinition {
        ArchetypeDefinition {
            kind: "goblin".into(),
            display_name: "Goblin".into(),
            base: StatBlock {
                max_health: 12,
                defence: 1,
                min_damage: 2,
                max_damage: 4,
                action_points: 2,
                crit_chance: 10,
                crit_multiplier: 1.5,
            },
            action_ids: vec![1, 2],
            special: String::new(),
            upgrade_focus: (2, 1, 1),
        }
    }

    #[test]
    fn setup_payload_carries_base_stats() {
        let catalog = ArchetypeCatalog::new([goblin()]);
        let def = catalog.archetype("goblin").unwrap();

        let payload = catalog.setup_payload(CharacterId(4), Location::from("HostileFront1"), def, 3);
        assert_eq!(payload.id, CharacterId(4));
        assert_eq!(payload.name, "Goblin");
        assert_eq!(payload.stats, def.base);
        assert_eq!(payload.action_ids, vec![1, 2]);
        assert!(catalog.archetype("orc").is_none());
    }
}
