//! Per-turn hooks run by `AdvanceTurn`.

use crate::state::{Battlefield, CharacterId};

/// Per-combatant refresh applied at the start of every turn.
///
/// NPC hooks run on hostiles then AI allies, player hooks on player allies,
/// each group in roster insertion order.
pub trait TurnHook: Send + Sync {
    fn on_npc_turn(&self, field: &mut Battlefield, id: CharacterId);

    fn on_player_turn(&self, field: &mut Battlefield, id: CharacterId) {
        self.on_npc_turn(field, id);
    }
}

/// Restores action points, clears the turn-ended flag and drops any
/// protection the combatant was granting.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshTurn;

impl TurnHook for RefreshTurn {
    fn on_npc_turn(&self, field: &mut Battlefield, id: CharacterId) {
        if let Some(c) = field.character_mut(id) {
            c.action_points = c.stats.action_points;
            c.turn_ended = false;
        }
        let protected: Vec<CharacterId> = field
            .characters()
            .filter(|c| c.guardian == Some(id))
            .map(|c| c.id)
            .collect();
        for ward in protected {
            if let Some(c) = field.character_mut(ward) {
                c.guardian = None;
            }
        }
    }
}
