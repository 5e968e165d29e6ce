//! Board slots, roster bookkeeping and the location → combatant resolver.

use std::collections::BTreeMap;

use strum::{Display, EnumIter, IntoEnumIterator};

use super::{CharacterId, Combatant, Faction, Location, PlayerId, Side};

/// Depth of a slot from the centre line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    Front,
    Mid,
    Back,
}

/// One addressable board position holding at most one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub location: Location,
    pub side: Side,
    pub rank: Rank,
    pub occupant: Option<CharacterId>,
}

/// Shape of the board: how many slots each rank holds per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardLayout {
    pub slots_per_rank: u8,
}

impl BoardLayout {
    pub const DEFAULT_SLOTS_PER_RANK: u8 = 2;

    /// Canonical slot key, e.g. `HostileFront1` or `FriendlyBack2`.
    pub fn slot_key(side: Side, rank: Rank, index: u8) -> Location {
        Location::new(format!("{side}{rank}{index}"))
    }

    /// Builds the ordered slot list: hostile side first, then friendly; front
    /// to back within a side; ascending index within a rank.
    pub fn build_slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        for side in [Side::Hostile, Side::Friendly] {
            for rank in Rank::iter() {
                for index in 1..=self.slots_per_rank {
                    slots.push(Slot {
                        location: Self::slot_key(side, rank, index),
                        side,
                        rank,
                        occupant: None,
                    });
                }
            }
        }
        slots
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            slots_per_rank: Self::DEFAULT_SLOTS_PER_RANK,
        }
    }
}

/// Living combatants grouped by faction, in insertion order.
///
/// Membership changes only on spawn and death.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    pub hostile: Vec<CharacterId>,
    pub player_allies: Vec<CharacterId>,
    pub ai_allies: Vec<CharacterId>,
}

impl Roster {
    fn group_mut(&mut self, faction: Faction) -> &mut Vec<CharacterId> {
        match faction {
            Faction::Hostile => &mut self.hostile,
            Faction::PlayerAlly => &mut self.player_allies,
            Faction::AiAlly => &mut self.ai_allies,
        }
    }

    pub fn insert(&mut self, faction: Faction, id: CharacterId) {
        let group = self.group_mut(faction);
        if !group.contains(&id) {
            group.push(id);
        }
    }

    pub fn remove(&mut self, id: CharacterId) {
        self.hostile.retain(|c| *c != id);
        self.player_allies.retain(|c| *c != id);
        self.ai_allies.retain(|c| *c != id);
    }

    pub fn has_hostiles(&self) -> bool {
        !self.hostile.is_empty()
    }

    /// True when any player-ally or AI-ally is still standing.
    pub fn has_friendlies(&self) -> bool {
        !self.player_allies.is_empty() || !self.ai_allies.is_empty()
    }

    /// Hostiles then AI allies, each in insertion order.
    pub fn ai_controlled(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.hostile.iter().chain(self.ai_allies.iter()).copied()
    }
}

/// Board occupancy, combatant records and roster.
///
/// Fallen combatants stay in their slot (and in `characters`) until the slot
/// is reused or the encounter is reset, but leave the roster immediately.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battlefield {
    slots: Vec<Slot>,
    characters: BTreeMap<CharacterId, Combatant>,
    pub roster: Roster,
    next_character_id: u32,
}

impl Battlefield {
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            slots: layout.build_slots(),
            characters: BTreeMap::new(),
            roster: Roster::default(),
            next_character_id: 1,
        }
    }

    /// Hands out the next combatant id.
    pub fn allocate_id(&mut self) -> CharacterId {
        let id = CharacterId(self.next_character_id);
        self.next_character_id += 1;
        id
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, location: &Location) -> Option<&Slot> {
        self.slots.iter().find(|s| &s.location == location)
    }

    fn slot_mut(&mut self, location: &Location) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| &s.location == location)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Combatant> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Combatant> {
        self.characters.get_mut(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Combatant> {
        self.characters.values()
    }

    /// Resolves the combatant standing on `location`, dead or alive.
    pub fn occupant(&self, location: &Location) -> Option<&Combatant> {
        let id = self.slot(location)?.occupant?;
        self.characters.get(&id)
    }

    pub fn occupant_mut(&mut self, location: &Location) -> Option<&mut Combatant> {
        let id = self.slot(location)?.occupant?;
        self.characters.get_mut(&id)
    }

    /// Resolves the slot a combatant currently stands on.
    pub fn location_of(&self, id: CharacterId) -> Option<&Location> {
        self.slots
            .iter()
            .find(|s| s.occupant == Some(id))
            .map(|s| &s.location)
    }

    /// Character owned by `player`, if it is still standing.
    pub fn living_character_of(&self, player: &PlayerId) -> Option<&Combatant> {
        self.characters
            .values()
            .find(|c| c.alive && c.owner.as_ref() == Some(player))
    }

    /// Places a new combatant on an empty slot (or over a fallen one).
    ///
    /// Returns `false` without mutating anything when the slot does not exist
    /// or holds a living combatant.
    pub fn place(&mut self, location: &Location, combatant: Combatant) -> bool {
        let Some(slot) = self.slot(location) else {
            return false;
        };
        if let Some(existing) = slot.occupant {
            match self.characters.get(&existing) {
                Some(c) if c.alive => return false,
                _ => {
                    self.characters.remove(&existing);
                }
            }
        }

        let id = combatant.id;
        if combatant.alive {
            self.roster.insert(combatant.faction, id);
        }
        self.characters.insert(id, combatant);
        if let Some(slot) = self.slot_mut(location) {
            slot.occupant = Some(id);
        }
        true
    }

    /// Marks a combatant as fallen and removes it from the roster.
    pub fn mark_fallen(&mut self, id: CharacterId) {
        if let Some(c) = self.characters.get_mut(&id) {
            c.alive = false;
            c.health = 0;
            c.guardian = None;
        }
        self.roster.remove(id);
        for c in self.characters.values_mut() {
            if c.guardian == Some(id) {
                c.guardian = None;
            }
        }
    }

    /// Moves the occupant of `from` to `to`, swapping with any occupant of `to`.
    ///
    /// Returns `false` when either slot is unknown or `from` is empty.
    pub fn relocate(&mut self, from: &Location, to: &Location) -> bool {
        let (Some(from_idx), Some(to_idx)) = (
            self.slots.iter().position(|s| &s.location == from),
            self.slots.iter().position(|s| &s.location == to),
        ) else {
            return false;
        };
        if self.slots[from_idx].occupant.is_none() {
            return false;
        }
        let moving = self.slots[from_idx].occupant.take();
        self.slots[from_idx].occupant = self.slots[to_idx].occupant.take();
        self.slots[to_idx].occupant = moving;
        true
    }

    /// Removes fallen combatants from the board entirely.
    pub fn clear_fallen(&mut self) {
        let fallen: Vec<CharacterId> = self
            .characters
            .values()
            .filter(|c| !c.alive)
            .map(|c| c.id)
            .collect();
        for id in fallen {
            self.characters.remove(&id);
            for slot in self.slots.iter_mut() {
                if slot.occupant == Some(id) {
                    slot.occupant = None;
                }
            }
        }
    }

    /// Living combatants on `side` in board order, optionally limited to ranks.
    pub fn living_on(&self, side: Side, ranks: Option<&[Rank]>) -> Vec<&Location> {
        self.slots
            .iter()
            .filter(|s| s.side == side)
            .filter(|s| ranks.is_none_or(|r| r.contains(&s.rank)))
            .filter(|s| {
                s.occupant
                    .and_then(|id| self.characters.get(&id))
                    .is_some_and(|c| c.alive)
            })
            .map(|s| &s.location)
            .collect()
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new(BoardLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(field: &mut Battlefield, key: &str, faction: Faction) -> CharacterId {
        let id = field.allocate_id();
        let mut c = Combatant::new(id, key, faction);
        c.health = 10;
        assert!(field.place(&Location::from(key), c));
        id
    }

    #[test]
    fn default_layout_has_twelve_ordered_slots() {
        let field = Battlefield::default();
        let keys: Vec<&str> = field.slots().iter().map(|s| s.location.as_str()).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], "HostileFront1");
        assert_eq!(keys[5], "HostileBack2");
        assert_eq!(keys[6], "FriendlyFront1");
    }

    #[test]
    fn place_refuses_living_occupant_but_replaces_fallen() {
        let mut field = Battlefield::default();
        let first = spawn(&mut field, "HostileFront1", Faction::Hostile);

        let id = field.allocate_id();
        let blocked = Combatant::new(id, "blocked", Faction::Hostile);
        assert!(!field.place(&"HostileFront1".into(), blocked.clone()));

        field.mark_fallen(first);
        assert!(field.roster.hostile.is_empty());
        assert!(field.place(&"HostileFront1".into(), blocked));
        assert!(field.character(first).is_none());
        assert_eq!(field.roster.hostile, vec![id]);
    }

    #[test]
    fn relocate_swaps_occupants() {
        let mut field = Battlefield::default();
        let a = spawn(&mut field, "FriendlyFront1", Faction::PlayerAlly);
        let b = spawn(&mut field, "FriendlyBack1", Faction::AiAlly);

        assert!(field.relocate(&"FriendlyFront1".into(), &"FriendlyBack1".into()));
        assert_eq!(field.location_of(a).map(Location::as_str), Some("FriendlyBack1"));
        assert_eq!(field.location_of(b).map(Location::as_str), Some("FriendlyFront1"));

        assert!(!field.relocate(&"FriendlyMid1".into(), &"FriendlyMid2".into()));
        assert!(!field.relocate(&"Nowhere".into(), &"FriendlyMid2".into()));
    }

    #[test]
    fn living_on_filters_rank_and_fallen() {
        let mut field = Battlefield::default();
        let front = spawn(&mut field, "HostileFront1", Faction::Hostile);
        spawn(&mut field, "HostileBack2", Faction::Hostile);

        let fronts = field.living_on(Side::Hostile, Some(&[Rank::Front]));
        assert_eq!(fronts, vec![&Location::from("HostileFront1")]);

        field.mark_fallen(front);
        assert_eq!(field.living_on(Side::Hostile, None).len(), 1);
    }
}
