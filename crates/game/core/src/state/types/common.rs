use std::fmt;

/// Opaque key naming a board slot.
///
/// Locations are compared by string value only; the battlefield owns the
/// mapping from key to side, rank and occupant. The literal `"None"` is the
/// reserved sentinel for "no attacker".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location(String);

impl Location {
    /// Reserved key meaning "no attacker".
    pub const NONE_KEY: &'static str = "None";

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The "no attacker" sentinel.
    pub fn none() -> Self {
        Self(Self::NONE_KEY.to_owned())
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Identifier of a combatant, allocated by the battlefield in spawn order.
///
/// Allocation is deterministic: every participant applies spawns in the same
/// order and therefore hands out the same ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a human participant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
