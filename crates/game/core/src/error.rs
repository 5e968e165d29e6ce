//! Error classification shared by every combat-core error enum.
//!
//! Handlers never propagate errors across the relay: a failed command is
//! logged by the runtime and degrades to a no-op on that participant.

use crate::env::OracleError;
use crate::state::{CharacterId, Location};

/// How a failed command should be treated by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The step is skipped and the sequence carries on (empty slot, fallen target).
    Recoverable,
    /// Malformed input such as an unknown slot key.
    Validation,
    /// State disagrees with itself; worth a bug report.
    Internal,
    /// Required content is not configured.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Severity and a stable code for log fields.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Defaults to the type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised while applying a command to the combat state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatError {
    #[error("slot '{0}' does not exist")]
    SlotNotFound(Location),

    #[error("slot '{0}' is empty")]
    EmptySlot(Location),

    #[error("slot '{0}' is held by a living combatant")]
    SlotOccupied(Location),

    #[error("attacker at '{0}' not found")]
    AttackerMissing(Location),

    #[error("target at '{0}' not found")]
    TargetMissing(Location),

    #[error("target at '{0}' has fallen")]
    TargetFallen(Location),

    #[error("cannot move from '{from}' to '{to}' across sides")]
    CrossSideMove { from: Location, to: Location },

    #[error("character {0} has no record")]
    CharacterNotFound(CharacterId),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        use CombatError::*;
        match self {
            EmptySlot(_) | AttackerMissing(_) | TargetMissing(_) | TargetFallen(_) => {
                ErrorSeverity::Recoverable
            }
            SlotNotFound(_) | SlotOccupied(_) | CrossSideMove { .. } => ErrorSeverity::Validation,
            CharacterNotFound(_) => ErrorSeverity::Internal,
            Oracle(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        use CombatError::*;
        match self {
            SlotNotFound(_) => "COMBAT_SLOT_NOT_FOUND",
            EmptySlot(_) => "COMBAT_EMPTY_SLOT",
            SlotOccupied(_) => "COMBAT_SLOT_OCCUPIED",
            AttackerMissing(_) => "COMBAT_ATTACKER_MISSING",
            TargetMissing(_) => "COMBAT_TARGET_MISSING",
            TargetFallen(_) => "COMBAT_TARGET_FALLEN",
            CrossSideMove { .. } => "COMBAT_CROSS_SIDE_MOVE",
            CharacterNotFound(_) => "COMBAT_CHARACTER_NOT_FOUND",
            Oracle(e) => e.error_code(),
        }
    }
}
