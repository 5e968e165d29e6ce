//! Oracle access errors.
//!
//! Errors related to configuration availability and data access.

use crate::error::{ErrorSeverity, GameError};

/// Errors that occur when accessing oracle data.
///
/// These are configuration errors: the operation that needed the data is
/// aborted and no state mutation is attempted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// QuestOracle is not available in the environment.
    #[error("QuestOracle not available")]
    QuestsNotAvailable,

    /// ArchetypeOracle is not available in the environment.
    #[error("ArchetypeOracle not available")]
    ArchetypesNotAvailable,

    /// No quest has been selected yet.
    #[error("no quest selected")]
    NoQuestSelected,

    /// Quest index has no configuration.
    #[error("quest {0} not found")]
    QuestNotFound(u32),

    /// Wave index is outside the quest's wave list.
    #[error("wave {wave} not found in quest {quest}")]
    WaveNotFound { quest: u32, wave: u32 },

    /// Archetype kind has no definition.
    #[error("archetype '{0}' not found")]
    ArchetypeNotFound(String),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            QuestsNotAvailable | ArchetypesNotAvailable => ErrorSeverity::Fatal,
            NoQuestSelected | QuestNotFound(_) | WaveNotFound { .. } | ArchetypeNotFound(_) => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            QuestsNotAvailable => "ORACLE_QUESTS_NOT_AVAILABLE",
            ArchetypesNotAvailable => "ORACLE_ARCHETYPES_NOT_AVAILABLE",
            NoQuestSelected => "ORACLE_NO_QUEST_SELECTED",
            QuestNotFound(_) => "ORACLE_QUEST_NOT_FOUND",
            WaveNotFound { .. } => "ORACLE_WAVE_NOT_FOUND",
            ArchetypeNotFound(_) => "ORACLE_ARCHETYPE_NOT_FOUND",
        }
    }
}
