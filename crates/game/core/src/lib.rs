//! Deterministic combat rules shared by every participant.
//!
//! `combat-core` defines the canonical data model (board, combatants, turn
//! counters), target selection, hit rolls and effect application. All state
//! mutation flows through [`engine::CombatEngine`]; the crate performs no I/O
//! and never blocks, so the runtime can replay the same command stream on any
//! participant and reach the same [`CombatState`].
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;

pub use action::{
    AttackCommand, CharacterSetupPayload, EffectKind, GameCommand, Issuer, TargetPlan,
    TargetingMode, plan_targets,
};
pub use combat::{CRIT_ROLL_CEILING, HitReport, apply_hit, finalize_hit};
pub use config::CombatConfig;
pub use engine::{CombatEngine, Outcome, RefreshTurn, TurnHook};
pub use env::{
    ArchetypeDefinition, ArchetypeOracle, BaseStats, CombatEnv, DiceRoller, HasBossFlag,
    OracleError, PcgRng, QuestOracle, RngOracle, StatGenerator, StaticQuests,
};
pub use error::{CombatError, ErrorSeverity, GameError};
pub use state::{
    Battlefield, BoardLayout, CharacterId, CombatState, Combatant, Faction, Location, PlayerId,
    Rank, RoundOutcome, Roster, Side, Slot, SpecialAbility, StatBlock, TurnPhase, TurnState,
};
