//! Combat resolution system.
//!
//! Pure functions for the two halves of a hit:
//!
//! - `roll`: finalizes an [`AttackCommand`] on the issuing participant
//!   (damage roll, crit roll, multiplier)
//! - `effect`: applies a finalized hit to the battlefield on every participant
//!
//! Rolling happens exactly once per hit. Everything downstream of
//! [`finalize_hit`] is deterministic given the board.
//!
//! [`AttackCommand`]: crate::action::AttackCommand

mod effect;
mod roll;

pub use effect::{HitReport, apply_hit};
pub use roll::{CRIT_ROLL_CEILING, finalize_hit};
