//! Type definitions shared by every layer
//!
//! - Runtime values (Val)
//! - Effects and awaitables (Effect, EffectKind, Awaitable)
//! - Value-level results (Outcome, TaskResult)

pub mod effect;
pub mod outcome;
pub mod task_result;
pub mod values;

// Re-export all types for convenient access
pub use effect::{Awaitable, BoxFuture, Effect, EffectKind};
pub use outcome::Outcome;
pub use task_result::TaskResult;
pub use values::Val;
