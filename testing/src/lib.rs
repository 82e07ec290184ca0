//! # Relink Testing
//!
//! Testing utilities for the relink architecture.
//!
//! The centerpiece is [`ReducerTest`], a fluent Given-When-Then harness for
//! exercising reducers as pure functions: no runtime, no spawned tasks,
//! just `(State, Action, Environment) → (State, Effects)` and assertions on
//! both outputs.

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};
