//! # Relink Runtime
//!
//! Runtime implementation for the relink architecture.
//!
//! This crate provides the [`Store`]: the imperative shell that owns state,
//! runs reducers, executes the effects they describe, and broadcasts the
//! actions those effects produce so that a presentation layer can observe
//! flow results (`LinkSucceeded`, `LinkFailed`, ...) without reaching into
//! the state machine.
//!
//! ## Execution model
//!
//! - `send()` runs the reducer synchronously under a write lock, then starts
//!   effect execution on spawned tasks and returns.
//! - Actions produced by effects are broadcast to observers and then fed
//!   back into the reducer (feedback loop).
//! - Multiple concurrent `send()` calls serialize at the reducer level, so
//!   state transitions observe a single logical flow of control.

pub mod store;

pub use store::{Store, StoreError};
