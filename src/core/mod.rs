//! Core engine types.
//!
//! This module contains the data model of the engine:
//! - The state arena and weighted transition math
//! - The per-automaton execution context
//! - Input/output message values
//!
//! Everything here is synchronous and runs to completion; commands in
//! the `command` module drive these types.

mod context;
mod message;
mod state;
pub mod weights;

pub use context::Context;
pub use message::{InputMessage, OutputMessage};
pub use state::{StateGraph, StateId, StateNode, StateRef};
