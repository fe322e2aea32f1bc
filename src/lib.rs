//! Stochast: a probabilistic finite-state execution engine.
//!
//! States carry named *algorithms* - ordered command sequences that,
//! when run, register candidate successor states with weights and then
//! select the next state, either by weighted random draw or by a
//! pluggable history-conditioned policy.
//!
//! # Core Concepts
//!
//! - **StateGraph**: arena of named states with weighted successor
//!   lists; weights are normalized lazily, at selection time
//! - **Command**: unit of execution mutating the graph and the context
//! - **Context**: current state, visit history, working memory, outbox
//! - **RandomSource**: caller-injected randomness - system PRNG, fixed
//!   sequences for replay, or statistical distributions
//! - **HistoryPolicy**: history-conditioned routing strategy
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stochast::{AlgorithmBuilder, Automaton, StateGraph};
//! use stochast::random::FixedSequence;
//!
//! let mut graph = StateGraph::new();
//! let start = graph.add_state("start", false);
//! let left = graph.add_state("left", true);
//! let right = graph.add_state("right", true);
//!
//! // Each execution rebuilds the candidate set, then draws.
//! AlgorithmBuilder::new("tick")
//!     .clear_transitions()
//!     .add_existing_state(left, 0.3)
//!     .add_existing_state(right, 0.7)
//!     .weighted_random(Arc::new(FixedSequence::new(vec![0.9])))
//!     .attach(&mut graph, start);
//!
//! let mut automaton = Automaton::new(graph, start);
//! let result = automaton.run("tick", None).unwrap();
//!
//! assert_eq!(result.final_state_name(), "right");
//! assert!(result.is_final());
//! ```

pub mod automaton;
pub mod builder;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod policy;
pub mod random;

// Re-export commonly used types
pub use automaton::{Automaton, AutomatonResult};
pub use builder::AlgorithmBuilder;
pub use command::{Command, Target};
pub use core::{Context, InputMessage, OutputMessage, StateGraph, StateId, StateRef};
pub use error::{EngineResult, ExecError};
pub use events::{EngineEvent, EventSink};
pub use policy::{FnPolicy, HistoryPolicy};
pub use random::{FixedSequence, RandomSource, SystemRandom};
