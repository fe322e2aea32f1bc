//! The state arena: named nodes, weighted successor lists, algorithms.
//!
//! States form a shared, mutable graph. Instead of reference-counted
//! object references, every state lives in a [`StateGraph`] arena and is
//! addressed by a stable [`StateId`]; successor lists store `(StateId,
//! weight)` pairs. Identity is the state's name - interning guarantees
//! one node per name within a graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::command::Command;
use crate::core::context::Context;
use crate::core::weights;
use crate::error::EngineResult;
use crate::events::EngineEvent;

/// Stable handle to a state inside a [`StateGraph`].
///
/// Handles are cheap to copy and remain valid for the graph's lifetime;
/// states are never destroyed during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position of the state in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Borrowed view of a single state, handed to history policies.
#[derive(Clone, Copy, Debug)]
pub struct StateRef<'a> {
    pub id: StateId,
    pub name: &'a str,
    pub is_final: bool,
}

/// A named node holding an ordered list of weighted successors and a
/// mapping from algorithm name to command sequence.
#[derive(Clone, Debug, Default)]
pub struct StateNode {
    name: String,
    is_final: bool,
    successors: Vec<(StateId, f64)>,
    algorithms: HashMap<String, Arc<[Command]>>,
}

impl StateNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Successors in insertion order with their unnormalized weights.
    pub fn successors(&self) -> &[(StateId, f64)] {
        &self.successors
    }

    /// Names of the algorithms attached to this state.
    pub fn algorithm_names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    pub fn has_algorithm(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }
}

/// Arena owning every state of one automaton.
///
/// States are constructed once during assembly and shared by reference
/// (`StateId`) across algorithms and contexts. Mutation follows a
/// single-writer discipline: one logical caller drives a graph at a
/// time.
///
/// # Example
///
/// ```rust
/// use stochast::StateGraph;
///
/// let mut graph = StateGraph::new();
/// let a = graph.add_state("a", false);
/// let b = graph.add_state("b", true);
/// graph.add_successor(a, b, 1.0);
///
/// assert_eq!(graph.select_successor(a, 0.5), b);
/// assert_eq!(graph.name_of(b), "b");
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateGraph {
    nodes: Vec<StateNode>,
    by_name: HashMap<String, StateId>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the handle belongs to this graph.
    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Add a state, or return the existing handle if the name is
    /// already interned. Re-adding never changes the stored finality:
    /// the first registration wins.
    pub fn add_state(&mut self, name: impl Into<String>, is_final: bool) -> StateId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = StateId(self.nodes.len());
        self.by_name.insert(name.clone(), id);
        self.nodes.push(StateNode {
            name,
            is_final,
            successors: Vec::new(),
            algorithms: HashMap::new(),
        });
        id
    }

    /// Look up a state by name.
    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// Name of a state.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not from this graph.
    pub fn name_of(&self, id: StateId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn is_final(&self, id: StateId) -> bool {
        self.nodes[id.0].is_final
    }

    pub fn get(&self, id: StateId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// Borrowed view of one state, as handed to history policies.
    pub fn view(&self, id: StateId) -> StateRef<'_> {
        let node = &self.nodes[id.0];
        StateRef {
            id,
            name: &node.name,
            is_final: node.is_final,
        }
    }

    /// All state handles, in arena order.
    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.nodes.len()).map(StateId)
    }

    /// Register a weighted transition. A second insertion of the same
    /// target is a no-op: successor identity is unique per state.
    pub fn add_successor(&mut self, from: StateId, to: StateId, weight: f64) {
        let node = &mut self.nodes[from.0];
        if node.successors.iter().any(|(id, _)| *id == to) {
            return;
        }
        node.successors.push((to, weight));
        trace!(
            from = %node.name,
            to = to.0,
            weight,
            "successor_added"
        );
    }

    /// Empty the successor list, typically at the start of an algorithm
    /// so each run produces a fresh candidate set.
    pub fn clear_successors(&mut self, id: StateId) {
        self.nodes[id.0].successors.clear();
    }

    pub fn successors(&self, id: StateId) -> &[(StateId, f64)] {
        &self.nodes[id.0].successors
    }

    /// Select a successor for a draw in `[0, 1)`.
    ///
    /// With no successors the state itself is returned (stay). Weights
    /// are normalized lazily: negative weights count as zero, and when
    /// no weight is positive every successor is equally likely. The
    /// cumulative walk runs in insertion order and falls back to the
    /// last successor if floating error prevents a match.
    pub fn select_successor(&self, id: StateId, draw: f64) -> StateId {
        let node = &self.nodes[id.0];
        if node.successors.is_empty() {
            return id;
        }
        let raw: Vec<f64> = node.successors.iter().map(|(_, w)| *w).collect();
        let probs = weights::normalized_or_uniform(&raw);
        let chosen = weights::pick_index(&probs, draw);
        node.successors[chosen].0
    }

    /// Normalized selection probabilities for the current successor
    /// list, in insertion order.
    pub fn transition_probabilities(&self, id: StateId) -> Vec<(StateId, f64)> {
        let node = &self.nodes[id.0];
        let raw: Vec<f64> = node.successors.iter().map(|(_, w)| *w).collect();
        let probs = weights::normalized_or_uniform(&raw);
        node.successors
            .iter()
            .map(|(target, _)| *target)
            .zip(probs)
            .collect()
    }

    /// Attach (or replace) a named command sequence on a state.
    pub fn add_algorithm(&mut self, id: StateId, name: impl Into<String>, commands: Vec<Command>) {
        self.nodes[id.0]
            .algorithms
            .insert(name.into(), commands.into());
    }

    pub fn remove_algorithm(&mut self, id: StateId, name: &str) {
        self.nodes[id.0].algorithms.remove(name);
    }

    /// Run a named algorithm of `state` against the given context.
    ///
    /// A missing algorithm is a recoverable no-op, surfaced as an
    /// [`EngineEvent::AlgorithmMissing`] diagnostic. Commands execute
    /// strictly in order; the first fatal error aborts the sequence.
    pub fn execute_algorithm(
        &mut self,
        ctx: &mut Context,
        state: StateId,
        name: &str,
    ) -> EngineResult<()> {
        let Some(commands) = self.nodes[state.0].algorithms.get(name).cloned() else {
            ctx.sink().emit(EngineEvent::AlgorithmMissing {
                state: self.name_of(state).to_string(),
                algorithm: name.to_string(),
            });
            return Ok(());
        };

        ctx.sink().emit(EngineEvent::AlgorithmStarted {
            state: self.name_of(state).to_string(),
            algorithm: name.to_string(),
        });

        for command in commands.iter() {
            command.execute(self, ctx, state)?;
        }
        Ok(())
    }
}
