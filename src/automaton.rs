//! The automaton facade: graph + initial state + context.
//!
//! An [`Automaton`] binds a state graph to one execution context and
//! exposes the two execution entry points: [`Automaton::run`] (reset
//! then execute, each call independent) and [`Automaton::step`]
//! (execute from the current state, the basis for multi-tick control
//! loops). Output reaches the caller only through the returned
//! snapshot and the drained outbox.

use std::sync::Arc;
use tracing::debug;

use crate::core::{Context, InputMessage, OutputMessage, StateGraph, StateId};
use crate::error::{EngineResult, ExecError};
use crate::events::{EngineEvent, EventSink};

/// Immutable snapshot of one `run`/`step` outcome.
#[derive(Clone, Debug)]
pub struct AutomatonResult {
    final_state: StateId,
    final_state_name: String,
    visited: Vec<StateId>,
    is_final: bool,
    input: Option<InputMessage>,
}

impl AutomatonResult {
    /// State the context ended in.
    pub fn final_state(&self) -> StateId {
        self.final_state
    }

    pub fn final_state_name(&self) -> &str {
        &self.final_state_name
    }

    /// Copy of the visit history at snapshot time, oldest first.
    pub fn visited(&self) -> &[StateId] {
        &self.visited
    }

    /// Whether the final state is an accepting/final state.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// The input message processed by this call, if any.
    pub fn input(&self) -> Option<&InputMessage> {
        self.input.as_ref()
    }
}

/// A probabilistic automaton bound to a single execution context.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stochast::{AlgorithmBuilder, Automaton, StateGraph};
/// use stochast::random::FixedSequence;
///
/// let mut graph = StateGraph::new();
/// let start = graph.add_state("start", false);
/// let left = graph.add_state("left", true);
/// let right = graph.add_state("right", true);
///
/// AlgorithmBuilder::new("tick")
///     .clear_transitions()
///     .add_existing_state(left, 0.3)
///     .add_existing_state(right, 0.7)
///     .weighted_random(Arc::new(FixedSequence::new(vec![0.9])))
///     .attach(&mut graph, start);
///
/// let mut automaton = Automaton::new(graph, start);
/// let result = automaton.step("tick", None).unwrap();
///
/// assert_eq!(result.final_state_name(), "right");
/// assert!(result.is_final());
/// ```
pub struct Automaton {
    graph: StateGraph,
    initial: StateId,
    context: Context,
}

impl Automaton {
    /// Bind `graph` to a fresh context positioned at `initial`.
    pub fn new(graph: StateGraph, initial: StateId) -> Self {
        let context = Context::new(initial);
        Self {
            graph,
            initial,
            context,
        }
    }

    /// Replace the diagnostic sink (builder style).
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.context.set_sink(sink);
        self
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut StateGraph {
        &mut self.graph
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn current_state(&self) -> StateId {
        self.context.current()
    }

    pub fn current_state_name(&self) -> &str {
        self.graph.name_of(self.context.current())
    }

    pub fn is_in_final_state(&self) -> bool {
        self.graph.is_final(self.context.current())
    }

    /// Algorithm names available on the current state.
    pub fn current_state_algorithms(&self) -> Vec<String> {
        self.graph
            .get(self.context.current())
            .map(|node| node.algorithm_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Register a weighted transition directly on the graph.
    pub fn add_transition(&mut self, from: StateId, to: StateId, weight: f64) {
        self.graph.add_successor(from, to, weight);
    }

    /// Normalized selection probabilities of a state's current
    /// successor list.
    pub fn transition_probabilities(&self, state: StateId) -> Vec<(StateId, f64)> {
        self.graph.transition_probabilities(state)
    }

    /// Reset the context to the initial state, clearing history,
    /// memory and outbox.
    pub fn reset(&mut self) {
        debug!(initial = self.graph.name_of(self.initial), "automaton_reset");
        self.context.reset(self.initial);
    }

    /// Move the context to an explicit state without clearing history.
    pub fn reset_to(&mut self, state: StateId) -> EngineResult<()> {
        if !self.graph.contains(state) {
            return Err(ExecError::ForeignState {
                index: state.index(),
            });
        }
        self.context.set_state(state, &self.graph);
        Ok(())
    }

    /// Reset, record the input, then execute `algorithm` from the
    /// initial state. Each call is independent of previous ones.
    pub fn run(
        &mut self,
        algorithm: &str,
        input: Option<InputMessage>,
    ) -> EngineResult<AutomatonResult> {
        self.context.reset(self.initial);
        self.execute(algorithm, input)
    }

    /// Record the input and execute `algorithm` from the *current*
    /// state, without resetting.
    pub fn step(
        &mut self,
        algorithm: &str,
        input: Option<InputMessage>,
    ) -> EngineResult<AutomatonResult> {
        self.execute(algorithm, input)
    }

    /// Execute the algorithm named by the input's raw payload, from
    /// the current state.
    ///
    /// When the current state carries no algorithm under that name,
    /// nothing executes: an `AlgorithmMissing` diagnostic is emitted
    /// and the returned snapshot shows the unchanged state.
    pub fn dispatch(&mut self, input: InputMessage) -> EngineResult<AutomatonResult> {
        let name = input.raw().to_string();
        let current = self.context.current();
        let known = self
            .graph
            .get(current)
            .map(|node| node.has_algorithm(&name))
            .unwrap_or(false);

        if !known {
            self.context.set_input(input.clone());
            self.context.sink().emit(EngineEvent::AlgorithmMissing {
                state: self.graph.name_of(current).to_string(),
                algorithm: name,
            });
            return Ok(self.snapshot(Some(input)));
        }
        self.step(&name, Some(input))
    }

    /// Return and clear all output queued since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<OutputMessage> {
        self.context.drain_outbox()
    }

    /// Store a value in the automaton's working memory.
    pub fn put(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.put(key, value);
    }

    /// Read a value from the automaton's working memory.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }

    pub fn memory(&self) -> &std::collections::HashMap<String, serde_json::Value> {
        self.context.memory()
    }

    fn execute(
        &mut self,
        algorithm: &str,
        input: Option<InputMessage>,
    ) -> EngineResult<AutomatonResult> {
        let snapshot_input = input.clone();
        if let Some(message) = input {
            self.context.set_input(message);
        }

        let current = self.context.current();
        self.graph
            .execute_algorithm(&mut self.context, current, algorithm)?;

        Ok(self.snapshot(snapshot_input))
    }

    fn snapshot(&self, input: Option<InputMessage>) -> AutomatonResult {
        let final_state = self.context.current();
        AutomatonResult {
            final_state,
            final_state_name: self.graph.name_of(final_state).to_string(),
            visited: self.context.history().to_vec(),
            is_final: self.graph.is_final(final_state),
            input,
        }
    }
}

impl std::fmt::Debug for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automaton")
            .field("states", &self.graph.len())
            .field("initial", &self.initial)
            .field("current", &self.context.current())
            .finish()
    }
}
