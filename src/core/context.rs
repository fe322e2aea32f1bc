//! Per-automaton mutable execution state.
//!
//! The [`Context`] tracks where one automaton currently is and
//! everything it has seen: the distinct states visited, the full
//! chronological history, the last input message, a free-form working
//! memory for commands to pass data between steps, and the outbox of
//! output events drained by the caller.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::core::message::{InputMessage, OutputMessage};
use crate::core::state::{StateGraph, StateId};
use crate::events::{EngineEvent, EventSink, TracingSink};

/// Execution context of a single automaton instance.
///
/// The context borrows states from the automaton's graph by handle; it
/// never owns them. One logical caller drives one context at a time.
pub struct Context {
    current: StateId,
    known: HashSet<StateId>,
    history: Vec<StateId>,
    last_input: Option<InputMessage>,
    memory: HashMap<String, Value>,
    outbox: Vec<OutputMessage>,
    sink: Arc<dyn EventSink>,
}

impl Context {
    /// Create a context positioned at `initial`, reporting diagnostics
    /// to `tracing`.
    pub fn new(initial: StateId) -> Self {
        Self::with_sink(initial, Arc::new(TracingSink))
    }

    /// Create a context with an explicit diagnostic sink.
    pub fn with_sink(initial: StateId, sink: Arc<dyn EventSink>) -> Self {
        Self {
            current: initial,
            known: HashSet::from([initial]),
            history: vec![initial],
            last_input: None,
            memory: HashMap::new(),
            outbox: Vec::new(),
            sink,
        }
    }

    /// Reinitialize to `initial`: history restarts at the initial
    /// state, and input, memory and outbox are cleared. The diagnostic
    /// sink is kept.
    pub fn reset(&mut self, initial: StateId) {
        self.current = initial;
        self.known.clear();
        self.known.insert(initial);
        self.history.clear();
        self.history.push(initial);
        self.last_input = None;
        self.memory.clear();
        self.outbox.clear();
    }

    /// Move to `to`. A no-op when `to` is already the current state;
    /// otherwise the transition is recorded in the known set, the
    /// history, and the diagnostic stream.
    pub fn set_state(&mut self, to: StateId, graph: &StateGraph) {
        if to == self.current {
            return;
        }
        debug!(
            from = graph.name_of(self.current),
            to = graph.name_of(to),
            "context_transition"
        );
        self.sink.emit(EngineEvent::Transition {
            from: graph.name_of(self.current).to_string(),
            to: graph.name_of(to).to_string(),
            at: chrono::Utc::now(),
        });
        self.current = to;
        self.known.insert(to);
        self.history.push(to);
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    /// Chronological visit history, oldest first, starting with the
    /// initial state and including repeats.
    pub fn history(&self) -> &[StateId] {
        &self.history
    }

    /// Distinct states seen since the last reset. Insertion order is
    /// not tracked.
    pub fn known_states(&self) -> &HashSet<StateId> {
        &self.known
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        self.known.contains(&id)
    }

    pub fn set_input(&mut self, message: InputMessage) {
        self.last_input = Some(message);
    }

    /// The last message handed to an executing algorithm, if any.
    pub fn last_input(&self) -> Option<&InputMessage> {
        self.last_input.as_ref()
    }

    /// Store a value in working memory.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.memory.insert(key.into(), value);
    }

    /// Read a value from working memory.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.memory.get(key)
    }

    pub fn memory(&self) -> &HashMap<String, Value> {
        &self.memory
    }

    /// Queue an output message for the caller.
    pub fn emit(&mut self, message: OutputMessage) {
        self.outbox.push(message);
    }

    /// Return and clear all output queued since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<OutputMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// The diagnostic sink, for commands reporting fallbacks.
    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    pub(crate) fn set_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = sink;
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("current", &self.current)
            .field("known", &self.known.len())
            .field("history", &self.history.len())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}
