//! Commands: the units of algorithm execution.
//!
//! A command executes against the shared context and the state whose
//! algorithm is running, and acts only through side effects - mutating
//! the state's transition list, moving the context, or queuing output.
//! The config-loadable built-ins form a closed tagged set interpreted
//! by one dispatcher; [`Command::Custom`] is the open extension point
//! for caller-defined behavior that cannot be expressed declaratively.

use std::fmt;
use std::sync::Arc;

use crate::core::weights;
use crate::core::{Context, StateGraph, StateId, StateRef};
use crate::error::{EngineResult, ExecError};
use crate::events::EngineEvent;
use crate::policy::HistoryPolicy;
use crate::random::RandomSource;

/// Successor position for a deterministic transition.
///
/// `First` and `Last` tolerate successor-count changes without
/// hardcoding indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    First,
    Last,
    Index(usize),
}

/// Signature of a caller-defined command body.
pub type CommandFn = dyn Fn(&mut StateGraph, &mut Context, StateId) + Send + Sync;

/// One unit of execution inside an algorithm.
#[derive(Clone)]
pub enum Command {
    /// Empty the executing state's successor list.
    ClearTransitions,

    /// Construct a fresh state (or reuse the interned one with this
    /// name) and register it as a weighted successor.
    AddNewState {
        name: String,
        is_final: bool,
        weight: f64,
    },

    /// Register an already-constructed, possibly shared state as a
    /// weighted successor.
    AddExistingState { target: StateId, weight: f64 },

    /// Move the context to the successor at a fixed position. An
    /// out-of-range index leaves the state unchanged and reports the
    /// condition instead of failing the run.
    Transition(Target),

    /// Draw from the source and move to the successor selected by the
    /// cumulative-weight walk. With no successors the state is
    /// unchanged.
    WeightedRandom(Arc<dyn RandomSource>),

    /// Ask a history policy for candidate weights, then select exactly
    /// like a weighted random transition.
    HistoryConditioned {
        policy: Arc<dyn HistoryPolicy>,
        source: Arc<dyn RandomSource>,
    },

    /// Caller-defined command.
    Custom { name: String, run: Arc<CommandFn> },
}

impl Command {
    /// Diagnostic name, stable enough for logs and config round-trips.
    pub fn name(&self) -> String {
        match self {
            Command::ClearTransitions => "clear_transitions".to_string(),
            Command::AddNewState { name, .. } => format!("add_state_{name}"),
            Command::AddExistingState { target, .. } => {
                format!("add_existing_state_{}", target.index())
            }
            Command::Transition(Target::First) => "transition_to_first".to_string(),
            Command::Transition(Target::Last) => "transition_to_last".to_string(),
            Command::Transition(Target::Index(i)) => format!("transition_to_{i}"),
            Command::WeightedRandom(_) => "weighted_random_transition".to_string(),
            Command::HistoryConditioned { .. } => "history_conditioned_transition".to_string(),
            Command::Custom { name, .. } => name.clone(),
        }
    }

    /// Execute against the state currently running its algorithm.
    ///
    /// `current` stays the executing state for the whole command
    /// sequence, even after the context has moved on.
    pub fn execute(
        &self,
        graph: &mut StateGraph,
        ctx: &mut Context,
        current: StateId,
    ) -> EngineResult<()> {
        match self {
            Command::ClearTransitions => {
                graph.clear_successors(current);
                Ok(())
            }

            Command::AddNewState {
                name,
                is_final,
                weight,
            } => {
                let target = graph.add_state(name.clone(), *is_final);
                graph.add_successor(current, target, *weight);
                Ok(())
            }

            Command::AddExistingState { target, weight } => {
                if !graph.contains(*target) {
                    return Err(ExecError::ForeignState {
                        index: target.index(),
                    });
                }
                graph.add_successor(current, *target, *weight);
                Ok(())
            }

            Command::Transition(target) => {
                let successors = graph.successors(current);
                if successors.is_empty() {
                    ctx.sink().emit(EngineEvent::NoCandidates {
                        state: graph.name_of(current).to_string(),
                    });
                    return Ok(());
                }
                let len = successors.len();
                let index = match target {
                    Target::First => 0,
                    Target::Last => len - 1,
                    Target::Index(i) => *i,
                };
                if index >= len {
                    ctx.sink().emit(EngineEvent::IndexOutOfRange {
                        state: graph.name_of(current).to_string(),
                        index,
                        len,
                    });
                    return Ok(());
                }
                let next = successors[index].0;
                ctx.set_state(next, graph);
                Ok(())
            }

            Command::WeightedRandom(source) => {
                let successors = graph.successors(current);
                if successors.is_empty() {
                    ctx.sink().emit(EngineEvent::NoCandidates {
                        state: graph.name_of(current).to_string(),
                    });
                    return Ok(());
                }
                let raw: Vec<f64> = successors.iter().map(|(_, w)| *w).collect();
                if weights::is_degenerate(&raw) {
                    ctx.sink().emit(EngineEvent::UniformFallback {
                        state: graph.name_of(current).to_string(),
                        candidates: raw.len(),
                    });
                }
                let next = graph.select_successor(current, source.next_unit());
                ctx.set_state(next, graph);
                Ok(())
            }

            Command::HistoryConditioned { policy, source } => {
                let candidate_ids: Vec<StateId> =
                    graph.successors(current).iter().map(|(id, _)| *id).collect();
                if candidate_ids.is_empty() {
                    ctx.sink().emit(EngineEvent::NoCandidates {
                        state: graph.name_of(current).to_string(),
                    });
                    return Ok(());
                }

                let raw = {
                    let history: Vec<StateRef<'_>> =
                        ctx.history().iter().map(|id| graph.view(*id)).collect();
                    let candidates: Vec<StateRef<'_>> =
                        candidate_ids.iter().map(|id| graph.view(*id)).collect();
                    policy.compute_weights(&history, ctx.last_input(), &candidates)
                };

                if raw.len() != candidate_ids.len() {
                    return Err(ExecError::PolicyContract {
                        expected: candidate_ids.len(),
                        actual: raw.len(),
                    });
                }
                if weights::is_degenerate(&raw) {
                    ctx.sink().emit(EngineEvent::UniformFallback {
                        state: graph.name_of(current).to_string(),
                        candidates: raw.len(),
                    });
                }

                let probs = weights::normalized_or_uniform(&raw);
                let chosen = candidate_ids[weights::pick_index(&probs, source.next_unit())];
                ctx.set_state(chosen, graph);
                Ok(())
            }

            Command::Custom { run, .. } => {
                run(graph, ctx, current);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutputMessage;
    use crate::events::RecordingSink;
    use crate::policy::FnPolicy;
    use crate::random::FixedSequence;
    use serde_json::json;

    fn graph_with_fork() -> (StateGraph, StateId, StateId, StateId) {
        let mut graph = StateGraph::new();
        let hub = graph.add_state("hub", false);
        let left = graph.add_state("left", true);
        let right = graph.add_state("right", true);
        graph.add_successor(hub, left, 0.6);
        graph.add_successor(hub, right, 0.4);
        (graph, hub, left, right)
    }

    #[test]
    fn diagnostic_names() {
        assert_eq!(Command::ClearTransitions.name(), "clear_transitions");
        assert_eq!(
            Command::AddNewState {
                name: "goal".into(),
                is_final: true,
                weight: 1.0
            }
            .name(),
            "add_state_goal"
        );
        assert_eq!(Command::Transition(Target::First).name(), "transition_to_first");
        assert_eq!(Command::Transition(Target::Index(3)).name(), "transition_to_3");
    }

    #[test]
    fn clear_transitions_empties_successors() {
        let (mut graph, hub, _, _) = graph_with_fork();
        let mut ctx = Context::new(hub);

        Command::ClearTransitions
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();

        assert!(graph.successors(hub).is_empty());
    }

    #[test]
    fn add_new_state_interns_and_links() {
        let mut graph = StateGraph::new();
        let hub = graph.add_state("hub", false);
        let mut ctx = Context::new(hub);

        let command = Command::AddNewState {
            name: "goal".into(),
            is_final: true,
            weight: 0.8,
        };
        command.execute(&mut graph, &mut ctx, hub).unwrap();
        // Second execution reuses the interned state and the existing edge.
        command.execute(&mut graph, &mut ctx, hub).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.successors(hub).len(), 1);
        assert!(graph.is_final(graph.id_of("goal").unwrap()));
    }

    #[test]
    fn add_existing_state_rejects_foreign_handles() {
        let (mut graph, hub, _, _) = graph_with_fork();
        let mut other = StateGraph::new();
        for i in 0..10 {
            other.add_state(format!("s{i}"), false);
        }
        let foreign = other.id_of("s9").unwrap();
        let mut ctx = Context::new(hub);

        let err = Command::AddExistingState {
            target: foreign,
            weight: 1.0,
        }
        .execute(&mut graph, &mut ctx, hub)
        .unwrap_err();

        assert_eq!(err, ExecError::ForeignState { index: 9 });
    }

    #[test]
    fn deterministic_transition_moves_to_index() {
        let (mut graph, hub, left, right) = graph_with_fork();
        let mut ctx = Context::new(hub);

        Command::Transition(Target::First)
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();
        assert_eq!(ctx.current(), left);

        let mut ctx = Context::new(hub);
        Command::Transition(Target::Last)
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();
        assert_eq!(ctx.current(), right);
    }

    #[test]
    fn out_of_range_index_stays_and_reports() {
        let (mut graph, hub, _, _) = graph_with_fork();
        let sink = Arc::new(RecordingSink::new());
        let mut ctx = Context::with_sink(hub, sink.clone());

        Command::Transition(Target::Index(7))
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();

        assert_eq!(ctx.current(), hub);
        assert_eq!(ctx.history(), &[hub]);
        assert!(matches!(
            &sink.take()[0],
            EngineEvent::IndexOutOfRange { index: 7, len: 2, .. }
        ));
    }

    #[test]
    fn transition_with_no_successors_stays() {
        let mut graph = StateGraph::new();
        let lone = graph.add_state("lone", false);
        let sink = Arc::new(RecordingSink::new());
        let mut ctx = Context::with_sink(lone, sink.clone());

        Command::Transition(Target::First)
            .execute(&mut graph, &mut ctx, lone)
            .unwrap();

        assert_eq!(ctx.current(), lone);
        assert!(matches!(&sink.take()[0], EngineEvent::NoCandidates { .. }));
    }

    #[test]
    fn weighted_random_uses_the_injected_source() {
        let (mut graph, hub, left, right) = graph_with_fork();

        let mut ctx = Context::new(hub);
        Command::WeightedRandom(Arc::new(FixedSequence::new(vec![0.1])))
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();
        assert_eq!(ctx.current(), left);

        let mut ctx = Context::new(hub);
        Command::WeightedRandom(Arc::new(FixedSequence::new(vec![0.9])))
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();
        assert_eq!(ctx.current(), right);
    }

    #[test]
    fn weighted_random_reports_uniform_fallback() {
        let mut graph = StateGraph::new();
        let hub = graph.add_state("hub", false);
        let a = graph.add_state("a", true);
        let b = graph.add_state("b", true);
        graph.add_successor(hub, a, 0.0);
        graph.add_successor(hub, b, -1.0);

        let sink = Arc::new(RecordingSink::new());
        let mut ctx = Context::with_sink(hub, sink.clone());

        Command::WeightedRandom(Arc::new(FixedSequence::new(vec![0.75])))
            .execute(&mut graph, &mut ctx, hub)
            .unwrap();

        assert_eq!(ctx.current(), b);
        let events = sink.take();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::UniformFallback { candidates: 2, .. })));
    }

    #[test]
    fn history_conditioned_routes_by_policy() {
        let (mut graph, hub, left, right) = graph_with_fork();
        let mut ctx = Context::new(hub);

        let policy = FnPolicy::new(|_history, _input, candidates| {
            candidates
                .iter()
                .map(|c| if c.name == "right" { 1.0 } else { 0.0 })
                .collect()
        });

        Command::HistoryConditioned {
            policy: Arc::new(policy),
            source: Arc::new(FixedSequence::new(vec![0.3])),
        }
        .execute(&mut graph, &mut ctx, hub)
        .unwrap();

        assert_eq!(ctx.current(), right);
        assert_ne!(ctx.current(), left);
    }

    #[test]
    fn policy_length_mismatch_is_fatal_and_transition_free() {
        let (mut graph, hub, _, _) = graph_with_fork();
        let mut ctx = Context::new(hub);

        let bad_policy = FnPolicy::new(|_, _, _| vec![1.0]);
        let err = Command::HistoryConditioned {
            policy: Arc::new(bad_policy),
            source: Arc::new(FixedSequence::new(vec![0.5])),
        }
        .execute(&mut graph, &mut ctx, hub)
        .unwrap_err();

        assert_eq!(
            err,
            ExecError::PolicyContract {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(ctx.current(), hub);
        assert_eq!(ctx.history(), &[hub]);
    }

    #[test]
    fn custom_commands_reach_context_and_graph() {
        let mut graph = StateGraph::new();
        let hub = graph.add_state("hub", false);
        let mut ctx = Context::new(hub);

        let command = Command::Custom {
            name: "emit_entered".into(),
            run: Arc::new(|graph, ctx, current| {
                let message = OutputMessage::of("entered")
                    .with_attribute("state", json!(graph.name_of(current)));
                ctx.emit(message);
            }),
        };
        command.execute(&mut graph, &mut ctx, hub).unwrap();

        let outbox = ctx.drain_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].attribute("state"), Some(&json!("hub")));
        assert_eq!(command.name(), "emit_entered");
    }
}
