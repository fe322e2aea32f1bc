//! Fluent construction of named command sequences.
//!
//! An [`AlgorithmBuilder`] accumulates an ordered command list under a
//! name. Every convenience method is sugar over appending one specific
//! command kind; [`AlgorithmBuilder::command`] appends anything,
//! including custom commands.

use std::sync::Arc;

use crate::command::{Command, Target};
use crate::core::{StateGraph, StateId};
use crate::policy::HistoryPolicy;
use crate::random::RandomSource;

/// Builder for one named algorithm.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stochast::{AlgorithmBuilder, StateGraph};
/// use stochast::random::FixedSequence;
///
/// let mut graph = StateGraph::new();
/// let start = graph.add_state("start", false);
/// let goal = graph.add_state("goal", true);
///
/// AlgorithmBuilder::new("tick")
///     .clear_transitions()
///     .add_existing_state(goal, 1.0)
///     .weighted_random(Arc::new(FixedSequence::new(vec![0.5])))
///     .attach(&mut graph, start);
///
/// assert!(graph.get(start).unwrap().has_algorithm("tick"));
/// ```
#[derive(Debug)]
pub struct AlgorithmBuilder {
    name: String,
    commands: Vec<Command>,
}

impl AlgorithmBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Append an arbitrary command.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Append a clear-transitions command, typically first so each
    /// execution rebuilds the candidate set from scratch.
    pub fn clear_transitions(self) -> Self {
        self.command(Command::ClearTransitions)
    }

    /// Append a command registering a fresh (or interned) state as a
    /// weighted successor.
    pub fn add_new_state(self, name: impl Into<String>, is_final: bool, weight: f64) -> Self {
        self.command(Command::AddNewState {
            name: name.into(),
            is_final,
            weight,
        })
    }

    /// Append a command registering an already-constructed state as a
    /// weighted successor.
    pub fn add_existing_state(self, target: StateId, weight: f64) -> Self {
        self.command(Command::AddExistingState { target, weight })
    }

    /// Append a deterministic transition to the successor at `index`.
    pub fn transition_to(self, index: usize) -> Self {
        self.command(Command::Transition(Target::Index(index)))
    }

    pub fn transition_to_first(self) -> Self {
        self.command(Command::Transition(Target::First))
    }

    pub fn transition_to_last(self) -> Self {
        self.command(Command::Transition(Target::Last))
    }

    /// Append a weighted random transition drawing from `source`.
    pub fn weighted_random(self, source: Arc<dyn RandomSource>) -> Self {
        self.command(Command::WeightedRandom(source))
    }

    /// Append a history-conditioned transition.
    pub fn history_conditioned(
        self,
        policy: Arc<dyn HistoryPolicy>,
        source: Arc<dyn RandomSource>,
    ) -> Self {
        self.command(Command::HistoryConditioned { policy, source })
    }

    /// Append a caller-defined command.
    pub fn custom<F>(self, name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut StateGraph, &mut crate::core::Context, StateId) + Send + Sync + 'static,
    {
        self.command(Command::Custom {
            name: name.into(),
            run: Arc::new(run),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finish, returning the accumulated command sequence.
    pub fn build(self) -> Vec<Command> {
        self.commands
    }

    /// Finish by attaching the sequence to a state under the builder's
    /// name.
    pub fn attach(self, graph: &mut StateGraph, state: StateId) {
        graph.add_algorithm(state, self.name, self.commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FnPolicy;
    use crate::random::FixedSequence;

    #[test]
    fn fluent_methods_append_in_order() {
        let mut graph = StateGraph::new();
        let goal = graph.add_state("goal", true);

        let commands = AlgorithmBuilder::new("tick")
            .clear_transitions()
            .add_new_state("fresh", false, 0.5)
            .add_existing_state(goal, 0.5)
            .transition_to_first()
            .transition_to_last()
            .transition_to(2)
            .weighted_random(Arc::new(FixedSequence::new(vec![0.5])))
            .history_conditioned(
                Arc::new(FnPolicy::new(|_, _, c| vec![1.0; c.len()])),
                Arc::new(FixedSequence::new(vec![0.5])),
            )
            .build();

        let names: Vec<String> = commands.iter().map(Command::name).collect();
        assert_eq!(
            names,
            vec![
                "clear_transitions",
                "add_state_fresh",
                "add_existing_state_0",
                "transition_to_first",
                "transition_to_last",
                "transition_to_2",
                "weighted_random_transition",
                "history_conditioned_transition",
            ]
        );
    }

    #[test]
    fn attach_registers_under_the_builder_name() {
        let mut graph = StateGraph::new();
        let start = graph.add_state("start", false);

        let builder = AlgorithmBuilder::new("advance").clear_transitions();
        assert_eq!(builder.name(), "advance");
        assert_eq!(builder.len(), 1);

        builder.attach(&mut graph, start);
        assert!(graph.get(start).unwrap().has_algorithm("advance"));
    }

    #[test]
    fn custom_commands_get_their_given_name() {
        let commands = AlgorithmBuilder::new("tick")
            .custom("probe", |_graph, _ctx, _state| {})
            .build();

        assert_eq!(commands[0].name(), "probe");
    }
}
