//! History-conditioned transition policies.
//!
//! A [`HistoryPolicy`] turns the full visit history and the current
//! input into unnormalized weights over the candidate successors. The
//! history-conditioned transition command normalizes and selects from
//! those weights exactly like ordinary weighted transitions, so a
//! policy only ever reasons about *relative* likelihood.

use crate::core::{InputMessage, StateRef};

/// Strategy producing unnormalized weights for candidate successors.
///
/// The returned vector must have exactly one entry per candidate;
/// anything else is a contract violation that fails the current step.
/// Values need not be normalized and may be zero or negative (negative
/// counts as zero at selection time).
pub trait HistoryPolicy: Send + Sync {
    /// Compute weights for `candidates`, given the chronological visit
    /// `history` (oldest first, ending with the current state) and the
    /// input being processed, if any.
    fn compute_weights(
        &self,
        history: &[StateRef<'_>],
        input: Option<&InputMessage>,
        candidates: &[StateRef<'_>],
    ) -> Vec<f64>;
}

/// Policy wrapping a plain function.
///
/// # Example
///
/// ```rust
/// use stochast::policy::FnPolicy;
///
/// // Prefer final states twice as much as non-final ones.
/// let policy = FnPolicy::new(|_history, _input, candidates| {
///     candidates
///         .iter()
///         .map(|c| if c.is_final { 2.0 } else { 1.0 })
///         .collect()
/// });
/// ```
pub struct FnPolicy {
    #[allow(clippy::type_complexity)]
    compute: Box<
        dyn Fn(&[StateRef<'_>], Option<&InputMessage>, &[StateRef<'_>]) -> Vec<f64> + Send + Sync,
    >,
}

impl FnPolicy {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&[StateRef<'_>], Option<&InputMessage>, &[StateRef<'_>]) -> Vec<f64>
            + Send
            + Sync
            + 'static,
    {
        Self {
            compute: Box::new(compute),
        }
    }
}

impl HistoryPolicy for FnPolicy {
    fn compute_weights(
        &self,
        history: &[StateRef<'_>],
        input: Option<&InputMessage>,
        candidates: &[StateRef<'_>],
    ) -> Vec<f64> {
        (self.compute)(history, input, candidates)
    }
}

impl std::fmt::Debug for FnPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnPolicy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateGraph;

    #[test]
    fn fn_policy_forwards_to_the_closure() {
        let mut graph = StateGraph::new();
        let a = graph.add_state("a", false);
        let b = graph.add_state("b", true);

        let policy = FnPolicy::new(|history, _input, candidates| {
            assert_eq!(history.len(), 1);
            candidates
                .iter()
                .map(|c| if c.is_final { 1.0 } else { 0.0 })
                .collect()
        });

        let history = [graph.view(a)];
        let candidates = [graph.view(a), graph.view(b)];
        let weights = policy.compute_weights(&history, None, &candidates);

        assert_eq!(weights, vec![0.0, 1.0]);
    }

    #[test]
    fn policies_can_inspect_the_input() {
        let mut graph = StateGraph::new();
        let a = graph.add_state("a", false);

        let policy = FnPolicy::new(|_history, input, candidates| {
            let boost = input.map(|m| m.raw() == "boost").unwrap_or(false);
            candidates
                .iter()
                .map(|_| if boost { 10.0 } else { 1.0 })
                .collect()
        });

        let candidates = [graph.view(a)];
        let message = InputMessage::of("boost");

        assert_eq!(
            policy.compute_weights(&[], Some(&message), &candidates),
            vec![10.0]
        );
        assert_eq!(policy.compute_weights(&[], None, &candidates), vec![1.0]);
    }
}
