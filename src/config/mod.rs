//! Declarative automaton configuration.
//!
//! Translates a JSON description of states, algorithms and commands
//! into the same builder calls a programmatic caller would make.
//! Loading is eager and fails fast: unknown state references, missing
//! required fields and unsupported command types abort construction,
//! never producing a partially wired automaton.
//!
//! History-conditioned transitions cannot be expressed declaratively -
//! policies are code - and are attached programmatically after loading
//! when needed.

pub mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::automaton::Automaton;
use crate::builder::AlgorithmBuilder;
use crate::core::StateGraph;
use crate::random::{DistributionSource, RandomSource, SampleMode, SystemRandom};
use statrs::distribution::{Beta, Exp, Gamma, Normal};

/// Root configuration object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomatonConfig {
    #[serde(rename = "initialState")]
    pub initial_state: String,
    pub states: Vec<StateConfig>,
}

/// One state and its algorithms.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub name: String,
    #[serde(rename = "finalState", default)]
    pub final_state: bool,
    #[serde(default)]
    pub algorithms: BTreeMap<String, Vec<CommandConfig>>,
}

/// Supported declarative command types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    ClearNextStates,
    AddState,
    Transition,
    ProbabilisticTransition,
}

/// One command inside an algorithm.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    #[serde(rename = "type")]
    pub kind: CommandKind,

    /// State name for `add_state`; `"first"`/`"last"` or an index for
    /// `transition`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Accepted for schema compatibility; finality comes from the
    /// state's own declaration.
    #[serde(rename = "finalState", default, skip_serializing_if = "Option::is_none")]
    pub final_state: Option<bool>,

    /// Weight for `add_state`. Defaults to 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,

    /// Random source for `probabilistic_transition`. Defaults to the
    /// system PRNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random: Option<RandomConfig>,
}

/// Supported distribution families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Uniform,
    Normal,
    Beta,
    Exponential,
    Gamma,
}

/// Declarative description of a random source.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomConfig {
    #[serde(rename = "type")]
    pub kind: DistributionKind,
    #[serde(default)]
    pub mode: SampleMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Load an automaton from a JSON string.
pub fn from_json_str(text: &str) -> Result<Automaton, ConfigError> {
    let config: AutomatonConfig = serde_json::from_str(text)?;
    build(config)
}

/// Load an automaton from a reader producing JSON.
pub fn from_reader(reader: impl std::io::Read) -> Result<Automaton, ConfigError> {
    let config: AutomatonConfig = serde_json::from_reader(reader)?;
    build(config)
}

/// Load an automaton from an already-parsed JSON value.
pub fn from_value(value: serde_json::Value) -> Result<Automaton, ConfigError> {
    let config: AutomatonConfig = serde_json::from_value(value)?;
    build(config)
}

/// Translate a parsed configuration into an automaton.
pub fn build(config: AutomatonConfig) -> Result<Automaton, ConfigError> {
    if config.states.is_empty() {
        return Err(ConfigError::NoStates);
    }

    // All states are interned up front so transitions can reference
    // any of them by name, regardless of declaration order.
    let mut graph = StateGraph::new();
    for state in &config.states {
        if graph.id_of(&state.name).is_some() {
            return Err(ConfigError::DuplicateState(state.name.clone()));
        }
        graph.add_state(state.name.clone(), state.final_state);
    }

    for state in &config.states {
        let id = graph.id_of(&state.name).expect("state interned above");
        for (algorithm, commands) in &state.algorithms {
            let mut builder = AlgorithmBuilder::new(algorithm.clone());
            for command in commands {
                builder = translate(builder, &graph, algorithm, command)?;
            }
            builder.attach(&mut graph, id);
        }
    }

    let initial = graph
        .id_of(&config.initial_state)
        .ok_or_else(|| ConfigError::UnknownInitialState(config.initial_state.clone()))?;

    Ok(Automaton::new(graph, initial))
}

fn translate(
    builder: AlgorithmBuilder,
    graph: &StateGraph,
    algorithm: &str,
    config: &CommandConfig,
) -> Result<AlgorithmBuilder, ConfigError> {
    match config.kind {
        CommandKind::ClearNextStates => Ok(builder.clear_transitions()),

        CommandKind::AddState => {
            let target_name =
                config
                    .target
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingField {
                        field: "target",
                        command: "add_state",
                        algorithm: algorithm.to_string(),
                    })?;
            let target = graph
                .id_of(target_name)
                .ok_or_else(|| ConfigError::UnknownState {
                    target: target_name.to_string(),
                    command: "add_state",
                    algorithm: algorithm.to_string(),
                })?;
            Ok(builder.add_existing_state(target, config.probability.unwrap_or(1.0)))
        }

        CommandKind::Transition => {
            let target = config
                .target
                .as_deref()
                .ok_or_else(|| ConfigError::MissingField {
                    field: "target",
                    command: "transition",
                    algorithm: algorithm.to_string(),
                })?;
            match target {
                "first" => Ok(builder.transition_to_first()),
                "last" => Ok(builder.transition_to_last()),
                other => {
                    let index: usize = other
                        .parse()
                        .map_err(|_| ConfigError::InvalidIndex(other.to_string()))?;
                    Ok(builder.transition_to(index))
                }
            }
        }

        CommandKind::ProbabilisticTransition => {
            Ok(builder.weighted_random(random_source(config.random.as_ref())?))
        }
    }
}

/// Build a random source from its declarative description.
///
/// `None` and `uniform` both map to the system PRNG. Distribution
/// parameters default to the values of the original schema: normal
/// `mean 0, sd 1`; beta `alpha 2, beta 5`; exponential `lambda 1`
/// (or `mean` when given); gamma `shape 2, scale 1`.
pub fn random_source(config: Option<&RandomConfig>) -> Result<Arc<dyn RandomSource>, ConfigError> {
    let Some(config) = config else {
        return Ok(Arc::new(SystemRandom::new()));
    };
    let mode = config.mode;

    match config.kind {
        DistributionKind::Uniform => Ok(Arc::new(SystemRandom::new())),

        DistributionKind::Normal => {
            let distribution = Normal::new(config.mean.unwrap_or(0.0), config.sd.unwrap_or(1.0))
                .map_err(|e| ConfigError::Distribution(e.to_string()))?;
            Ok(Arc::new(DistributionSource::new(distribution, mode)))
        }

        DistributionKind::Beta => {
            let distribution = Beta::new(config.alpha.unwrap_or(2.0), config.beta.unwrap_or(5.0))
                .map_err(|e| ConfigError::Distribution(e.to_string()))?;
            Ok(Arc::new(DistributionSource::new(distribution, mode)))
        }

        DistributionKind::Exponential => {
            let rate = match (config.mean, config.lambda) {
                (Some(mean), _) => 1.0 / mean,
                (None, lambda) => lambda.unwrap_or(1.0),
            };
            let distribution =
                Exp::new(rate).map_err(|e| ConfigError::Distribution(e.to_string()))?;
            Ok(Arc::new(DistributionSource::new(distribution, mode)))
        }

        DistributionKind::Gamma => {
            let shape = config.shape.unwrap_or(2.0);
            let scale = config.scale.unwrap_or(1.0);
            let distribution = Gamma::new(shape, 1.0 / scale)
                .map_err(|e| ConfigError::Distribution(e.to_string()))?;
            Ok(Arc::new(DistributionSource::new(distribution, mode)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_random(kind: &str) -> RandomConfig {
        serde_json::from_value(json!({ "type": kind })).unwrap()
    }

    #[test]
    fn absent_random_config_is_the_system_prng() {
        assert!(random_source(None).is_ok());
    }

    #[test]
    fn every_distribution_kind_builds_with_defaults() {
        for kind in ["uniform", "normal", "beta", "exponential", "gamma"] {
            let config = minimal_random(kind);
            let source = random_source(Some(&config)).unwrap();
            let u = source.next_unit();
            assert!((0.0..1.0).contains(&u), "{kind} produced {u}");
        }
    }

    #[test]
    fn exponential_mean_takes_precedence_over_lambda() {
        let config: RandomConfig = serde_json::from_value(json!({
            "type": "exponential",
            "mean": 2.0,
            "lambda": 100.0,
        }))
        .unwrap();
        assert!(random_source(Some(&config)).is_ok());
    }

    #[test]
    fn invalid_distribution_parameters_fail_fast() {
        let config: RandomConfig = serde_json::from_value(json!({
            "type": "normal",
            "sd": -1.0,
        }))
        .unwrap();
        assert!(matches!(
            random_source(Some(&config)),
            Err(ConfigError::Distribution(_))
        ));
    }

    #[test]
    fn mode_defaults_to_cdf() {
        let config = minimal_random("normal");
        assert_eq!(config.mode, SampleMode::Cdf);

        let sigmoid: RandomConfig =
            serde_json::from_value(json!({ "type": "normal", "mode": "sigmoid" })).unwrap();
        assert_eq!(sigmoid.mode, SampleMode::Sigmoid);
    }

    #[test]
    fn unknown_command_type_is_rejected_at_parse_time() {
        let result: Result<CommandConfig, _> =
            serde_json::from_value(json!({ "type": "teleport" }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<AutomatonConfig, _> = serde_json::from_value(json!({
            "initialState": "a",
            "states": [],
            "surprise": true,
        }));
        assert!(result.is_err());
    }
}
