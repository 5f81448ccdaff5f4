mod pendulum;

use {
    crate::error::{
        AgentError,
        Result,
    },
    rand::{
        Rng,
        RngCore,
    },
    serde::{
        Deserialize,
        Serialize,
    },
};

pub use crate::envs::pendulum::{
    PendulumConfig,
    PendulumEnv,
};

/// The action space of an environment.
///
/// Continuous spaces are boxes given by per-dimension bounds. Discrete spaces
/// with `n` choices are handled as `n`-dimensional action vectors in `[-1, 1]`
/// that the environment maps to an index with [`ActionSpace::discrete_index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionSpace {
    Continuous {
        low: Vec<f64>,
        high: Vec<f64>,
    },
    Discrete(usize),
}
impl ActionSpace {
    /// Check that the space is non-empty and the bounds are consistent.
    pub fn validate(&self) -> Result<()> {
        match self {
            ActionSpace::Continuous { low, high } => {
                if low.is_empty() || low.len() != high.len() {
                    return Err(AgentError::ShapeMismatch {
                        what: "action bounds",
                        expected: vec![low.len()],
                        actual: vec![high.len()],
                    });
                }
                if low.iter().zip(high).any(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo <= hi)) {
                    return Err(AgentError::Config(format!("Invalid action bounds {low:?} / {high:?}")));
                }
                Ok(())
            }
            ActionSpace::Discrete(0) => Err(AgentError::Config(
                "A discrete action space needs at least one choice".to_owned(),
            )),
            ActionSpace::Discrete(_) => Ok(()),
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, ActionSpace::Discrete(_))
    }

    /// The size of the action vector the agent produces.
    pub fn size(&self) -> usize {
        match self {
            ActionSpace::Continuous { low, .. } => low.len(),
            ActionSpace::Discrete(n) => *n,
        }
    }

    pub fn low(&self) -> Vec<f64> {
        match self {
            ActionSpace::Continuous { low, .. } => low.clone(),
            ActionSpace::Discrete(n) => vec![-1.0; *n],
        }
    }

    pub fn high(&self) -> Vec<f64> {
        match self {
            ActionSpace::Continuous { high, .. } => high.clone(),
            ActionSpace::Discrete(n) => vec![1.0; *n],
        }
    }

    /// Half the width of the action range per dimension, `(high - low) / 2`.
    pub fn action_bound(&self) -> Vec<f64> {
        self.low()
            .iter()
            .zip(self.high())
            .map(|(lo, hi)| (hi - lo) / 2.0)
            .collect()
    }

    /// The center of the action range per dimension, `(high + low) / 2`.
    pub fn action_shift(&self) -> Vec<f64> {
        self.low()
            .iter()
            .zip(self.high())
            .map(|(lo, hi)| (hi + lo) / 2.0)
            .collect()
    }

    /// Sample a random action vector from the space.
    pub fn sample(
        &self,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        self.low()
            .into_iter()
            .zip(self.high())
            .map(|(lo, hi)| if lo < hi { rng.gen_range(lo..hi) } else { lo })
            .collect()
    }

    /// Map a discrete action vector to the index of its largest entry.
    pub fn discrete_index(
        &self,
        action: &[f64],
    ) -> Result<usize> {
        let n = match self {
            ActionSpace::Discrete(n) => *n,
            ActionSpace::Continuous { .. } => {
                return Err(AgentError::Config("Continuous action spaces have no action index".to_owned()))
            }
        };
        if action.len() != n {
            return Err(AgentError::ShapeMismatch {
                what: "discrete action",
                expected: vec![n],
                actual: vec![action.len()],
            });
        }
        action
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(ix, _)| ix)
            .ok_or_else(|| AgentError::Config(format!("Action {action:?} has no valid entry")))
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

pub trait Environment {
    type Config;

    fn config(&self) -> &Self::Config;
    fn new(config: Self::Config) -> anyhow::Result<Box<Self>>;
    fn reset(
        &mut self,
        seed: u64,
    ) -> anyhow::Result<Vec<f64>>;
    fn step(
        &mut self,
        action: &[f64],
    ) -> anyhow::Result<Step>;
    fn timelimit(&self) -> usize;
    fn action_space(&self) -> ActionSpace;
    fn observation_space(&self) -> Vec<usize>;
    fn current_observation(&self) -> Vec<f64>;
}
