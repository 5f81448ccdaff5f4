//! # Agents
//!
//! [`Ddpg`] and [`Td3`] are thin wrappers around one shared
//! [`ActorCriticCore`]. DDPG runs it with a single critic and updates the
//! policy on every tick. TD3 runs it with twin critics, an [`UpdateCadence`]
//! that delays the policy update and [`TargetSmoothing`] on the target
//! actions.
//!
//! The networks are reached only through the [`Actor`] and [`Critic`] traits,
//! with [`MlpActor`] and [`MlpCritic`] as the default candle implementations.

mod actor_critic;
mod ddpg;
mod mlp;
mod networks;
mod td3;

pub use actor_critic::{
    bellman_targets,
    elementwise_min,
    ActionBounds,
    ActorCriticCore,
    CoreParams,
    TargetSmoothing,
    TrainOutcome,
    UpdateCadence,
};
pub use ddpg::Ddpg;
pub use mlp::{
    track,
    MlpActor,
    MlpCritic,
};
pub use networks::{
    Actor,
    Critic,
};
pub use td3::Td3;

use {
    crate::{
        components::Memory,
        envs::ActionSpace,
        error::Result,
    },
    candle_core::{
        Device,
        Tensor,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::path::Path,
    strum::Display,
};


/// The execution mode of an agent is either training or testing.
///
/// Exploration noise is only added to the actions in `Train` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum RunMode {
    Train,
    Test,
}

pub trait Algorithm {
    type Config;

    fn config(&self) -> &Self::Config;

    /// The action for a single observation, clipped to the action bounds.
    fn actions(
        &mut self,
        state: &Tensor,
    ) -> Result<Tensor>;

    /// One training tick.
    fn train(&mut self) -> Result<TrainOutcome>;

    /// Called at episode boundaries.
    fn reset_noise(&mut self) -> Result<()>;

    fn run_mode(&self) -> RunMode;
    fn set_run_mode(&mut self, mode: RunMode);
}

pub trait OffPolicyAlgorithm: Algorithm {
    fn remember(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<usize>;

    fn memory(&self) -> &Memory;
}

pub trait SaveableAlgorithm {
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()>;

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()>;
}

/// Algorithms that can build their own networks from a config.
pub trait ConfigurableAlgorithm: Algorithm {
    fn from_config(
        device: &Device,
        config: &Self::Config,
        size_state: usize,
        action_space: &ActionSpace,
    ) -> Result<Box<Self>>;
}
