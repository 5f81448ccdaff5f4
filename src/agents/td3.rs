use {
    super::{
        actor_critic::{
            ActorCriticCore,
            CoreParams,
            TargetSmoothing,
            TrainOutcome,
            UpdateCadence,
        },
        Actor,
        Algorithm,
        ConfigurableAlgorithm,
        Critic,
        MlpActor,
        MlpCritic,
        OffPolicyAlgorithm,
        RunMode,
        SaveableAlgorithm,
    },
    crate::{
        components::{
            Memory,
            OuNoise,
        },
        configs::TD3_Config,
        envs::ActionSpace,
        error::Result,
    },
    candle_core::{
        Device,
        Tensor,
    },
    std::path::Path,
};


/// Twin Delayed Deep Deterministic Policy Gradient.
///
/// Compared to [`super::Ddpg`]:
///
/// - Two critics are trained on the same targets, and the targets bootstrap
///   from the smaller of their two estimates.
/// - The actor and all target networks are only updated every
///   `update_delay` training ticks.
/// - The target actions get clipped Gaussian noise before they are evaluated.
pub struct Td3<A = MlpActor, C = MlpCritic> {
    config: TD3_Config,
    core: ActorCriticCore<A, C>,
}

impl<A: Actor, C: Critic> Td3<A, C> {
    pub fn new(
        config: TD3_Config,
        size_state: usize,
        action_space: &ActionSpace,
        actor: A,
        critics: [C; 2],
        device: &Device,
    ) -> Result<Self> {
        config.validate()?;
        action_space.validate()?;
        let ddpg = &config.ddpg;

        let memory = Memory::new(
            ddpg.replay_buffer_capacity,
            ddpg.prioritized_replay,
            ddpg.priority_epsilon,
        )?;
        let noise = OuNoise::new(
            ddpg.ou_mu,
            ddpg.ou_theta,
            ddpg.ou_sigma,
            ddpg.ou_dt,
            action_space.size(),
            device,
        )?;
        let core = ActorCriticCore::new(
            actor,
            Vec::from(critics),
            memory,
            noise,
            size_state,
            action_space,
            CoreParams {
                gamma: ddpg.gamma,
                tau: ddpg.tau,
                batch_size: ddpg.training_batch_size,
            },
            UpdateCadence::new(config.update_delay)?,
            Some(TargetSmoothing::new(config.target_noise_sigma, config.target_noise_clip)?),
            device,
        )?;
        Ok(Self { config, core })
    }

    pub fn actor(&self) -> &A {
        self.core.actor()
    }

    pub fn critics(&self) -> &[C] {
        self.core.critics()
    }

    /// The number of training ticks that got past the buffer check.
    pub fn update_step(&self) -> usize {
        self.core.cadence().step()
    }

    pub fn core(&self) -> &ActorCriticCore<A, C> {
        &self.core
    }
}

impl<A: Actor, C: Critic> Algorithm for Td3<A, C> {
    type Config = TD3_Config;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn actions(
        &mut self,
        state: &Tensor,
    ) -> Result<Tensor> {
        self.core.actions(state)
    }

    fn train(&mut self) -> Result<TrainOutcome> {
        self.core.train()
    }

    fn reset_noise(&mut self) -> Result<()> {
        self.core.reset_noise()
    }

    fn run_mode(&self) -> RunMode {
        self.core.run_mode()
    }

    fn set_run_mode(&mut self, mode: RunMode) {
        self.core.set_run_mode(mode);
    }
}

impl<A: Actor, C: Critic> OffPolicyAlgorithm for Td3<A, C> {
    fn remember(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<usize> {
        self.core.remember(state, action, reward, next_state, done)
    }

    fn memory(&self) -> &Memory {
        self.core.memory()
    }
}

impl<A: Actor, C: Critic> SaveableAlgorithm for Td3<A, C> {
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        self.core.save(path, name)
    }

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        self.core.load(path, name)
    }
}

impl ConfigurableAlgorithm for Td3<MlpActor, MlpCritic> {
    fn from_config(
        device: &Device,
        config: &TD3_Config,
        size_state: usize,
        action_space: &ActionSpace,
    ) -> Result<Box<Self>> {
        config.validate()?;
        action_space.validate()?;
        let ddpg = &config.ddpg;
        let size_action = action_space.size();

        let actor = MlpActor::new(
            device,
            size_state,
            size_action,
            ddpg.hidden_1_size,
            ddpg.hidden_2_size,
            ddpg.actor_learning_rate,
            &action_space.action_bound(),
            &action_space.action_shift(),
        )?;
        let make_critic = || {
            MlpCritic::new(
                device,
                size_state,
                size_action,
                ddpg.hidden_1_size,
                ddpg.hidden_2_size,
                ddpg.critic_learning_rate,
            )
        };
        let critics = [make_critic()?, make_critic()?];
        Ok(Box::new(Self::new(config.clone(), size_state, action_space, actor, critics, device)?))
    }
}
