use {
    super::{
        actor_critic::{
            ActorCriticCore,
            CoreParams,
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
        configs::DDPG_Config,
        envs::ActionSpace,
        error::Result,
    },
    candle_core::{
        Device,
        Tensor,
    },
    std::path::Path,
};


/// Deep Deterministic Policy Gradient.
///
/// One critic, no target smoothing, and the actor and targets are updated on
/// every training tick.
#[allow(clippy::upper_case_acronyms)]
pub struct Ddpg<A = MlpActor, C = MlpCritic> {
    config: DDPG_Config,
    core: ActorCriticCore<A, C>,
}

impl<A: Actor, C: Critic> Ddpg<A, C> {
    pub fn new(
        config: DDPG_Config,
        size_state: usize,
        action_space: &ActionSpace,
        actor: A,
        critic: C,
        device: &Device,
    ) -> Result<Self> {
        config.validate()?;
        action_space.validate()?;

        let memory = Memory::new(
            config.replay_buffer_capacity,
            config.prioritized_replay,
            config.priority_epsilon,
        )?;
        let noise = OuNoise::new(
            config.ou_mu,
            config.ou_theta,
            config.ou_sigma,
            config.ou_dt,
            action_space.size(),
            device,
        )?;
        let core = ActorCriticCore::new(
            actor,
            vec![critic],
            memory,
            noise,
            size_state,
            action_space,
            CoreParams {
                gamma: config.gamma,
                tau: config.tau,
                batch_size: config.training_batch_size,
            },
            UpdateCadence::every_tick(),
            None,
            device,
        )?;
        Ok(Self { config, core })
    }

    pub fn actor(&self) -> &A {
        self.core.actor()
    }

    pub fn critic(&self) -> &C {
        &self.core.critics()[0]
    }

    pub fn core(&self) -> &ActorCriticCore<A, C> {
        &self.core
    }
}

impl<A: Actor, C: Critic> Algorithm for Ddpg<A, C> {
    type Config = DDPG_Config;

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

impl<A: Actor, C: Critic> OffPolicyAlgorithm for Ddpg<A, C> {
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

impl<A: Actor, C: Critic> SaveableAlgorithm for Ddpg<A, C> {
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

impl ConfigurableAlgorithm for Ddpg<MlpActor, MlpCritic> {
    fn from_config(
        device: &Device,
        config: &DDPG_Config,
        size_state: usize,
        action_space: &ActionSpace,
    ) -> Result<Box<Self>> {
        config.validate()?;
        action_space.validate()?;
        let size_action = action_space.size();

        let actor = MlpActor::new(
            device,
            size_state,
            size_action,
            config.hidden_1_size,
            config.hidden_2_size,
            config.actor_learning_rate,
            &action_space.action_bound(),
            &action_space.action_shift(),
        )?;
        let critic = MlpCritic::new(
            device,
            size_state,
            size_action,
            config.hidden_1_size,
            config.hidden_2_size,
            config.critic_learning_rate,
        )?;
        Ok(Box::new(Self::new(config.clone(), size_state, action_space, actor, critic, device)?))
    }
}
