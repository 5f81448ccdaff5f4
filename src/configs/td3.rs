use {
    super::{
        ActorCriticConfig,
        DDPG_Config,
        OffPolicyConfig,
    },
    crate::error::{
        AgentError,
        Result,
    },
    serde::{
        Serialize,
        Deserialize,
    },
};


/// TD3 shares every DDPG hyperparameter and adds the policy delay and the
/// target smoothing noise.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TD3_Config {
    pub ddpg: DDPG_Config,
    // Number of critic updates per actor and target update.
    pub update_delay: usize,
    // Std of the target smoothing noise, as a fraction of the action bound.
    pub target_noise_sigma: f64,
    // Clip of the target smoothing noise, as a fraction of the action bound.
    pub target_noise_clip: f64,
}
impl Default for TD3_Config {
    fn default() -> Self {
        Self {
            ddpg: DDPG_Config {
                actor_learning_rate: 0.0003,
                critic_learning_rate: 0.0003,
                tau: 0.005,
                replay_buffer_capacity: 20_000,
                training_batch_size: 100,
                prioritized_replay: true,
                ..Default::default()
            },
            update_delay: 2,
            target_noise_sigma: 0.2,
            target_noise_clip: 0.5,
        }
    }
}
impl TD3_Config {
    pub fn pendulum() -> Self {
        Self {
            ddpg: DDPG_Config {
                prioritized_replay: true,
                ..DDPG_Config::pendulum()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ddpg.validate()?;
        if self.update_delay == 0 {
            return Err(AgentError::Config("The policy update delay must be at least 1".to_owned()));
        }
        if !(self.target_noise_sigma >= 0.0 && self.target_noise_clip >= 0.0) {
            return Err(AgentError::Config(format!(
                "Target noise sigma and clip must be non-negative, got {} and {}",
                self.target_noise_sigma, self.target_noise_clip,
            )));
        }
        Ok(())
    }
}

impl ActorCriticConfig for TD3_Config {
    fn actor_lr(&self) -> f64 {
        self.ddpg.actor_lr()
    }
    fn critic_lr(&self) -> f64 {
        self.ddpg.critic_lr()
    }
    fn gamma(&self) -> f64 {
        self.ddpg.gamma()
    }
    fn tau(&self) -> f64 {
        self.ddpg.tau()
    }
    fn set_actor_lr(&mut self, lr: f64) {
        self.ddpg.set_actor_lr(lr);
    }
    fn set_critic_lr(&mut self, lr: f64) {
        self.ddpg.set_critic_lr(lr);
    }
    fn set_gamma(&mut self, gamma: f64) {
        self.ddpg.set_gamma(gamma);
    }
    fn set_tau(&mut self, tau: f64) {
        self.ddpg.set_tau(tau);
    }
}

impl OffPolicyConfig for TD3_Config {
    fn replay_buffer_capacity(&self) -> usize {
        self.ddpg.replay_buffer_capacity()
    }
    fn training_batch_size(&self) -> usize {
        self.ddpg.training_batch_size()
    }
    fn prioritized_replay(&self) -> bool {
        self.ddpg.prioritized_replay()
    }
    fn set_replay_buffer_capacity(&mut self, capacity: usize) {
        self.ddpg.set_replay_buffer_capacity(capacity);
    }
    fn set_training_batch_size(&mut self, batch_size: usize) {
        self.ddpg.set_training_batch_size(batch_size);
    }
    fn set_prioritized_replay(&mut self, prioritized: bool) {
        self.ddpg.set_prioritized_replay(prioritized);
    }
}
