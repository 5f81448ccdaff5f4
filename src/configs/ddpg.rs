use {
    super::{
        ActorCriticConfig,
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


#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DDPG_Config {
    // The learning rates for the Actor and Critic networks
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    // The impact of the q value of the next state on the current state's q value.
    pub gamma: f64,
    // The weight for updating the target networks.
    pub tau: f64,
    // The number of neurons in the hidden layers of the Actor and Critic networks.
    pub hidden_1_size: usize,
    pub hidden_2_size: usize,
    // The capacity of the replay buffer used for sampling training data.
    pub replay_buffer_capacity: usize,
    // The training batch size for each training iteration.
    pub training_batch_size: usize,
    // Ornstein-Uhlenbeck process parameters.
    pub ou_mu: f64,
    pub ou_theta: f64,
    pub ou_sigma: f64,
    pub ou_dt: f64,
    // Sample proportionally to the TD error instead of uniformly.
    pub prioritized_replay: bool,
    // Added to every stored priority so no transition becomes unreachable.
    pub priority_epsilon: f64,
}
impl Default for DDPG_Config {
    fn default() -> Self {
        Self {
            actor_learning_rate: 0.001,
            critic_learning_rate: 0.01,
            gamma: 0.99,
            tau: 0.01,
            hidden_1_size: 256,
            hidden_2_size: 256,
            replay_buffer_capacity: 10_000,
            training_batch_size: 64,
            ou_mu: 0.0,
            ou_theta: 0.15,
            ou_sigma: 0.2,
            ou_dt: 0.01,
            prioritized_replay: false,
            priority_epsilon: 1e-6,
        }
    }
}
impl DDPG_Config {
    pub fn pendulum() -> Self {
        Self {
            actor_learning_rate: 0.0003,
            critic_learning_rate: 0.0003,
            tau: 0.005,
            replay_buffer_capacity: 100_000,
            training_batch_size: 128,
            ..Default::default()
        }
    }

    /// Reject hyperparameters no agent can be built with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(AgentError::Config(msg)) };
        if !(self.actor_learning_rate > 0.0 && self.critic_learning_rate > 0.0) {
            return fail(format!(
                "Learning rates must be positive, got {} and {}",
                self.actor_learning_rate, self.critic_learning_rate,
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return fail(format!("Gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return fail(format!("Tau must be in [0, 1], got {}", self.tau));
        }
        if self.hidden_1_size == 0 || self.hidden_2_size == 0 {
            return fail("Hidden layers need at least one neuron".to_owned());
        }
        if self.replay_buffer_capacity == 0 {
            return fail("The replay buffer capacity must be positive".to_owned());
        }
        if self.training_batch_size == 0 {
            return fail("The training batch size must be positive".to_owned());
        }
        if !(self.ou_dt.is_finite() && self.ou_dt > 0.0) {
            return fail(format!("The OU time step must be positive, got {}", self.ou_dt));
        }
        if !(self.priority_epsilon.is_finite() && self.priority_epsilon >= 0.0) {
            return fail(format!("The priority epsilon must be non-negative, got {}", self.priority_epsilon));
        }
        Ok(())
    }
}

impl ActorCriticConfig for DDPG_Config {
    fn actor_lr(&self) -> f64 {
        self.actor_learning_rate
    }
    fn critic_lr(&self) -> f64 {
        self.critic_learning_rate
    }
    fn gamma(&self) -> f64 {
        self.gamma
    }
    fn tau(&self) -> f64 {
        self.tau
    }
    fn set_actor_lr(&mut self, lr: f64) {
        self.actor_learning_rate = lr;
    }
    fn set_critic_lr(&mut self, lr: f64) {
        self.critic_learning_rate = lr;
    }
    fn set_gamma(&mut self, gamma: f64) {
        self.gamma = gamma;
    }
    fn set_tau(&mut self, tau: f64) {
        self.tau = tau;
    }
}

impl OffPolicyConfig for DDPG_Config {
    fn replay_buffer_capacity(&self) -> usize {
        self.replay_buffer_capacity
    }
    fn training_batch_size(&self) -> usize {
        self.training_batch_size
    }
    fn prioritized_replay(&self) -> bool {
        self.prioritized_replay
    }
    fn set_replay_buffer_capacity(&mut self, capacity: usize) {
        self.replay_buffer_capacity = capacity;
    }
    fn set_training_batch_size(&mut self, batch_size: usize) {
        self.training_batch_size = batch_size;
    }
    fn set_prioritized_replay(&mut self, prioritized: bool) {
        self.prioritized_replay = prioritized;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DDPG_Config::default().validate().is_ok());
        assert!(DDPG_Config::pendulum().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = DDPG_Config { tau: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(AgentError::Config(_))));

        let config = DDPG_Config { training_batch_size: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = DDPG_Config { ou_dt: 0.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ron_round_trip() -> anyhow::Result<()> {
        let config = DDPG_Config { prioritized_replay: true, ..Default::default() };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())?;
        assert_eq!(ron::from_str::<DDPG_Config>(&text)?, config);
        Ok(())
    }
}
