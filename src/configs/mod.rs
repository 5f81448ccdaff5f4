mod ddpg;
mod td3;
mod train;

pub use ddpg::DDPG_Config;
pub use td3::TD3_Config;
pub use train::TrainConfig;


pub trait ActorCriticConfig {
    fn actor_lr(&self) -> f64;
    fn critic_lr(&self) -> f64;
    fn gamma(&self) -> f64;
    fn tau(&self) -> f64;
    fn set_actor_lr(&mut self, lr: f64);
    fn set_critic_lr(&mut self, lr: f64);
    fn set_gamma(&mut self, gamma: f64);
    fn set_tau(&mut self, tau: f64);
}

pub trait OffPolicyConfig {
    fn replay_buffer_capacity(&self) -> usize;
    fn training_batch_size(&self) -> usize;
    fn prioritized_replay(&self) -> bool;
    fn set_replay_buffer_capacity(&mut self, capacity: usize);
    fn set_training_batch_size(&mut self, batch_size: usize);
    fn set_prioritized_replay(&mut self, prioritized: bool);
}
