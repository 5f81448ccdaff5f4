use {
    crate::agents::RunMode,
    serde::{
        Serialize,
        Deserialize,
    },
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    // The total number of episodes.
    max_episodes: usize,
    // The number of training iterations after one episode finishes.
    training_iterations: usize,
    // Number of random actions to take at very beginning of training.
    initial_random_actions: usize,
    // Whether the agent explores and trains, or only acts.
    run_mode: RunMode,
}
impl TrainConfig {
    pub fn new(
        max_episodes: usize,
        training_iterations: usize,
        initial_random_actions: usize,
        run_mode: RunMode,
    ) -> Self {
        Self {
            max_episodes,
            training_iterations,
            initial_random_actions,
            run_mode,
        }
    }

    pub fn pendulum() -> Self {
        Self {
            max_episodes: 30,
            training_iterations: 200,
            initial_random_actions: 0,
            run_mode: RunMode::Train,
        }
    }
}

impl TrainConfig {
    pub fn max_episodes(&self) -> usize {
        self.max_episodes
    }
    pub fn training_iterations(&self) -> usize {
        self.training_iterations
    }
    pub fn initial_random_actions(&self) -> usize {
        self.initial_random_actions
    }
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }
    pub fn set_max_episodes(&mut self, max_episodes: usize) {
        self.max_episodes = max_episodes;
    }
    pub fn set_training_iterations(&mut self, training_iterations: usize) {
        self.training_iterations = training_iterations;
    }
    pub fn set_initial_random_actions(&mut self, initial_random_actions: usize) {
        self.initial_random_actions = initial_random_actions;
    }
    pub fn set_run_mode(&mut self, run_mode: RunMode) {
        self.run_mode = run_mode;
    }
}
