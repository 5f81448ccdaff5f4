#![allow(dead_code)]

use {
    anyhow::ensure,
    candle_core::{
        Device,
        Tensor,
    },
    serde::Serialize,
    std::{
        cell::Cell,
        path::Path,
    },
    td3_rl::{
        agents::{
            Actor,
            Critic,
        },
        envs::{
            ActionSpace,
            Environment,
            Step,
        },
        Result,
    },
};

pub fn tensor(values: &[f64]) -> Tensor {
    Tensor::new(values, &Device::Cpu).expect("cpu tensor")
}

/// An actor that always outputs the same action and counts its updates.
pub struct MockActor {
    pub action: f64,
    pub size_action: usize,
    pub predictions: Cell<usize>,
    pub trains: usize,
    pub target_updates: usize,
}
impl MockActor {
    pub fn new(action: f64, size_action: usize) -> Self {
        Self {
            action,
            size_action,
            predictions: Cell::new(0),
            trains: 0,
            target_updates: 0,
        }
    }

    fn constant(&self, states: &Tensor) -> Result<Tensor> {
        Ok(Tensor::full(self.action, (states.dim(0)?, self.size_action), states.device())?)
    }
}
impl Actor for MockActor {
    fn predict(&self, states: &Tensor) -> Result<Tensor> {
        self.predictions.set(self.predictions.get() + 1);
        self.constant(states)
    }

    fn target_predict(&self, states: &Tensor) -> Result<Tensor> {
        self.constant(states)
    }

    fn train(&mut self, _states: &Tensor, _critic: &dyn Critic) -> Result<()> {
        self.trains += 1;
        Ok(())
    }

    fn target_update(&mut self, _tau: f64) -> Result<()> {
        self.target_updates += 1;
        Ok(())
    }

    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// A critic with constant online and target values that records the targets
/// it was trained towards.
pub struct MockCritic {
    pub value: f64,
    pub target_value: f64,
    pub trains: usize,
    pub target_updates: usize,
    pub targets: Vec<Vec<f64>>,
}
impl MockCritic {
    pub fn new(value: f64, target_value: f64) -> Self {
        Self {
            value,
            target_value,
            trains: 0,
            target_updates: 0,
            targets: Vec::new(),
        }
    }
}
impl Critic for MockCritic {
    fn predict(&self, states: &Tensor, _actions: &Tensor) -> Result<Tensor> {
        Ok(Tensor::full(self.value, (states.dim(0)?, 1), states.device())?)
    }

    fn target_predict(&self, states: &Tensor, _actions: &Tensor) -> Result<Tensor> {
        Ok(Tensor::full(self.target_value, (states.dim(0)?, 1), states.device())?)
    }

    fn train(&mut self, _states: &Tensor, _actions: &Tensor, targets: &Tensor) -> Result<()> {
        self.trains += 1;
        self.targets.push(targets.flatten_all()?.to_vec1::<f64>()?);
        Ok(())
    }

    fn target_update(&mut self, _tau: f64) -> Result<()> {
        self.target_updates += 1;
        Ok(())
    }

    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StubConfig {
    pub episode_length: usize,
}

/// A 2-D observation, 1-D action environment that terminates after a fixed
/// number of steps. The reward is the negative absolute action.
pub struct StubEnv {
    config: StubConfig,
    position: [f64; 2],
    steps: usize,
}
impl Environment for StubEnv {
    type Config = StubConfig;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn new(config: StubConfig) -> anyhow::Result<Box<Self>> {
        ensure!(config.episode_length > 0, "episodes need at least one step");
        Ok(Box::new(Self {
            config,
            position: [0.0, 0.0],
            steps: 0,
        }))
    }

    fn reset(&mut self, _seed: u64) -> anyhow::Result<Vec<f64>> {
        self.position = [0.0, 0.0];
        self.steps = 0;
        Ok(self.current_observation())
    }

    fn step(&mut self, action: &[f64]) -> anyhow::Result<Step> {
        ensure!(action.len() == 1, "expected one action value");
        self.position[0] += action[0];
        self.position[1] += 1.0;
        self.steps += 1;
        Ok(Step {
            observation: self.current_observation(),
            reward: -action[0].abs(),
            terminated: self.steps >= self.config.episode_length,
            truncated: false,
        })
    }

    fn timelimit(&self) -> usize {
        self.config.episode_length
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Continuous { low: vec![-1.0], high: vec![1.0] }
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![2]
    }

    fn current_observation(&self) -> Vec<f64> {
        self.position.to_vec()
    }
}
