use {
    super::{
        ActionSpace,
        Environment,
        Step,
    },
    anyhow::{
        ensure,
        Result,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::f64::consts::PI,
};

fn angle_normalize(x: f64) -> f64 {
    ((x + PI).rem_euclid(2.0 * PI)) - PI
}

/// The configuration struct for the Pendulum environment
///
/// The defaults are the constants of the Gymnasium Pendulum-v1 environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendulumConfig {
    pub max_speed: f64,
    pub max_torque: f64,
    pub dt: f64,
    pub gravity: f64,
    pub mass: f64,
    pub length: f64,
    pub timelimit: usize,
}
impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            gravity: 10.0,
            mass: 1.0,
            length: 1.0,
            timelimit: 200,
        }
    }
}

/// The classic pendulum swing-up task.
///
/// The observation is `[cos(theta), sin(theta), theta_dot]` and the single
/// action is the torque applied to the free end of the pendulum, in
/// `[-max_torque, max_torque]`. The reward per timestep is in
/// `[-16.2736044, 0.0]` and the episode is truncated after `timelimit` steps.
/// The task never terminates on its own.
pub struct PendulumEnv {
    config: PendulumConfig,
    theta: f64,
    theta_dot: f64,
    steps: usize,
    rng: StdRng,
}

impl Environment for PendulumEnv {
    type Config = PendulumConfig;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn new(config: PendulumConfig) -> Result<Box<Self>> {
        ensure!(config.dt > 0.0, "Pendulum dt must be positive");
        ensure!(config.timelimit > 0, "Pendulum timelimit must be positive");
        Ok(Box::new(Self {
            config,
            theta: PI,
            theta_dot: 0.0,
            steps: 0,
            rng: StdRng::seed_from_u64(0),
        }))
    }

    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Vec<f64>> {
        self.rng = StdRng::seed_from_u64(seed);
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.steps = 0;
        Ok(self.current_observation())
    }

    fn step(
        &mut self,
        action: &[f64],
    ) -> Result<Step> {
        ensure!(action.len() == 1, "Pendulum expects 1 action value, got {}", action.len());
        let PendulumConfig { max_speed, max_torque, dt, gravity, mass, length, timelimit } = self.config;

        let u = action[0].clamp(-max_torque, max_torque);
        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * u.powi(2);

        let theta_dot = self.theta_dot
            + (3.0 * gravity / (2.0 * length) * self.theta.sin() + 3.0 / (mass * length.powi(2)) * u) * dt;
        self.theta_dot = theta_dot.clamp(-max_speed, max_speed);
        self.theta += self.theta_dot * dt;
        self.steps += 1;

        Ok(Step {
            observation: self.current_observation(),
            reward: -cost,
            terminated: false,
            truncated: self.steps >= timelimit,
        })
    }

    fn timelimit(&self) -> usize {
        self.config.timelimit
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Continuous {
            low: vec![-self.config.max_torque],
            high: vec![self.config.max_torque],
        }
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![3]
    }

    fn current_observation(&self) -> Vec<f64> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}
