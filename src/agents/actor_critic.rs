use {
    super::{
        networks::{
            Actor,
            Critic,
        },
        RunMode,
    },
    crate::{
        components::{
            Memory,
            OuNoise,
            Transition,
        },
        envs::ActionSpace,
        error::{
            check_dims,
            AgentError,
            Result,
        },
    },
    candle_core::{
        Device,
        Tensor,
    },
    std::path::Path,
    tracing::{
        debug,
        info,
    },
};

/// What a call to `train` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// The buffer held fewer transitions than one batch, nothing happened.
    Skipped,
    /// The critics were trained, the policy update was not due.
    CriticOnly,
    /// Critics, actor and all target networks were updated.
    Full,
}

/// Decides on which training ticks the policy and the targets are updated.
///
/// The counter is checked before it is incremented, so with a delay of 2 the
/// policy is updated on ticks 0, 2, 4 and so on.
#[derive(Debug, Clone)]
pub struct UpdateCadence {
    delay: usize,
    step: usize,
}
impl UpdateCadence {
    pub fn new(delay: usize) -> Result<Self> {
        if delay == 0 {
            return Err(AgentError::Config("The policy update delay must be at least 1".to_owned()));
        }
        Ok(Self { delay, step: 0 })
    }

    /// A cadence that updates the policy on every tick.
    pub fn every_tick() -> Self {
        Self { delay: 1, step: 0 }
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// The number of ticks counted so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Count one training tick and report whether the policy update is due.
    pub fn tick(&mut self) -> bool {
        let due = self.step % self.delay == 0;
        self.step += 1;
        due
    }
}

/// Target policy smoothing.
///
/// Adds Gaussian noise with standard deviation `sigma * action_bound`,
/// clipped to `[-clip * action_bound, clip * action_bound]`, to the target
/// actions and clips the result back into the action bounds. Only used when
/// computing targets, never when acting.
#[derive(Debug, Clone, Copy)]
pub struct TargetSmoothing {
    pub sigma: f64,
    pub clip: f64,
}
impl TargetSmoothing {
    pub fn new(
        sigma: f64,
        clip: f64,
    ) -> Result<Self> {
        if !(sigma.is_finite() && sigma >= 0.0 && clip.is_finite() && clip >= 0.0) {
            return Err(AgentError::Config(format!(
                "Target smoothing needs non-negative sigma and clip, got {sigma} and {clip}"
            )));
        }
        Ok(Self { sigma, clip })
    }

    pub fn apply(
        &self,
        actions: &Tensor,
        action_bound: &Tensor,
        low: &Tensor,
        high: &Tensor,
    ) -> Result<Tensor> {
        let limit = (action_bound * self.clip)?;
        let noise = actions
            .randn_like(0.0, 1.0)?
            .broadcast_mul(&(action_bound * self.sigma)?)?
            .broadcast_minimum(&limit)?
            .broadcast_maximum(&limit.neg()?)?;
        Ok((actions + noise)?
            .broadcast_maximum(low)?
            .broadcast_minimum(high)?)
    }
}

/// The element-wise minimum over the value estimates of several critics.
pub fn elementwise_min(values: &[Tensor]) -> Result<Tensor> {
    let (first, rest) = values
        .split_first()
        .ok_or_else(|| AgentError::Config("Need at least one critic".to_owned()))?;
    rest.iter()
        .try_fold(first.clone(), |min, values| -> Result<Tensor> { Ok(min.minimum(values)?) })
}

/// The one-step Bellman targets for a batch.
///
/// $$ y_i = r_i $$ if the transition ended the episode, otherwise
/// $$ y_i = r_i + \gamma Q_i $$
///
/// `dones` is a `u8` mask, so terminal targets are exactly the reward.
pub fn bellman_targets(
    rewards: &Tensor,
    dones: &Tensor,
    next_values: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let bootstrapped = (rewards + (next_values * gamma)?)?;
    Ok(dones.where_cond(rewards, &bootstrapped)?)
}

/// Per-dimension action limits as tensors of shape `[size_action]`.
#[derive(Clone)]
pub struct ActionBounds {
    pub low: Tensor,
    pub high: Tensor,
    pub bound: Tensor,
}
impl ActionBounds {
    pub fn new(
        action_space: &ActionSpace,
        device: &Device,
    ) -> Result<Self> {
        action_space.validate()?;
        Ok(Self {
            low: Tensor::new(action_space.low().as_slice(), device)?,
            high: Tensor::new(action_space.high().as_slice(), device)?,
            bound: Tensor::new(action_space.action_bound().as_slice(), device)?,
        })
    }

    pub fn clip(
        &self,
        actions: &Tensor,
    ) -> Result<Tensor> {
        Ok(actions
            .broadcast_maximum(&self.low)?
            .broadcast_minimum(&self.high)?)
    }
}

/// Hyperparameters of the shared actor-critic update.
#[derive(Debug, Clone, Copy)]
pub struct CoreParams {
    pub gamma: f64,
    pub tau: f64,
    pub batch_size: usize,
}

/// The update routine shared by [`super::Ddpg`] and [`super::Td3`].
///
/// Holds one actor, one or more critics, the replay memory and the
/// exploration noise. The number of critics, the [`UpdateCadence`] and the
/// optional [`TargetSmoothing`] are all that separate the two algorithms.
pub struct ActorCriticCore<A, C> {
    actor: A,
    critics: Vec<C>,
    memory: Memory,
    noise: OuNoise,
    bounds: ActionBounds,
    discrete: bool,
    size_state: usize,
    size_action: usize,
    params: CoreParams,
    cadence: UpdateCadence,
    smoothing: Option<TargetSmoothing>,
    run_mode: RunMode,
    device: Device,
}

impl<A: Actor, C: Critic> ActorCriticCore<A, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor: A,
        critics: Vec<C>,
        memory: Memory,
        noise: OuNoise,
        size_state: usize,
        action_space: &ActionSpace,
        params: CoreParams,
        cadence: UpdateCadence,
        smoothing: Option<TargetSmoothing>,
        device: &Device,
    ) -> Result<Self> {
        if critics.is_empty() {
            return Err(AgentError::Config("An actor-critic agent needs at least one critic".to_owned()));
        }
        if size_state == 0 {
            return Err(AgentError::ShapeMismatch {
                what: "observation space",
                expected: vec![1],
                actual: vec![0],
            });
        }
        if params.batch_size == 0 {
            return Err(AgentError::Config("The training batch size must be positive".to_owned()));
        }
        if !(0.0..=1.0).contains(&params.tau) {
            return Err(AgentError::Config(format!("Tau must be in [0, 1], got {}", params.tau)));
        }
        let bounds = ActionBounds::new(action_space, device)?;
        let size_action = action_space.size();
        check_dims("exploration noise", noise.state(), &[size_action])?;

        info!(
            "Created actor-critic core with {} critic(s), policy delay {}, smoothing {:?}, prioritized replay {}",
            critics.len(),
            cadence.delay(),
            smoothing,
            memory.is_prioritized(),
        );

        Ok(Self {
            actor,
            critics,
            memory,
            noise,
            bounds,
            discrete: action_space.is_discrete(),
            size_state,
            size_action,
            params,
            cadence,
            smoothing,
            run_mode: RunMode::Train,
            device: device.clone(),
        })
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn critics(&self) -> &[C] {
        &self.critics
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn params(&self) -> CoreParams {
        self.params
    }

    pub fn cadence(&self) -> &UpdateCadence {
        &self.cadence
    }

    pub fn size_state(&self) -> usize {
        self.size_state
    }

    pub fn size_action(&self) -> usize {
        self.size_action
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn set_run_mode(
        &mut self,
        mode: RunMode,
    ) {
        self.run_mode = mode;
    }

    /// Select an action for a single observation of shape `[size_state]`.
    ///
    /// In [`RunMode::Train`] OU noise scaled by the action bound is added for
    /// continuous action spaces. The result is always clipped to the bounds.
    pub fn actions(
        &mut self,
        state: &Tensor,
    ) -> Result<Tensor> {
        check_dims("observation", state, &[self.size_state])?;

        // Candle assumes a batch dimension, so when we don't have one we need
        // to pretend we do by un- and resqueezing the state tensor.
        let actions = self.actor.predict(&state.detach().unsqueeze(0)?)?.squeeze(0)?.detach();
        let actions = if self.run_mode == RunMode::Train && !self.discrete {
            let noise = self.noise.sample()?.broadcast_mul(&self.bounds.bound)?;
            (actions + noise)?
        } else {
            actions
        };
        self.bounds.clip(&actions)
    }

    /// Store a transition, returning the slot it was written to.
    ///
    /// With prioritized replay the initial priority is the absolute TD error of
    /// a one-step lookahead with the current networks.
    pub fn remember(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<usize> {
        check_dims("observation", state, &[self.size_state])?;
        check_dims("action", action, &[self.size_action])?;
        check_dims("next observation", next_state, &[self.size_state])?;

        let transition = Transition::new(state, action, reward, next_state, done);
        let priority = if self.memory.is_prioritized() {
            self.lookahead_priority(&transition)?
        } else {
            0.0
        };
        self.memory.push(transition, priority)
    }

    fn lookahead_priority(
        &self,
        transition: &Transition,
    ) -> Result<f64> {
        let state = transition.state.unsqueeze(0)?;
        let target = if transition.done {
            transition.reward
        } else {
            let next_state = transition.next_state.unsqueeze(0)?;
            let next_actions = self.actor.target_predict(&next_state)?;
            let next_values = self
                .critics
                .iter()
                .map(|critic| critic.target_predict(&next_state, &next_actions))
                .collect::<Result<Vec<_>>>()?;
            let next_value = elementwise_min(&next_values)?.flatten_all()?.to_vec1::<f64>()?;
            transition.reward + self.params.gamma * next_value.first().copied().unwrap_or_default()
        };
        let value = self.critics[0]
            .predict(&state, &self.actor.predict(&state)?)?
            .flatten_all()?
            .to_vec1::<f64>()?;
        Ok((target - value.first().copied().unwrap_or_default()).abs())
    }

    /// One training tick.
    ///
    /// Does nothing while the memory holds fewer than `batch_size` transitions.
    /// Otherwise the critics are trained on every tick and the actor plus all
    /// target networks whenever the [`UpdateCadence`] says so.
    pub fn train(&mut self) -> Result<TrainOutcome> {
        if self.memory.size() < self.params.batch_size {
            debug!(
                "Skipping training, {} of {} transitions stored",
                self.memory.size(),
                self.params.batch_size,
            );
            return Ok(TrainOutcome::Skipped);
        }

        let (batch, slots) = self.memory.random_batch(self.params.batch_size)?;

        let next_actions = self.actor.target_predict(&batch.next_states)?;
        let next_actions = match &self.smoothing {
            Some(smoothing) => smoothing.apply(
                &next_actions,
                &self.bounds.bound,
                &self.bounds.low,
                &self.bounds.high,
            )?,
            None => next_actions,
        };
        let next_values = self
            .critics
            .iter()
            .map(|critic| critic.target_predict(&batch.next_states, &next_actions))
            .collect::<Result<Vec<_>>>()?;
        let next_values = elementwise_min(&next_values)?.detach();
        let targets = bellman_targets(&batch.rewards, &batch.dones, &next_values, self.params.gamma)?.detach();

        if let Some(slots) = slots {
            let errors = (&next_values - &targets)?.abs()?.flatten_all()?.to_vec1::<f64>()?;
            for (&slot, &error) in slots.iter().zip(errors.iter()) {
                self.memory.update(slot, error)?;
            }
            debug!("Updated {} priorities", slots.len());
        }

        for critic in self.critics.iter_mut() {
            critic.train(&batch.states, &batch.actions, &targets)?;
        }

        let step = self.cadence.step();
        if !self.cadence.tick() {
            return Ok(TrainOutcome::CriticOnly);
        }
        debug!("Policy update at step {step}");

        self.actor.train(&batch.states, &self.critics[0])?;
        self.actor.target_update(self.params.tau)?;
        for critic in self.critics.iter_mut() {
            critic.target_update(self.params.tau)?;
        }
        Ok(TrainOutcome::Full)
    }

    /// Put the exploration noise back to its mean.
    pub fn reset_noise(&mut self) -> Result<()> {
        self.noise.reset()
    }

    /// Save all networks to `path/{name}-actor` and `path/{name}-critic{i}`.
    pub fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        self.actor.save(&path.join(format!("{name}-actor")))?;
        for (i, critic) in self.critics.iter().enumerate() {
            critic.save(&path.join(format!("{name}-critic{}", i + 1)))?;
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        self.actor.load(&path.join(format!("{name}-actor")))?;
        for (i, critic) in self.critics.iter_mut().enumerate() {
            critic.load(&path.join(format!("{name}-critic{}", i + 1)))?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        candle_core::DType,
    };

    #[test]
    fn test_elementwise_min_picks_lower_critic() -> Result<()> {
        let device = Device::Cpu;
        let q1 = Tensor::new(&[[5.0f64], [1.0]], &device)?;
        let q2 = Tensor::new(&[[3.0f64], [2.0]], &device)?;
        let min = elementwise_min(&[q1, q2])?;
        assert_eq!(min.to_vec2::<f64>()?, vec![vec![3.0], vec![1.0]]);
        assert!(elementwise_min(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_bellman_targets_short_circuit_on_done() -> Result<()> {
        let device = Device::Cpu;
        let rewards = Tensor::new(&[[1.0f64], [-2.0]], &device)?;
        let dones = Tensor::new(&[[1u8], [0]], &device)?;
        let next_values = Tensor::new(&[[100.0f64], [10.0]], &device)?;
        let targets = bellman_targets(&rewards, &dones, &next_values, 0.5)?.to_vec2::<f64>()?;
        assert_eq!(targets, vec![vec![1.0], vec![3.0]]);

        // terminal targets ignore non-finite next values
        let next_values = Tensor::new(&[[f64::NAN], [0.0]], &device)?;
        let targets = bellman_targets(&rewards, &dones, &next_values, 0.99)?.to_vec2::<f64>()?;
        assert_eq!(targets[0][0], 1.0);
        Ok(())
    }

    #[test]
    fn test_cadence_with_delay() -> Result<()> {
        let mut cadence = UpdateCadence::new(2)?;
        let due = (0..4).map(|_| cadence.tick()).collect::<Vec<_>>();
        assert_eq!(due, vec![true, false, true, false]);
        assert_eq!(cadence.step(), 4);

        let mut every = UpdateCadence::every_tick();
        assert!((0..5).all(|_| every.tick()));
        assert!(UpdateCadence::new(0).is_err());
        Ok(())
    }

    #[test]
    fn test_smoothing_noise_is_clipped() -> Result<()> {
        let device = Device::Cpu;
        let bound = Tensor::new(&[2.0f64], &device)?;
        let low = Tensor::new(&[-10.0f64], &device)?;
        let high = Tensor::new(&[10.0f64], &device)?;
        let actions = Tensor::zeros((500, 1), DType::F64, &device)?;

        let smoothing = TargetSmoothing::new(5.0, 0.5)?;
        let smoothed = smoothing.apply(&actions, &bound, &low, &high)?;
        for a in smoothed.flatten_all()?.to_vec1::<f64>()? {
            assert!(a.abs() <= 1.0 + 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_smoothing_respects_action_bounds() -> Result<()> {
        let device = Device::Cpu;
        let bound = Tensor::new(&[1.0f64], &device)?;
        let low = Tensor::new(&[-1.0f64], &device)?;
        let high = Tensor::new(&[1.0f64], &device)?;
        let actions = Tensor::ones((200, 1), DType::F64, &device)?;

        let smoothing = TargetSmoothing::new(0.2, 0.5)?;
        let smoothed = smoothing.apply(&actions, &bound, &low, &high)?;
        for a in smoothed.flatten_all()?.to_vec1::<f64>()? {
            assert!((0.5 - 1e-12..=1.0).contains(&a));
        }
        assert!(TargetSmoothing::new(-0.1, 0.5).is_err());
        Ok(())
    }

    #[test]
    fn test_action_bounds_clip() -> Result<()> {
        let device = Device::Cpu;
        let bounds = ActionBounds::new(
            &ActionSpace::Continuous { low: vec![-2.0, 0.0], high: vec![2.0, 1.0] },
            &device,
        )?;
        let clipped = bounds.clip(&Tensor::new(&[5.0f64, -3.0], &device)?)?;
        assert_eq!(clipped.to_vec1::<f64>()?, vec![2.0, 0.0]);
        assert_eq!(bounds.bound.to_vec1::<f64>()?, vec![2.0, 0.5]);
        Ok(())
    }
}
