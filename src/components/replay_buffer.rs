use {
    crate::error::{
        AgentError,
        Result,
    },
    candle_core::Tensor,
    rand::{
        distributions::Uniform,
        thread_rng,
        Rng,
    },
    unzip_n::unzip_n,
};

unzip_n!(5);

/// A transition in the replay buffer.
///
/// # Fields
///
/// * `state` - The observation the action was taken in, shape `[size_state]`.
/// * `action` - The action taken, shape `[size_action]`.
/// * `reward` - The reward received.
/// * `next_state` - The observation after the action, shape `[size_state]`.
/// * `done` - Whether the episode terminated with this transition.
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: Tensor,
    pub action: Tensor,
    pub reward: f64,
    pub next_state: Tensor,
    pub done: bool,
}
impl Transition {
    pub fn new(
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Self {
        Self {
            state: state.detach(),
            action: action.detach(),
            reward,
            next_state: next_state.detach(),
            done,
        }
    }
}

/// A batch of transitions stacked along a leading batch dimension.
///
/// # Fields
///
/// * `states` - `[batch, size_state]`
/// * `actions` - `[batch, size_action]`
/// * `rewards` - `[batch, 1]`, same dtype as the states
/// * `dones` - `[batch, 1]`, `u8` mask usable with `where_cond`
/// * `next_states` - `[batch, size_state]`
#[derive(Clone, Debug)]
pub struct Batch {
    pub states: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub dones: Tensor,
    pub next_states: Tensor,
}
impl Batch {
    pub fn len(&self) -> usize {
        self.states.dims().first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stack the given transitions into a batch.
    pub fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let first = transitions.first().ok_or(AgentError::EmptyBuffer)?;
        let device = first.state.device();
        let dtype = first.state.dtype();

        let (states, actions, rewards, dones, next_states) = transitions
            .iter()
            .map(|t| (
                t.state.clone(),
                t.action.clone(),
                t.reward,
                t.done as u8,
                t.next_state.clone(),
            ))
            .unzip_n_vec();

        let n = rewards.len();
        Ok(Self {
            states: Tensor::stack(&states, 0)?,
            actions: Tensor::stack(&actions, 0)?,
            rewards: Tensor::from_vec(rewards, (n, 1), device)?.to_dtype(dtype)?,
            dones: Tensor::from_vec(dones, (n, 1), device)?,
            next_states: Tensor::stack(&next_states, 0)?,
        })
    }
}

/// A fixed capacity replay buffer for off-policy algorithms.
///
/// The replay buffer is implemented as a ring buffer over a `Vec`: a write
/// cursor advances modulo the capacity and, once the buffer is full, the oldest
/// transition is overwritten first. The slot index a transition is written to
/// stays valid until that slot is overwritten, which is what the prioritized
/// variant relies on to update priorities after a training step.
///
/// # Fields
///
/// * `buffer` - The slots holding transitions.
/// * `capacity` - The capacity of the buffer.
/// * `pos` - The slot the next transition is written to.
#[derive(Clone)]
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    pos: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AgentError::Config("Replay buffer capacity must be positive".to_owned()));
        }
        Ok(Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            pos: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of live transitions, `min(writes, capacity)`.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Push a transition into the buffer and return the slot it was written to.
    ///
    /// If the buffer is full, the oldest transition is overwritten.
    pub fn push(
        &mut self,
        transition: Transition,
    ) -> usize {
        let slot = self.pos;
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[slot] = transition;
        }
        self.pos = (self.pos + 1) % self.capacity;
        slot
    }

    /// Get the transition stored in `slot`.
    pub fn get(
        &self,
        slot: usize,
    ) -> Option<&Transition> {
        self.buffer.get(slot)
    }

    /// Iterate over the live transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.is_full() { self.pos } else { 0 };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    /// Draw `min(batch_size, size)` slot indices uniformly with replacement.
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        if self.is_empty() {
            return Err(AgentError::EmptyBuffer);
        }
        Ok(rng
            .sample_iter(Uniform::from(0..self.size()))
            .take(batch_size.min(self.size()))
            .collect())
    }

    /// Stack the transitions at the given slots into a batch.
    pub fn batch(
        &self,
        indices: &[usize],
    ) -> Result<Batch> {
        let transitions = indices
            .iter()
            .map(|&i| self.buffer.get(i).ok_or(AgentError::IndexOutOfRange {
                index: i,
                size: self.size(),
            }))
            .collect::<Result<Vec<&Transition>>>()?;
        Batch::from_transitions(&transitions)
    }

    /// Sample a random batch of transitions from the buffer.
    ///
    /// Sampling from an empty buffer is an error. Callers that train should
    /// check `size() >= batch_size` first.
    pub fn random_batch(
        &self,
        batch_size: usize,
    ) -> Result<Batch> {
        let indices = self.sample_indices(batch_size, &mut thread_rng())?;
        self.batch(&indices)
    }
}
