use {
    super::{
        replay_buffer::{
            Batch,
            ReplayBuffer,
            Transition,
        },
        sum_tree::SumTree,
    },
    crate::error::{
        AgentError,
        Result,
    },
    rand::{
        thread_rng,
        Rng,
    },
    tracing::debug,
};

/// A replay buffer that samples transitions proportionally to their priority.
///
/// Transitions are placed exactly like in [`ReplayBuffer`], and the priority of
/// every slot is kept in a [`SumTree`] at the same index. Writing into a slot
/// overwrites both the evicted transition and its priority.
///
/// Each stored priority is `priority + epsilon`. No importance-sampling weights
/// are computed: training on a prioritized batch is biased towards high
/// priority transitions.
#[derive(Clone)]
pub struct PrioritizedReplayBuffer {
    buffer: ReplayBuffer,
    priorities: SumTree,
    epsilon: f64,
}
impl PrioritizedReplayBuffer {
    pub fn new(
        capacity: usize,
        epsilon: f64,
    ) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(AgentError::Config(format!("Priority epsilon must be non-negative, got {epsilon}")));
        }
        Ok(Self {
            buffer: ReplayBuffer::new(capacity)?,
            priorities: SumTree::new(capacity)?,
            epsilon,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The sum of all live priorities.
    pub fn total_priority(&self) -> f64 {
        self.priorities.total()
    }

    /// The stored (epsilon-floored) priority of the transition in `slot`.
    pub fn priority(
        &self,
        slot: usize,
    ) -> Option<f64> {
        (slot < self.size())
            .then(|| self.priorities.get(slot))
            .flatten()
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
        self.buffer.iter()
    }

    /// Push a transition with the given priority and return its slot.
    ///
    /// The priority is validated before anything is written, so a rejected
    /// priority leaves the buffer untouched.
    pub fn push(
        &mut self,
        transition: Transition,
        priority: f64,
    ) -> Result<usize> {
        let priority = self.floored(priority)?;
        let slot = self.buffer.push(transition);
        self.priorities.set(slot, priority)?;
        Ok(slot)
    }

    /// Overwrite the priority of the transition in `slot`.
    pub fn update(
        &mut self,
        slot: usize,
        priority: f64,
    ) -> Result<()> {
        if slot >= self.size() {
            return Err(AgentError::IndexOutOfRange {
                index: slot,
                size: self.size(),
            });
        }
        let priority = self.floored(priority)?;
        self.priorities.set(slot, priority)
    }

    /// Draw `min(batch_size, size)` slots, each with probability proportional
    /// to its priority.
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        if self.is_empty() {
            return Err(AgentError::EmptyBuffer);
        }
        let total = self.total_priority();
        if !(total.is_finite() && total > 0.0) {
            return Err(AgentError::DegeneratePriorities(total));
        }
        Ok((0..batch_size.min(self.size()))
            .map(|_| self.priorities.find(rng.gen_range(0.0..total)))
            .collect())
    }

    /// Sample a batch together with the slots it was drawn from, so that the
    /// priorities can be updated after training on it.
    pub fn random_batch(
        &self,
        batch_size: usize,
    ) -> Result<(Batch, Vec<usize>)> {
        let indices = self.sample_indices(batch_size, &mut thread_rng())?;
        debug!("Sampled prioritized batch from total priority {}", self.total_priority());
        Ok((self.buffer.batch(&indices)?, indices))
    }

    fn floored(
        &self,
        priority: f64,
    ) -> Result<f64> {
        if !priority.is_finite() || priority < 0.0 {
            return Err(AgentError::InvalidPriority(priority));
        }
        Ok(priority + self.epsilon)
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        candle_core::{
            Device,
            Tensor,
        },
    };

    fn transition(i: usize) -> Result<Transition> {
        let device = Device::Cpu;
        Ok(Transition::new(
            &Tensor::new(&[i as f64], &device)?,
            &Tensor::new(&[0.0], &device)?,
            i as f64,
            &Tensor::new(&[i as f64], &device)?,
            false,
        ))
    }

    fn filled(priorities: &[f64], capacity: usize, epsilon: f64) -> Result<PrioritizedReplayBuffer> {
        let mut buffer = PrioritizedReplayBuffer::new(capacity, epsilon)?;
        for (i, &p) in priorities.iter().enumerate() {
            buffer.push(transition(i)?, p)?;
        }
        Ok(buffer)
    }

    #[test]
    fn test_high_priority_dominates_sampling() -> Result<()> {
        let buffer = filled(&[1.0, 1.0, 1.0, 100.0], 4, 0.0)?;
        let n = 10_000;
        let indices = buffer.sample_indices(n, &mut thread_rng())?;
        // sample_indices caps at the buffer size
        assert_eq!(indices.len(), 4);

        let mut hits = 0;
        let mut draws = 0;
        for _ in 0..n / 4 {
            let indices = buffer.sample_indices(4, &mut thread_rng())?;
            hits += indices.iter().filter(|&&ix| ix == 3).count();
            draws += indices.len();
        }
        // expected share is 100 / 103
        assert!(hits as f64 / draws as f64 > 0.9);
        Ok(())
    }

    #[test]
    fn test_batch_and_indices_line_up() -> Result<()> {
        let buffer = filled(&[0.0, 0.0, 5.0], 3, 0.0)?;
        let (batch, indices) = buffer.random_batch(3)?;
        assert_eq!(indices, vec![2, 2, 2]);
        assert_eq!(batch.rewards.flatten_all()?.to_vec1::<f64>()?, vec![2.0, 2.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_wrapping_overwrites_priority() -> Result<()> {
        let mut buffer = filled(&[1.0, 2.0, 3.0], 3, 0.0)?;
        assert_eq!(buffer.total_priority(), 6.0);

        // evicts slot 0 and its priority
        let slot = buffer.push(transition(3)?, 10.0)?;
        assert_eq!(slot, 0);
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.priority(0), Some(10.0));
        assert_eq!(buffer.total_priority(), 15.0);
        Ok(())
    }

    #[test]
    fn test_update_changes_total() -> Result<()> {
        let mut buffer = filled(&[1.0, 1.0], 4, 0.5)?;
        assert_eq!(buffer.total_priority(), 3.0);
        buffer.update(1, 4.0)?;
        assert_eq!(buffer.priority(1), Some(4.5));
        assert_eq!(buffer.total_priority(), 6.0);

        // slot 2 holds no transition yet
        assert!(matches!(buffer.update(2, 1.0), Err(AgentError::IndexOutOfRange { .. })));
        assert!(matches!(buffer.update(0, -1.0), Err(AgentError::InvalidPriority(_))));
        Ok(())
    }

    #[test]
    fn test_all_zero_priorities_fail_fast() -> Result<()> {
        let buffer = filled(&[0.0, 0.0, 0.0], 3, 0.0)?;
        assert!(matches!(
            buffer.random_batch(2),
            Err(AgentError::DegeneratePriorities(t)) if t == 0.0,
        ));
        Ok(())
    }

    #[test]
    fn test_epsilon_keeps_zero_priorities_sampleable() -> Result<()> {
        let buffer = filled(&[0.0, 0.0], 2, 1e-6)?;
        let (batch, _) = buffer.random_batch(2)?;
        assert_eq!(batch.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_buffer_fails_fast() -> Result<()> {
        let buffer = PrioritizedReplayBuffer::new(3, 0.0)?;
        assert!(matches!(buffer.random_batch(1), Err(AgentError::EmptyBuffer)));
        Ok(())
    }

    #[test]
    fn test_rejected_priority_leaves_buffer_untouched() -> Result<()> {
        let mut buffer = filled(&[1.0], 3, 0.0)?;
        assert!(buffer.push(transition(1)?, f64::INFINITY).is_err());
        assert_eq!(buffer.size(), 1);
        assert_eq!(buffer.total_priority(), 1.0);
        Ok(())
    }
}
