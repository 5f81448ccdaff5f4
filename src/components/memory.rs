use {
    super::{
        Batch,
        PrioritizedReplayBuffer,
        ReplayBuffer,
        Transition,
    },
    crate::error::Result,
};

/// The replay storage of an agent: either uniform or prioritized.
#[derive(Clone)]
pub enum Memory {
    Uniform(ReplayBuffer),
    Prioritized(PrioritizedReplayBuffer),
}
impl Memory {
    pub fn new(
        capacity: usize,
        prioritized: bool,
        epsilon: f64,
    ) -> Result<Self> {
        Ok(if prioritized {
            Memory::Prioritized(PrioritizedReplayBuffer::new(capacity, epsilon)?)
        } else {
            Memory::Uniform(ReplayBuffer::new(capacity)?)
        })
    }

    pub fn is_prioritized(&self) -> bool {
        matches!(self, Memory::Prioritized(_))
    }

    pub fn size(&self) -> usize {
        match self {
            Memory::Uniform(buffer) => buffer.size(),
            Memory::Prioritized(buffer) => buffer.size(),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Memory::Uniform(buffer) => buffer.capacity(),
            Memory::Prioritized(buffer) => buffer.capacity(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Transition> + '_> {
        match self {
            Memory::Uniform(buffer) => Box::new(buffer.iter()),
            Memory::Prioritized(buffer) => Box::new(buffer.iter()),
        }
    }

    /// Store a transition. The priority is ignored by the uniform variant.
    pub fn push(
        &mut self,
        transition: Transition,
        priority: f64,
    ) -> Result<usize> {
        match self {
            Memory::Uniform(buffer) => Ok(buffer.push(transition)),
            Memory::Prioritized(buffer) => buffer.push(transition, priority),
        }
    }

    /// Sample a batch. The slots are only returned by the prioritized variant.
    pub fn random_batch(
        &self,
        batch_size: usize,
    ) -> Result<(Batch, Option<Vec<usize>>)> {
        match self {
            Memory::Uniform(buffer) => Ok((buffer.random_batch(batch_size)?, None)),
            Memory::Prioritized(buffer) => {
                let (batch, indices) = buffer.random_batch(batch_size)?;
                Ok((batch, Some(indices)))
            }
        }
    }

    /// Update the priority of a slot. A no-op for the uniform variant.
    pub fn update(
        &mut self,
        slot: usize,
        priority: f64,
    ) -> Result<()> {
        match self {
            Memory::Uniform(_) => Ok(()),
            Memory::Prioritized(buffer) => buffer.update(slot, priority),
        }
    }
}
