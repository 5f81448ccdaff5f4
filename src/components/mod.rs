//! # Components
//!
//! This module contains the components that are used to build an agent.
//!
//! ## Noise
//!
//! The [`OuNoise`] struct implements the Ornstein-Uhlenbeck process, which is
//! used for exploration by both [`crate::agents::Ddpg`] and
//! [`crate::agents::Td3`].
//!
//! ## Replay Buffer
//!
//! The [`ReplayBuffer`] struct implements a fixed capacity ring buffer with
//! uniform sampling. The [`PrioritizedReplayBuffer`] struct places transitions
//! the same way but samples them proportionally to their priority, backed by a
//! [`SumTree`]. [`Memory`] lets an agent hold either of them.

mod memory;
mod ou_noise;
mod prioritized_replay_buffer;
mod replay_buffer;
mod sum_tree;

pub use memory::Memory;
pub use ou_noise::OuNoise;
pub use prioritized_replay_buffer::PrioritizedReplayBuffer;
pub use replay_buffer::{
    Batch,
    ReplayBuffer,
    Transition,
};
pub use sum_tree::SumTree;
