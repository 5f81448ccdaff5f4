//! DDPG and TD3 agents for continuous control.
//!
//! The agents live in [`agents`], the replay storage and exploration noise
//! they are built from in [`components`]. [`engines`] contains the training
//! loop and the experiment runner used by the binary.

pub mod agents;
pub mod cli;
pub mod components;
pub mod configs;
pub mod engines;
pub mod envs;
pub mod error;
pub mod logging;
pub mod util;

pub use error::{
    AgentError,
    Result,
};
