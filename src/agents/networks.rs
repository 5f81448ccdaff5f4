//! The function approximators an agent is built from.
//!
//! Agents only talk to their networks through these traits. Each network owns
//! its online parameters, a slowly tracking target copy and whatever optimizer
//! it trains with. All inputs are batched: states are `[batch, size_state]`,
//! actions are `[batch, size_action]` and values are `[batch, 1]`.
use {
    crate::error::Result,
    candle_core::Tensor,
    std::path::Path,
};

pub trait Actor {
    /// Actions of the online policy.
    fn predict(
        &self,
        states: &Tensor,
    ) -> Result<Tensor>;

    /// Actions of the target policy.
    fn target_predict(
        &self,
        states: &Tensor,
    ) -> Result<Tensor>;

    /// One gradient step ascending `critic`'s value of the actions the online
    /// policy produces for `states`. Only the actor's parameters are updated.
    fn train(
        &mut self,
        states: &Tensor,
        critic: &dyn Critic,
    ) -> Result<()>;

    /// Soft update: `target <- tau * online + (1 - tau) * target`.
    fn target_update(
        &mut self,
        tau: f64,
    ) -> Result<()>;

    fn save(
        &self,
        path: &Path,
    ) -> Result<()>;

    fn load(
        &mut self,
        path: &Path,
    ) -> Result<()>;
}

pub trait Critic {
    /// Values of the online critic. Must stay differentiable with respect to
    /// `actions` so that an [`Actor`] can train against it.
    fn predict(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor>;

    /// Values of the target critic.
    fn target_predict(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor>;

    /// One gradient step moving the online values for `(states, actions)`
    /// towards `targets`.
    fn train(
        &mut self,
        states: &Tensor,
        actions: &Tensor,
        targets: &Tensor,
    ) -> Result<()>;

    /// Soft update: `target <- tau * online + (1 - tau) * target`.
    fn target_update(
        &mut self,
        tau: f64,
    ) -> Result<()>;

    fn save(
        &self,
        path: &Path,
    ) -> Result<()>;

    fn load(
        &mut self,
        path: &Path,
    ) -> Result<()>;
}
