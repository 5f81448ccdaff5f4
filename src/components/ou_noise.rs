use {
    crate::error::{
        AgentError,
        Result,
    },
    candle_core::{
        Device,
        Tensor,
    },
};

/// Ornstein-Uhlenbeck process for temporally correlated exploration noise.
///
/// Every call to [`OuNoise::sample`] advances the state by
///
/// $$ x \leftarrow x + \theta (\mu - x) dt + \sigma \sqrt{dt} \mathcal{N}(0, I) $$
///
/// and returns the new state. [`OuNoise::reset`] puts the state back to `mu`,
/// which should happen at every episode boundary.
#[derive(Clone)]
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: f64,
    dt: f64,
    state: Tensor,
}
impl OuNoise {
    pub fn new(
        mu: f64,
        theta: f64,
        sigma: f64,
        dt: f64,
        size_action: usize,
        device: &Device,
    ) -> Result<Self> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(AgentError::Config(format!("OU dt must be positive, got {dt}")));
        }
        if size_action == 0 {
            return Err(AgentError::Config("OU noise needs at least one action dimension".to_owned()));
        }
        Ok(Self {
            mu,
            theta,
            sigma,
            dt,
            state: Tensor::full(mu, size_action, device)?,
        })
    }

    pub fn sample(&mut self) -> Result<Tensor> {
        let rand = self.state.randn_like(0.0, 1.0)?;
        let drift = ((self.theta * self.dt) * (self.mu - &self.state)?)?;
        let diffusion = ((self.sigma * self.dt.sqrt()) * rand)?;
        self.state = ((&self.state + drift)? + diffusion)?;
        Ok(self.state.clone())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.state = self.state.ones_like()?.affine(0.0, self.mu)?;
        Ok(())
    }

    pub fn state(&self) -> &Tensor {
        &self.state
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_mu() -> Result<()> {
        let noise = OuNoise::new(0.3, 0.15, 0.2, 1.0, 3, &Device::Cpu)?;
        assert_eq!(noise.state().to_vec1::<f64>()?, vec![0.3, 0.3, 0.3]);
        Ok(())
    }

    #[test]
    fn test_zero_sigma_stays_at_mu() -> Result<()> {
        let mut noise = OuNoise::new(0.5, 0.15, 0.0, 0.01, 2, &Device::Cpu)?;
        for _ in 0..10 {
            let x = noise.sample()?.to_vec1::<f64>()?;
            assert!(x.iter().all(|v| (v - 0.5).abs() < 1e-12));
        }
        Ok(())
    }

    #[test]
    fn test_reset_restores_mu() -> Result<()> {
        let mut noise = OuNoise::new(-1.0, 0.15, 0.3, 1.0, 4, &Device::Cpu)?;
        for _ in 0..20 {
            noise.sample()?;
        }
        noise.reset()?;
        assert_eq!(noise.state().to_vec1::<f64>()?, vec![-1.0; 4]);
        Ok(())
    }

    /// With theta * dt = 1 every sample forgets the previous state, so the
    /// samples are centered on mu.
    #[test]
    fn test_mean_reverts_to_mu() -> Result<()> {
        let mut noise = OuNoise::new(2.0, 1.0, 0.1, 1.0, 1, &Device::Cpu)?;
        let n = 2000;
        let mut total = 0.0;
        for _ in 0..n {
            total += noise.sample()?.to_vec1::<f64>()?[0];
        }
        assert!((total / n as f64 - 2.0).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_dt() {
        assert!(matches!(
            OuNoise::new(0.0, 0.15, 0.2, 0.0, 1, &Device::Cpu),
            Err(AgentError::Config(_)),
        ));
    }
}
