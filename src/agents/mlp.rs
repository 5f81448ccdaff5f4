use {
    super::networks::{
        Actor,
        Critic,
    },
    crate::error::Result,
    candle_core::{
        DType,
        Device,
        Module,
        Tensor,
    },
    candle_nn::{
        func,
        linear,
        sequential::seq,
        Activation,
        AdamW,
        Optimizer,
        ParamsAdamW,
        Sequential,
        VarBuilder,
        VarMap,
    },
    std::{
        ffi::OsString,
        path::{
            Path,
            PathBuf,
        },
    },
    tracing::info,
};

/// Soft update the `target` variables towards the `online` variables.
///
/// Both varmaps hold the layers `fc{i}` of an MLP with the given `dims`.
///
/// $$ \theta' \leftarrow \tau \theta + (1 - \tau) \theta' $$
pub fn track(
    target: &mut VarMap,
    online: &VarMap,
    dims: &[(usize, usize)],
    tau: f64,
    device: &Device,
) -> Result<()> {
    let vb_target = VarBuilder::from_varmap(target, DType::F64, device);
    let vb_online = VarBuilder::from_varmap(online, DType::F64, device);

    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        let target_w = vb_target.get((out_dim, in_dim), &format!("fc{i}.weight"))?;
        let online_w = vb_online.get((out_dim, in_dim), &format!("fc{i}.weight"))?;
        target.set_one(
            format!("fc{i}.weight"),
            ((tau * online_w)? + ((1.0 - tau) * target_w)?)?,
        )?;

        let target_b = vb_target.get(out_dim, &format!("fc{i}.bias"))?;
        let online_b = vb_online.get(out_dim, &format!("fc{i}.bias"))?;
        target.set_one(
            format!("fc{i}.bias"),
            ((tau * online_b)? + ((1.0 - tau) * target_b)?)?,
        )?;
    }
    Ok(())
}

/// Build an MLP with ReLU activations between the layers `fc0..fcN`.
fn mlp(
    varmap: &VarMap,
    dims: &[(usize, usize)],
    device: &Device,
) -> Result<Sequential> {
    let vb = VarBuilder::from_varmap(varmap, DType::F64, device);
    let mut network = seq();
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        if i > 0 {
            network = network.add(Activation::Relu);
        }
        network = network.add(linear(in_dim, out_dim, vb.pp(format!("fc{i}")))?);
    }
    Ok(network)
}

fn with_suffix(
    path: &Path,
    suffix: &str,
) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A deterministic policy network with a tanh head.
///
/// The output is scaled per dimension by the action bound and shifted by the
/// action shift, so it always lies in `[shift - bound, shift + bound]`.
pub struct MlpActor {
    varmap: VarMap,
    target_varmap: VarMap,
    network: Sequential,
    target_network: Sequential,
    optim: AdamW,
    dims: Vec<(usize, usize)>,
    action_bound: Tensor,
    action_shift: Tensor,
    device: Device,
}

impl MlpActor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &Device,
        size_state: usize,
        size_action: usize,
        hidden_1_size: usize,
        hidden_2_size: usize,
        learning_rate: f64,
        action_bound: &[f64],
        action_shift: &[f64],
    ) -> Result<Self> {
        let dims = vec![
            (size_state, hidden_1_size),
            (hidden_1_size, hidden_2_size),
            (hidden_2_size, size_action),
        ];
        let varmap = VarMap::new();
        let mut target_varmap = VarMap::new();

        let network = mlp(&varmap, &dims, device)?.add(func(|xs| xs.tanh()));
        let target_network = mlp(&target_varmap, &dims, device)?.add(func(|xs| xs.tanh()));

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut target_varmap, &varmap, &dims, 1.0, device)?;

        let optim = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: learning_rate,
                ..Default::default()
            },
        )?;

        Ok(Self {
            varmap,
            target_varmap,
            network,
            target_network,
            optim,
            dims,
            action_bound: Tensor::new(action_bound, device)?,
            action_shift: Tensor::new(action_shift, device)?,
            device: device.clone(),
        })
    }

    fn scale(
        &self,
        xs: &Tensor,
    ) -> Result<Tensor> {
        Ok(xs
            .broadcast_mul(&self.action_bound)?
            .broadcast_add(&self.action_shift)?)
    }
}

impl Actor for MlpActor {
    fn predict(
        &self,
        states: &Tensor,
    ) -> Result<Tensor> {
        self.scale(&self.network.forward(states)?)
    }

    fn target_predict(
        &self,
        states: &Tensor,
    ) -> Result<Tensor> {
        self.scale(&self.target_network.forward(states)?)
    }

    fn train(
        &mut self,
        states: &Tensor,
        critic: &dyn Critic,
    ) -> Result<()> {
        let actions = self.predict(states)?;
        let loss = critic.predict(states, &actions)?.mean_all()?.neg()?;
        self.optim.backward_step(&loss)?;
        Ok(())
    }

    fn target_update(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(&mut self.target_varmap, &self.varmap, &self.dims, tau, &self.device)
    }

    fn save(
        &self,
        path: &Path,
    ) -> Result<()> {
        self.varmap.save(with_suffix(path, ".safetensors"))?;
        self.target_varmap.save(with_suffix(path, "-target.safetensors"))?;
        info!("Saved actor weights to {}", path.display());
        Ok(())
    }

    fn load(
        &mut self,
        path: &Path,
    ) -> Result<()> {
        self.varmap.load(with_suffix(path, ".safetensors"))?;
        self.target_varmap.load(with_suffix(path, "-target.safetensors"))?;
        info!("Loaded actor weights from {}", path.display());
        Ok(())
    }
}

/// A state-action value network.
pub struct MlpCritic {
    varmap: VarMap,
    target_varmap: VarMap,
    network: Sequential,
    target_network: Sequential,
    optim: AdamW,
    dims: Vec<(usize, usize)>,
    device: Device,
}

impl MlpCritic {
    pub fn new(
        device: &Device,
        size_state: usize,
        size_action: usize,
        hidden_1_size: usize,
        hidden_2_size: usize,
        learning_rate: f64,
    ) -> Result<Self> {
        let dims = vec![
            (size_state + size_action, hidden_1_size),
            (hidden_1_size, hidden_2_size),
            (hidden_2_size, 1),
        ];
        let varmap = VarMap::new();
        let mut target_varmap = VarMap::new();

        let network = mlp(&varmap, &dims, device)?;
        let target_network = mlp(&target_varmap, &dims, device)?;

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut target_varmap, &varmap, &dims, 1.0, device)?;

        let optim = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: learning_rate,
                ..Default::default()
            },
        )?;

        Ok(Self {
            varmap,
            target_varmap,
            network,
            target_network,
            optim,
            dims,
            device: device.clone(),
        })
    }
}

impl Critic for MlpCritic {
    fn predict(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[actions, states], 1)?;
        Ok(self.network.forward(&xs)?)
    }

    fn target_predict(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[actions, states], 1)?;
        Ok(self.target_network.forward(&xs)?)
    }

    fn train(
        &mut self,
        states: &Tensor,
        actions: &Tensor,
        targets: &Tensor,
    ) -> Result<()> {
        let diff = (self.predict(states, actions)? - targets)?;
        let loss = diff.sqr()?.mean_all()?;
        self.optim.backward_step(&loss)?;
        Ok(())
    }

    fn target_update(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(&mut self.target_varmap, &self.varmap, &self.dims, tau, &self.device)
    }

    fn save(
        &self,
        path: &Path,
    ) -> Result<()> {
        self.varmap.save(with_suffix(path, ".safetensors"))?;
        self.target_varmap.save(with_suffix(path, "-target.safetensors"))?;
        info!("Saved critic weights to {}", path.display());
        Ok(())
    }

    fn load(
        &mut self,
        path: &Path,
    ) -> Result<()> {
        self.varmap.load(with_suffix(path, ".safetensors"))?;
        self.target_varmap.load(with_suffix(path, "-target.safetensors"))?;
        info!("Loaded critic weights from {}", path.display());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn mse(critic: &MlpCritic, states: &Tensor, actions: &Tensor, targets: &Tensor) -> Result<f64> {
        Ok((critic.predict(states, actions)? - targets)?
            .sqr()?
            .mean_all()?
            .to_scalar::<f64>()?)
    }

    #[test]
    fn test_soft_update_blends_with_tau() -> Result<()> {
        let device = Device::Cpu;
        let mut online = VarMap::new();
        let mut target = VarMap::new();
        for varmap in [&online, &target] {
            let vb = VarBuilder::from_varmap(varmap, DType::F64, &device);
            vb.get((1, 1), "fc0.weight")?;
            vb.get(1, "fc0.bias")?;
        }
        online.set_one("fc0.weight", Tensor::ones((1, 1), DType::F64, &device)?)?;
        online.set_one("fc0.bias", Tensor::ones(1, DType::F64, &device)?)?;
        target.set_one("fc0.weight", Tensor::zeros((1, 1), DType::F64, &device)?)?;
        target.set_one("fc0.bias", Tensor::zeros(1, DType::F64, &device)?)?;

        track(&mut target, &online, &[(1, 1)], 0.1, &device)?;

        let vb = VarBuilder::from_varmap(&target, DType::F64, &device);
        let w = vb.get((1, 1), "fc0.weight")?.to_vec2::<f64>()?;
        let b = vb.get(1, "fc0.bias")?.to_vec1::<f64>()?;
        assert!((w[0][0] - 0.1).abs() < 1e-12);
        assert!((b[0] - 0.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_actor_output_respects_bounds() -> Result<()> {
        let device = Device::Cpu;
        let actor = MlpActor::new(&device, 3, 2, 16, 16, 1e-3, &[2.0, 0.5], &[1.0, 0.0])?;
        let states = (Tensor::randn(0f64, 1f64, (64, 3), &device)? * 10.0)?;
        for action in actor.predict(&states)?.to_vec2::<f64>()? {
            assert!((-1.0..=3.0).contains(&action[0]));
            assert!((-0.5..=0.5).contains(&action[1]));
        }
        Ok(())
    }

    #[test]
    fn test_targets_start_as_copies() -> Result<()> {
        let device = Device::Cpu;
        let actor = MlpActor::new(&device, 3, 1, 8, 8, 1e-3, &[1.0], &[0.0])?;
        let critic = MlpCritic::new(&device, 3, 1, 8, 8, 1e-3)?;
        let states = Tensor::randn(0f64, 1f64, (5, 3), &device)?;
        let actions = actor.predict(&states)?;

        assert_eq!(actions.to_vec2::<f64>()?, actor.target_predict(&states)?.to_vec2::<f64>()?);
        assert_eq!(
            critic.predict(&states, &actions)?.to_vec2::<f64>()?,
            critic.target_predict(&states, &actions)?.to_vec2::<f64>()?,
        );
        Ok(())
    }

    #[test]
    fn test_critic_train_moves_towards_targets() -> Result<()> {
        let device = Device::Cpu;
        let mut critic = MlpCritic::new(&device, 3, 1, 16, 16, 1e-2)?;
        let states = Tensor::randn(0f64, 1f64, (16, 3), &device)?;
        let actions = Tensor::randn(0f64, 1f64, (16, 1), &device)?;
        let targets = Tensor::ones((16, 1), DType::F64, &device)?;

        let before = mse(&critic, &states, &actions, &targets)?;
        for _ in 0..100 {
            critic.train(&states, &actions, &targets)?;
        }
        assert!(mse(&critic, &states, &actions, &targets)? < before);

        // the target network is untouched until a soft update
        let target_values = critic.target_predict(&states, &actions)?;
        let online_values = critic.predict(&states, &actions)?;
        assert_ne!(target_values.to_vec2::<f64>()?, online_values.to_vec2::<f64>()?);
        critic.target_update(1.0)?;
        assert_eq!(
            critic.target_predict(&states, &actions)?.to_vec2::<f64>()?,
            online_values.to_vec2::<f64>()?,
        );
        Ok(())
    }

    #[test]
    fn test_save_and_load_restore_predictions() -> Result<()> {
        let device = Device::Cpu;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("actor");

        let actor = MlpActor::new(&device, 3, 1, 8, 8, 1e-3, &[1.0], &[0.0])?;
        actor.save(&path)?;

        let mut restored = MlpActor::new(&device, 3, 1, 8, 8, 1e-3, &[1.0], &[0.0])?;
        restored.load(&path)?;

        let states = Tensor::randn(0f64, 1f64, (4, 3), &device)?;
        assert_eq!(
            actor.predict(&states)?.to_vec2::<f64>()?,
            restored.predict(&states)?.to_vec2::<f64>()?,
        );
        Ok(())
    }
}
