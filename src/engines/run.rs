use {
    crate::{
        agents::{
            OffPolicyAlgorithm,
            RunMode,
        },
        configs::TrainConfig,
        envs::Environment,
    },
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::Rng,
    tracing::{
        info,
        warn,
    },
};


/// Run a single training (or test) run on an environment with an off-policy
/// algorithm.
///
/// In [`RunMode::Train`] every transition is stored, the exploration noise is
/// reset at the start of each episode and `training_iterations` training ticks
/// follow each episode. The first `initial_random_actions` actions are sampled
/// uniformly from the action space instead of taken from the agent.
///
/// Returns the undiscounted return and whether the episode terminated (rather
/// than being truncated) for every episode.
///
/// # Arguments
///
/// * `env` - The environment to train on.
/// * `alg` - The agent to train with.
/// * `config` - The configuration for the run.
/// * `device` - The device to run on.
pub fn loop_off_policy<Alg, Env>(
    env: &mut Env,
    alg: &mut Alg,
    config: TrainConfig,
    device: &Device,
) -> Result<(Vec<f64>, Vec<bool>)>
where
    Env: Environment,
    Alg: OffPolicyAlgorithm,
{
    let action_space = env.action_space();
    warn!("action space: {:?}", action_space);
    warn!("observation space: {:?}", env.observation_space());

    let run_mode = config.run_mode();
    alg.set_run_mode(run_mode);

    let mut steps_taken = 0;
    let mut mc_returns = Vec::new();
    let mut successes = Vec::new();
    let mut rng = rand::thread_rng();

    for episode in 0..config.max_episodes() {
        let mut total_reward = 0.0;
        env.reset(rng.gen::<u64>())?;
        alg.reset_noise()?;

        loop {
            let state = Tensor::new(env.current_observation().as_slice(), device)?;

            // select an action, or randomly sample one
            let action = if run_mode == RunMode::Train && steps_taken < config.initial_random_actions() {
                Tensor::new(action_space.sample(&mut rng).as_slice(), device)?
            } else {
                alg.actions(&state)?
            };

            let step = env.step(&action.to_vec1::<f64>()?)?;
            total_reward += step.reward;
            steps_taken += 1;

            if run_mode == RunMode::Train {
                alg.remember(
                    &state,
                    &action,
                    step.reward,
                    &Tensor::new(step.observation.as_slice(), device)?,
                    step.terminated,
                )?;
            }

            if step.terminated || step.truncated {
                successes.push(step.terminated);
                break;
            }
        }

        warn!("episode {episode} with total reward of {total_reward}");
        mc_returns.push(total_reward);

        if run_mode == RunMode::Train {
            for _ in 0..config.training_iterations() {
                alg.train()?;
            }
            info!("{} transitions in memory after episode {episode}", alg.memory().size());
        }
    }
    Ok((mc_returns, successes))
}
