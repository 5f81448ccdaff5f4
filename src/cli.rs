use {
    crate::{
        agents::{
            ConfigurableAlgorithm,
            Ddpg,
            OffPolicyAlgorithm,
            SaveableAlgorithm,
            Td3,
        },
        configs::{
            ActorCriticConfig,
            DDPG_Config,
            OffPolicyConfig,
            TD3_Config,
            TrainConfig,
        },
        engines::run_experiment_off_policy,
        envs::{
            PendulumConfig,
            PendulumEnv,
        },
        logging::setup_logging,
        util::read_config,
    },
    anyhow::Result,
    candle_core::Device,
    clap::{
        Parser,
        ValueEnum,
    },
    serde::{
        de::DeserializeOwned,
        Serialize,
    },
    std::path::{
        Path,
        PathBuf,
    },
    tracing::{
        warn,
        Level,
    },
};


#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alg {
    Ddpg,
    Td3,
}
impl Alg {
    pub fn name(&self) -> &str {
        match self {
            Alg::Ddpg => "ddpg",
            Alg::Td3 => "td3",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    Cpu,
    Gpu,
}
impl DeviceArg {
    /// Falls back to the CPU when no GPU is available.
    pub fn device(&self) -> Result<Device> {
        Ok(match self {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Gpu => Device::cuda_if_available(0)?,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    Debug, // every training tick
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::Debug => Some(Level::DEBUG),
            Loglevel::None => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The algorithm to train.
    #[arg(long, value_enum, default_value_t=Alg::Td3)]
    pub alg: Alg,

    /// The device to run on.
    #[arg(long, value_enum, default_value_t=DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::Warn)]
    pub log: Loglevel,

    /// Name of the experiment, the data is written to `data/<name>`.
    #[arg(long, default_value = "pendulum")]
    pub name: String,

    /// RON file with the algorithm config, defaults are used otherwise.
    #[arg(long)]
    pub alg_config: Option<PathBuf>,

    /// RON file with the training config, defaults are used otherwise.
    #[arg(long)]
    pub train_config: Option<PathBuf>,

    /// Number of identical runs.
    #[arg(long, default_value_t = 1)]
    pub runs: usize,

    /// Use prioritized experience replay.
    #[arg(long, conflicts_with = "no_per")]
    pub per: bool,

    /// Use uniform experience replay.
    #[arg(long)]
    pub no_per: bool,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub gamma: Option<f64>,

    #[arg(long)]
    pub tau: Option<f64>,
}
impl Args {
    /// Apply the command line overrides on top of a config.
    pub fn override_config<C: ActorCriticConfig + OffPolicyConfig>(
        &self,
        config: &mut C,
    ) {
        if self.per {
            config.set_prioritized_replay(true);
        }
        if self.no_per {
            config.set_prioritized_replay(false);
        }
        if let Some(batch_size) = self.batch_size {
            config.set_training_batch_size(batch_size);
        }
        if let Some(gamma) = self.gamma {
            config.set_gamma(gamma);
        }
        if let Some(tau) = self.tau {
            config.set_tau(tau);
        }
    }
}

fn load_or<C: DeserializeOwned>(
    path: &Option<PathBuf>,
    default: impl FnOnce() -> C,
) -> Result<C> {
    match path {
        Some(path) => read_config(path),
        None => Ok(default()),
    }
}

fn run<Alg>(
    args: &Args,
    mut config: Alg::Config,
    device: &Device,
) -> Result<()>
where
    Alg: ConfigurableAlgorithm + OffPolicyAlgorithm + SaveableAlgorithm,
    Alg::Config: ActorCriticConfig + OffPolicyConfig + Clone + Serialize,
{
    args.override_config(&mut config);
    let train_config = load_or(&args.train_config, TrainConfig::pendulum)?;

    run_experiment_off_policy::<Alg, PendulumEnv>(
        &Path::new("data").join(&args.name),
        args.runs,
        PendulumConfig::default(),
        config,
        train_config,
        None,
        device,
    )
}

/// Set up logging and run the experiment the arguments describe.
pub fn run_from_args(args: Args) -> Result<()> {
    setup_logging(
        &Path::new("data").join(format!("{}.log", args.name)),
        args.log.level(),
        args.log.level(),
    )?;
    let device = args.device.device()?;
    warn!("Running {} on {:?}", args.alg.name(), device);

    match args.alg {
        Alg::Ddpg => {
            let config = load_or(&args.alg_config, DDPG_Config::pendulum)?;
            run::<Ddpg>(&args, config, &device)
        }
        Alg::Td3 => {
            let config = load_or(&args.alg_config, TD3_Config::pendulum)?;
            run::<Td3>(&args, config, &device)
        }
    }
}
