mod experiment;
mod run;

pub use experiment::run_experiment_off_policy;
pub use run::loop_off_policy;
