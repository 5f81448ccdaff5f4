use {
    anyhow::Result,
    clap::Parser,
    td3_rl::cli::{
        run_from_args,
        Args,
    },
};

fn main() -> Result<()> {
    run_from_args(Args::parse())
}
