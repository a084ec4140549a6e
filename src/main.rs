use clap::Parser;

use isodiff::cli::{self, CliArgs};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
