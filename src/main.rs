mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    cli::run(&args)
}
