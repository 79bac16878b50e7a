use clap::Parser;
use tfmkit_cli::cli::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = cli.config.resolve()?;
    cli.command.run(&cfg)
}
