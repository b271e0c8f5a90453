use clap::Parser;
use tradejournal::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    tradejournal::logging::init_logging(cli.verbose);
    run(cli)
}
