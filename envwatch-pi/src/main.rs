use clap::Parser;
use envwatch_pi::cli;
use log::LevelFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = cli::Cli::parse();

    let log_level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Err(e) = cli::init_logger(log_level) {
        eprintln!("warning: could not initialize logging: {}", e);
    }

    if let Err(e) = cli::run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
