use clap::{Arg, Command};
use dotenv::dotenv;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

use twingen::{report, Config};

mod cli;

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let matches = build_cli().get_matches();

    if let Err(e) = run_command(matches) {
        report::error(&e.to_string());
        process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("twingen")
        .version("0.1.0")
        .about("Sync/async API parity checker and generator for the pgmq client")
        .long_about(
            "Detects public blocking methods without a non-blocking twin and \
             mechanically generates the missing async variants",
        )
        .arg_required_else_help(true)
        .subcommand(
            Command::new("check")
                .about("Fail when any public sync method lacks its async twin")
                .long_about(
                    "Scans the target impl block and exits 1 when sync/async APIs \
                     have drifted out of parity. Intended as a pre-commit / CI gate.",
                )
                .arg(
                    Arg::new("target")
                        .help("Configured target to check (e.g. queue, operation)")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate missing async twins and offer to apply them")
                .arg(
                    Arg::new("target")
                        .help("Configured target to generate for")
                        .required(true)
                        .index(1),
                ),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .help("Directory containing twingen.toml")
                .global(true),
        )
}

fn run_command(matches: clap::ArgMatches) -> anyhow::Result<()> {
    let config = match matches.get_one::<String>("config-dir") {
        Some(dir) => Config::load_from_dir(Path::new(dir))?,
        None => Config::load()?,
    };
    init_tracing(&config);

    match matches.subcommand() {
        Some(("check", sub_matches)) => cli::commands::check::handle_check(sub_matches, &config),
        Some(("generate", sub_matches)) => {
            cli::commands::generate::handle_generate(sub_matches, &config)
        }
        _ => {
            unreachable!("Command parsing should ensure we never reach this");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
