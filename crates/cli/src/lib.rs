pub mod commands;
pub mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use creditgate_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "creditgate",
    about = "Credit facility approval calculator",
    long_about = "Determine which authority must approve a change to a customer's credit exposure.",
    after_help = concat!(
        "Examples:\n",
        "  creditgate decide --previous-total 28000000 --new-total 31000000 ",
        "--approved-by-credit-before\n",
        "  creditgate decide --request request.json --json\n",
        "  creditgate config",
    )
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Path to a creditgate.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute the required approver for a proposed exposure change")]
    Decide(commands::decide::DecideArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = load_options(cli.config);

    let result = match cli.command {
        Command::Decide(args) => match AppConfig::load(options) {
            Ok(config) => {
                init_logging(&config);
                commands::decide::run(&args, &config)
            }
            Err(error) => commands::CommandResult::failure(
                "decide",
                "config_validation",
                error.to_string(),
                commands::EXIT_CONFIG,
            ),
        },
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn load_options(config_path: Option<PathBuf>) -> LoadOptions {
    LoadOptions {
        require_file: config_path.is_some(),
        config_path,
        overrides: ConfigOverrides::default(),
    }
}

/// Logs go to stderr so stdout stays parseable.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
