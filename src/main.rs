use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use patgen_tuner::config::Config;
use patgen_tuner::error::TunerResult;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with search settings; explicit flags override it.
    #[arg(global = true, long)]
    config_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tunes patgen parameters level by level and keeps the best patterns.
    Search(cmd::search::SearchArgs),
    /// N-fold cross-validation of the configured search.
    Validate(cmd::validate::ValidateArgs),
    /// Hyphenates words with an existing pattern file.
    Hyphenate(cmd::hyphenate::HyphenateArgs),
    /// Writes a patgen translation table for a wordlist.
    Translate(cmd::translate::TranslateArgs),
}

/// File values form the base; flags the user actually typed win.
fn resolve_config(
    cli_config: &Config,
    config_file: Option<&PathBuf>,
    sub_matches: &ArgMatches,
) -> TunerResult<Config> {
    let config = match config_file {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            let mut from_file = Config::load_from_file(path)?;
            from_file.merge_from_cli(cli_config, sub_matches);
            from_file
        }
        None => cli_config.clone(),
    };
    config.validate()?;
    Ok(config)
}

fn execute(cli: &Cli, matches: &ArgMatches) -> TunerResult<()> {
    let sub_matches = |name: &str| {
        matches
            .subcommand_matches(name)
            .cloned()
            .unwrap_or_default()
    };
    match &cli.command {
        Commands::Search(args) => {
            let config = resolve_config(
                &args.config,
                cli.config_file.as_ref(),
                &sub_matches("search"),
            )?;
            cmd::search::run(args, config)
        }
        Commands::Validate(args) => {
            let config = resolve_config(
                &args.config,
                cli.config_file.as_ref(),
                &sub_matches("validate"),
            )?;
            cmd::validate::run(args, config)
        }
        Commands::Hyphenate(args) => cmd::hyphenate::run(args),
        Commands::Translate(args) => cmd::translate::run(args),
    }
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = execute(&cli, &matches) {
        error!("{}", e);
        process::exit(1);
    }
}
