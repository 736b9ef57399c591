use std::{env, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use codemeta_cli::{
    commands::{self, build_engine, default_form},
    config::init,
    errors::CliError,
};
use codemeta_generator::CodemetaVersion;
use tracing::{Level, event};
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Generates, imports and validates codemeta.json files
#[derive(Parser, Debug)]
#[command(name = "codemeta", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to conf/codemeta-conf.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate codemeta.json from the form
    Generate {
        #[arg(long, default_value_os_t = default_form())]
        form: PathBuf,
        /// CodeMeta version to generate (2.0 or 3.0)
        #[arg(long)]
        codemeta_version: Option<CodemetaVersion>,
        /// Write the document here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import a codemeta.json file into the form
    Import {
        #[arg(long, short)]
        input: PathBuf,
        #[arg(long, default_value_os_t = default_form())]
        form: PathBuf,
    },
    /// Check a codemeta.json file
    Validate {
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Re-import the last generated document into the form
    Restore {
        #[arg(long, default_value_os_t = default_form())]
        form: PathBuf,
    },
    /// Fill the form from a source code repository
    Fetch {
        /// Repository URL (defaults to repository.default_repository)
        #[arg(long, short)]
        repo: Option<String>,
        #[arg(long, default_value_os_t = default_form())]
        form: PathBuf,
        /// Also generate codemeta.json in this version
        #[arg(long)]
        codemeta_version: Option<CodemetaVersion>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // The level can be changed in the config file
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::TRACE.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(env::var("LOCAL").is_ok())
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    match run(args, reload_handle).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            event!(Level::DEBUG, "command failed: {:?}", err);
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    args: Args,
    reload_handle: reload::Handle<LevelFilter, tracing_subscriber::Registry>,
) -> Result<(), CliError> {
    let config = init(args.config.as_deref(), Some(reload_handle))?;
    let engine = build_engine(&config).await?;

    match args.command {
        Command::Generate {
            form,
            codemeta_version,
            output,
        } => {
            let version = codemeta_version.unwrap_or(config.default_version);
            commands::generate(&engine, &form, version, output.as_deref()).await
        }
        Command::Import { input, form } => commands::import(&engine, &input, &form).await,
        Command::Validate { input } => {
            let text = commands::read_input(&input).await?;
            commands::validate(&engine, &text)
        }
        Command::Restore { form } => commands::restore(&engine, &form).await,
        Command::Fetch {
            repo,
            form,
            codemeta_version,
        } => commands::fetch(&engine, &config, repo, &form, codemeta_version).await,
    }
}
