use crate::client::clients;
use crate::{LoaderSettings, Metadata, SecretsManagerLoader};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Main CLI structure for the secretsmanager-loader application.
#[derive(Parser)]
#[command(name = "secretsmanager-loader")]
#[command(about = "Load service configuration from versioned secrets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Loader settings shared by every subcommand.
///
/// Precedence is flag, then environment variable, then settings file.
/// Environment variables are resolved by [`LoaderSettings::from_env`] so the
/// region falls back to `AWS_DEFAULT_REGION` the same way the library does.
#[derive(Args, Default)]
struct SettingsArgs {
    /// Deployment label used in the storage key [env: SECRETSMANAGER_ENVIRONMENT]
    #[arg(short, long, global = true)]
    environment: Option<String>,
    /// Credential profile for client acquisition [env: AWS_PROFILE]
    #[arg(short, long, global = true)]
    profile: Option<String>,
    /// Target region for client acquisition [env: AWS_REGION, AWS_DEFAULT_REGION]
    #[arg(short, long, global = true)]
    region: Option<String>,
    /// Client backend URI, e.g. aws:// or file:///srv/secrets [env: SECRETSMANAGER_CLIENT]
    #[arg(short, long, global = true)]
    client: Option<String>,
    /// Settings file to read instead of the default location
    #[arg(long, global = true, env = "SECRETSMANAGER_SETTINGS")]
    settings: Option<PathBuf>,
}

/// Available commands for the secretsmanager-loader CLI.
#[derive(Subcommand)]
enum Commands {
    /// Load the configuration of a service and print it as JSON
    Load {
        /// Name of the service
        service: String,
        /// Version stage to read instead of the current version
        #[arg(long, value_name = "STAGE")]
        version_stage: Option<String>,
        /// Treat the service as running in debug mode
        #[arg(long)]
        debug: bool,
        /// Treat the service as running under test
        #[arg(long)]
        testing: bool,
    },
    /// Print the storage key of a service
    Keyname {
        /// Name of the service
        service: String,
    },
    /// List the available client backends
    Clients,
    /// Show the resolved loader settings
    Settings,
}

/// Resolves loader settings from flags, then `env`, then the settings file.
fn resolve_settings(args: &SettingsArgs, env: LoaderSettings) -> Result<LoaderSettings> {
    let mut settings = LoaderSettings {
        environment: args.environment.clone(),
        profile_name: args.profile.clone(),
        region: args.region.clone(),
        client: args.client.clone(),
    };
    settings.merge_with(env);

    let file_settings = match &args.settings {
        Some(path) => Some(read_settings(path)?),
        None => LoaderSettings::load_default().wrap_err("Failed to read default settings file")?,
    };
    if let Some(file_settings) = file_settings {
        settings.merge_with(file_settings);
    }

    Ok(settings)
}

fn read_settings(path: &Path) -> Result<LoaderSettings> {
    LoaderSettings::try_from(path)
        .wrap_err_with(|| format!("Failed to read settings file {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli.settings, LoaderSettings::from_env())?;

    match cli.command {
        // Fetch, decode and print the config sub-tree
        Commands::Load {
            service,
            version_stage,
            debug,
            testing,
        } => {
            let metadata = Metadata::new(service)
                .with_debug(debug)
                .with_testing(testing);
            let loader = SecretsManagerLoader::from_settings(settings);
            let config = loader
                .load(&metadata, version_stage.as_deref())
                .wrap_err_with(|| format!("Failed to load configuration for '{}'", metadata.name))?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(config))?
            );
            Ok(())
        }
        Commands::Keyname { service } => {
            let loader = SecretsManagerLoader::from_settings(settings);
            println!("{}", loader.keyname(&service)?);
            Ok(())
        }
        Commands::Clients => {
            for info in clients() {
                println!("{}", info.display_with_examples());
            }
            Ok(())
        }
        // Display the settings the loader would be built with
        Commands::Settings => {
            if settings == LoaderSettings::default() {
                eprintln!(
                    "No settings found. Pass --environment or set SECRETSMANAGER_ENVIRONMENT."
                );
                return Ok(());
            }
            print!("{}", toml::to_string(&settings)?);
            Ok(())
        }
    }
}
