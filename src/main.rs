use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use morpheus_provider::config::Config;
use morpheus_provider::morpheus::client::MorpheusClient;
use morpheus_provider::morpheus::error::ApiError;
use morpheus_provider::morpheus::http::format_api_error;
use morpheus_provider::resource::{self, LocalState, ResourceError, ResourceRegistry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Morpheus library records declaratively
#[derive(Parser, Debug)]
#[command(name = "morpheus-provider", version, about, long_about = None)]
struct Args {
    /// Morpheus appliance URL
    #[arg(long, global = true, env = "MORPHEUS_API_URL")]
    url: Option<String>,

    /// Pre-issued API access token
    #[arg(long, global = true, env = "MORPHEUS_API_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Username for the password grant
    #[arg(long, global = true, env = "MORPHEUS_API_USERNAME")]
    username: Option<String>,

    /// Password for the password grant
    #[arg(long, global = true, env = "MORPHEUS_API_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported resource types
    Resources,
    /// Print the field table of one or every resource type
    Schema { resource_type: Option<String> },
    /// Check a configuration document without contacting the appliance
    Validate { resource_type: String, config: PathBuf },
    /// Show the planned state and the changes against an existing state
    Plan {
        resource_type: String,
        config: PathBuf,
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Create a record from a configuration document
    Create { resource_type: String, config: PathBuf },
    /// Refresh a state document from the appliance
    Read { resource_type: String, state: PathBuf },
    /// Converge an existing record to a configuration document
    Update {
        resource_type: String,
        state: PathBuf,
        config: PathBuf,
    },
    /// Delete the record behind a state document
    Delete { resource_type: String, state: PathBuf },
    /// Build a state document for an existing record id
    Import { resource_type: String, id: String },
    /// Save the appliance URL and username as defaults
    Configure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("morpheus-provider started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("morpheus-provider")
            .join("morpheus-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".morpheus-provider").join("morpheus-provider.log");
    }
    PathBuf::from("morpheus-provider.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", describe_error(&err));
        std::process::exit(1);
    }
}

/// User facing message, preferring the API status when one is involved
fn describe_error(err: &anyhow::Error) -> String {
    match err.chain().find_map(|e| e.downcast_ref::<ApiError>()) {
        Some(api_err) => format!("{:#}\n{}", err, format_api_error(api_err)),
        None => format!("{:#}", err),
    }
}

fn cli_overrides(args: &Args) -> Config {
    Config {
        url: args.url.clone(),
        access_token: args.access_token.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
    }
}

fn connect(args: &Args) -> Result<ResourceRegistry> {
    let config = Config::load().merged(cli_overrides(args));
    let url = config.effective_url()?;
    let client = MorpheusClient::new(url, config.auth_method()?)
        .with_context(|| format!("Invalid Morpheus URL '{}'", url))?;
    tracing::info!("Using Morpheus appliance {}", client.base_url);
    Ok(ResourceRegistry::for_client(&client))
}

fn schema_for(resource_type: &str) -> Result<&'static resource::Schema> {
    resource::get_schema(resource_type)
        .ok_or_else(|| ResourceError::UnknownResource(resource_type.to_string()).into())
}

async fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::Resources => {
            for name in resource::get_all_type_names() {
                println!("{}", name);
            }
        }
        Command::Schema { resource_type } => match resource_type {
            Some(resource_type) => print_json(schema_for(resource_type)?)?,
            None => print_json(&resource::get_schemas().values().collect::<Vec<_>>())?,
        },
        Command::Validate {
            resource_type,
            config,
        } => {
            let config: LocalState = read_document(config)?;
            schema_for(resource_type)?.validate(&config)?;
            println!("Configuration is valid");
        }
        Command::Plan {
            resource_type,
            config,
            state,
        } => {
            let schema = schema_for(resource_type)?;
            let config: LocalState = read_document(config)?;
            let prior = state
                .as_deref()
                .map(read_document::<LocalState>)
                .transpose()?;

            schema.validate(&config)?;
            let planned = schema.plan(prior.as_ref(), &config);
            let changes = schema.diff(&prior.unwrap_or_default(), &planned);
            print_json(&serde_json::json!({
                "planned": planned,
                "changes": changes.to_report(),
            }))?;
        }
        Command::Create {
            resource_type,
            config,
        } => {
            let config: LocalState = read_document(config)?;
            let registry = connect(&args)?;
            let created = registry.get(resource_type)?.create(&config).await?;
            print_json(&created)?;
        }
        Command::Read {
            resource_type,
            state,
        } => {
            let state: LocalState = read_document(state)?;
            let registry = connect(&args)?;
            let refreshed = registry.get(resource_type)?.read(&state).await?;
            print_json(&refreshed)?;
        }
        Command::Update {
            resource_type,
            state,
            config,
        } => {
            let prior: LocalState = read_document(state)?;
            let config: LocalState = read_document(config)?;
            let registry = connect(&args)?;
            let updated = registry
                .get(resource_type)?
                .update(&prior, &config)
                .await?;
            print_json(&updated)?;
        }
        Command::Delete {
            resource_type,
            state,
        } => {
            let state: LocalState = read_document(state)?;
            let registry = connect(&args)?;
            let deleted = registry.get(resource_type)?.delete(&state).await?;
            print_json(&deleted)?;
        }
        Command::Import { resource_type, id } => {
            let registry = connect(&args)?;
            let handler = registry.get(resource_type)?;
            let seeded = handler.import_state(id)?;
            let imported = handler.read(&seeded).await?;
            print_json(&imported)?;
        }
        Command::Configure => {
            let config = Config::load().merged(cli_overrides(&args));
            config.effective_url()?;
            config.save()?;
            println!("Saved {:?}", config);
        }
    }

    Ok(())
}

/// Read a JSON document, or YAML when the extension says so
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {:?}", path))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
