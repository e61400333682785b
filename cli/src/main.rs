use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use fitout::{ApiClient, ApiError, AuthState, ClientConfig, ConfigError, Criteria, FileStore};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("invalid criterion `{0}`; expected key=value")]
    InvalidCriterion(String),
}

#[derive(Parser, Debug)]
#[command(name = "fitout-cli", about = "FitOut Control API client")]
struct Cli {
    /// API origin; overrides every other source.
    #[arg(long)]
    api_url: Option<String>,

    /// File holding the persisted session.
    #[arg(long, env = "FITOUT_SESSION_FILE", default_value = ".fitout-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the absolute URL a path resolves to.
    Url { path: String },
    Auth(AuthCommand),
    Entity(EntityCommand),
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FITOUT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FITOUT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },
    Logout,
    Me,
    /// Remove the token and every cached identity field.
    Clear,
}

#[derive(Args, Debug)]
struct EntityCommand {
    /// Resource name, e.g. `empreendimentos`.
    resource: String,

    #[command(subcommand)]
    command: EntitySubcommand,
}

#[derive(Subcommand, Debug)]
enum EntitySubcommand {
    List {
        #[arg(long)]
        order: Option<String>,
    },
    Filter {
        /// Repeatable `key=value` criterion.
        #[arg(long = "where", value_name = "KEY=VALUE")]
        criteria: Vec<String>,
        #[arg(long)]
        order: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.sources.configured = Some(url);
    }

    let store = Arc::new(FileStore::open(&cli.session_file));
    let client = ApiClient::new(&config, store)?;
    tracing::debug!(
        base = client.base(),
        session_file = %cli.session_file.display(),
        "cli ready"
    );

    match cli.command {
        Command::Url { path } => {
            println!("{}", client.api_url(&path));
            Ok(())
        }
        Command::Auth(auth) => run_auth(&client, auth).await,
        Command::Entity(entity) => run_entity(&client, entity).await,
    }
}

async fn run_auth(client: &ApiClient, auth: AuthCommand) -> Result<(), CliError> {
    let session = client.auth();
    match auth.command {
        AuthSubcommand::Login { email, password } => {
            let profile = session.login(&email, &password).await?;
            print_json(&serde_json::to_value(profile)?)
        }
        AuthSubcommand::Register {
            email,
            password,
            name,
        } => {
            session.register(&email, &password, &name).await?;
            print_json(&json!({ "registered": email }))
        }
        AuthSubcommand::Logout => {
            session.logout();
            Ok(())
        }
        AuthSubcommand::Me => print_json(&render_auth_state(&session.me().await)?),
        AuthSubcommand::Clear => {
            session.clear_session();
            Ok(())
        }
    }
}

async fn run_entity(client: &ApiClient, entity: EntityCommand) -> Result<(), CliError> {
    let handle = client.entity(entity.resource);
    let json = match entity.command {
        EntitySubcommand::List { order } => Value::Array(handle.list(order.as_deref()).await?),
        EntitySubcommand::Filter { criteria, order } => {
            let criteria = parse_criteria(&criteria)?;
            Value::Array(handle.filter(&criteria, order.as_deref()).await?)
        }
        EntitySubcommand::Get { id } => handle.get(&id).await?,
        EntitySubcommand::Create { data } => {
            handle.create(&parse_payload(&data)?).await?
        }
        EntitySubcommand::Update { id, data } => {
            handle.update(&id, &parse_payload(&data)?).await?
        }
        EntitySubcommand::Delete { id } => handle.delete(&id).await?,
    };
    print_json(&json)
}

fn parse_payload(raw: &str) -> Result<Value, CliError> {
    serde_json::from_str(raw).map_err(CliError::InvalidJson)
}

/// Parse `key=value` pairs. Values that read as JSON scalars keep their
/// type; anything else is a string. `key=` yields an empty string, which
/// the filter drops.
fn parse_criteria(raw: &[String]) -> Result<Criteria, CliError> {
    let mut criteria = Criteria::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CliError::InvalidCriterion(entry.clone()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::InvalidCriterion(entry.clone()));
        }
        let value = match serde_json::from_str::<Value>(value) {
            Ok(parsed @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => parsed,
            _ => Value::String(value.to_owned()),
        };
        criteria.insert(key.to_owned(), value);
    }
    Ok(criteria)
}

fn render_auth_state(state: &AuthState) -> Result<Value, CliError> {
    Ok(match state {
        AuthState::Anonymous => json!({ "trust": "anonymous", "user": null }),
        AuthState::Verified(user) => json!({ "trust": "verified", "user": serde_json::to_value(user)? }),
        AuthState::Degraded(snapshot) => json!({ "trust": "degraded", "user": serde_json::to_value(snapshot)? }),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
