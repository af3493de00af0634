//! `portal-cli`: drive the portal's session bridge from a terminal.
//!
//! Session and profile cache persist in a JSON state file so consecutive
//! invocations behave like page reloads.

mod file_store;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use portal::config::{ConfigError, SupabaseConfig, Timeouts};
use portal::session::{BridgeDeps, Navigator, Notifier, SessionBridge, SessionState};
use portal::storage::{KeyValueStore, StoredProfileCache};
use portal::supabase::SupabaseClient;
use portal::{AppError, tenant};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::file_store::FileStore;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{}", .0.friendly_message())]
    App(#[from] AppError),
    #[error("invitation token did not resolve to a user")]
    NoInvitedUser,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal-cli", about = "Portal auth and tenant CLI")]
struct Cli {
    /// Project URL. Without it, `SUPABASE_*` environment variables are read.
    #[arg(long, requires = "anon_key")]
    url: Option<String>,

    #[arg(long, requires = "url")]
    anon_key: Option<String>,

    #[arg(long)]
    request_timeout_secs: Option<u64>,

    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    #[arg(long, env = "PORTAL_STATE_FILE", default_value = ".portal-state.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    SignIn(SignInArgs),
    SignUp(SignUpArgs),
    SignOut,
    Whoami,
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        redirect_to: Option<String>,
    },
    SetupAccount(SetupAccountArgs),
    Tenant {
        tenant_id: Uuid,
    },
}

#[derive(Args, Debug)]
struct SignInArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct SignUpArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
}

#[derive(Args, Debug)]
struct SetupAccountArgs {
    #[arg(long)]
    token: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to `--password`.
    #[arg(long)]
    confirm: Option<String>,
}

// =============================================================================
// TERMINAL EFFECTS
// =============================================================================

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Route changes have no terminal counterpart; they are only logged.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigate");
    }
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let storage: Rc<dyn KeyValueStore> = Rc::new(FileStore::new(&cli.state_file));
    let client = Rc::new(SupabaseClient::new(config)?.with_storage(storage.clone()));
    client.restore();

    let bridge = SessionBridge::new(BridgeDeps {
        auth: client.clone(),
        store: client.clone(),
        cache: Rc::new(StoredProfileCache::new(storage)),
        notifier: Rc::new(TerminalNotifier),
        navigator: Rc::new(TerminalNavigator),
    });

    let result = run_command(&bridge, client.as_ref(), cli.command).await;
    bridge.teardown();
    result
}

/// Explicit flags win over the environment; timeout flags override either.
fn resolve_config(cli: &Cli) -> Result<SupabaseConfig, ConfigError> {
    let config = match (&cli.url, &cli.anon_key) {
        (Some(url), Some(anon_key)) => SupabaseConfig::new(url, anon_key)?,
        _ => SupabaseConfig::from_env()?,
    };
    let timeouts = Timeouts {
        request_secs: cli.request_timeout_secs.unwrap_or(config.timeouts.request_secs),
        connect_secs: cli.connect_timeout_secs.unwrap_or(config.timeouts.connect_secs),
    };
    Ok(config.with_timeouts(timeouts))
}

async fn run_command(bridge: &SessionBridge, client: &SupabaseClient, command: Command) -> Result<(), CliError> {
    match command {
        Command::SignIn(args) => {
            bridge.sign_in(&args.email, &args.password).await?;
            sync_and_print(bridge).await
        }
        Command::SignUp(args) => {
            bridge
                .sign_up(&args.email, &args.password, &args.first_name, &args.last_name)
                .await?;
            Ok(())
        }
        Command::SignOut => {
            bridge.sign_out().await;
            Ok(())
        }
        Command::Whoami => sync_and_print(bridge).await,
        Command::ResetPassword { email, redirect_to } => {
            bridge.request_password_reset(&email, redirect_to.as_deref()).await?;
            Ok(())
        }
        Command::SetupAccount(args) => {
            let email = bridge
                .set_session_from_token(&args.token)
                .await?
                .ok_or(CliError::NoInvitedUser)?;
            println!("setting password for {email}");
            let confirm = args.confirm.as_deref().unwrap_or(&args.password);
            bridge.update_password(&args.password, confirm).await?;
            Ok(())
        }
        Command::Tenant { tenant_id } => {
            let tenant = tenant::load_tenant(client, tenant_id).await?;
            println!("{}", serde_json::to_string_pretty(&tenant)?);
            Ok(())
        }
    }
}

/// Reconcile the bridge with the persisted session (fetching the profile) and
/// print who is signed in.
async fn sync_and_print(bridge: &SessionBridge) -> Result<(), CliError> {
    bridge.load_initial_session().await;
    let state = bridge.state();
    println!("{}", serde_json::to_string_pretty(&whoami_json(&state))?);
    Ok(())
}

fn whoami_json(state: &SessionState) -> serde_json::Value {
    let Some(user) = &state.user else {
        return serde_json::json!({ "signed_in": false });
    };
    serde_json::json!({
        "signed_in": true,
        "user_id": user.id,
        "email": user.email,
        "profile": state.profile,
    })
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
