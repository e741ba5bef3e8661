//! Terminal client for PRMS staff.
//!
//! The non-browser consumer of the session/auth gateway: the same login
//! flow, credential store contract, and 401 handling as the dashboard, with
//! a JSON file standing in for browser storage.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};

use gateway_core::{
    ApiGateway, ApiRequest, CredentialStore, FileCredentialStore, LoginFlow, Navigator,
    SessionInvalidator, SubmitOutcome, LOGIN_PATH,
};

#[derive(Parser)]
#[command(name = "admin", about = "PRMS staff terminal client")]
struct Cli {
    /// Public origin of the dashboard edge
    #[arg(long, default_value = "http://localhost:3000")]
    origin: String,

    /// Session file (defaults to ~/.config/prms-admin/session.json)
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with phone number + one-time code
    Login,
    /// Show the signed-in identity
    Whoami,
    /// Discard the stored session
    Logout,
    /// List houses (a sample protected call)
    Houses,
}

/// Navigator for a terminal: there is no location bar, so a forced
/// navigation to login becomes a printed notice.
struct TerminalNavigator {
    location: Mutex<String>,
}

impl TerminalNavigator {
    fn new() -> Self {
        Self {
            location: Mutex::new("/".to_string()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn location(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    fn replace(&self, path: &str) {
        *self.location.lock().unwrap() = path.to_string();
        if path == LOGIN_PATH {
            eprintln!(
                "{}",
                style("Session expired. Run `admin login` to sign in again.").yellow()
            );
        }
    }
}

fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/prms-admin/session.json"),
        None => PathBuf::from(".prms-admin-session.json"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_file = cli.session_file.unwrap_or_else(default_session_file);
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(session_file));
    let navigator = Arc::new(TerminalNavigator::new());
    let invalidator = Arc::new(SessionInvalidator::new(store.clone(), navigator));
    let gateway = Arc::new(
        ApiGateway::new(&cli.origin, store.clone(), invalidator)
            .context("Failed to set up the gateway")?,
    );

    match cli.command {
        Commands::Login => login(gateway, store).await,
        Commands::Whoami => whoami(store).await,
        Commands::Logout => logout(store).await,
        Commands::Houses => houses(gateway).await,
    }
}

async fn login(gateway: Arc<ApiGateway>, store: Arc<dyn CredentialStore>) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut flow = LoginFlow::new(gateway, store);

    loop {
        let phone: String = Input::with_theme(&theme)
            .with_prompt("Phone number")
            .interact_text()?;
        match flow.submit_phone(&phone).await {
            SubmitOutcome::CodeSent => break,
            _ => {
                if let Some(error) = flow.error() {
                    eprintln!("{}", style(error).red());
                }
            }
        }
    }
    println!("Code sent to {}.", flow.phone_number());

    loop {
        let code: String = Input::with_theme(&theme)
            .with_prompt("6-digit code")
            .interact_text()?;
        match flow.submit_code(&code).await {
            SubmitOutcome::Authenticated => break,
            _ => {
                if let Some(error) = flow.error() {
                    eprintln!("{}", style(error).red());
                }
            }
        }
    }

    println!("{}", style("Signed in.").green());
    Ok(())
}

async fn whoami(store: Arc<dyn CredentialStore>) -> Result<()> {
    match store.get().await {
        Some(session) => {
            let role = serde_json::to_value(session.role)?;
            println!(
                "{} ({})",
                style(&session.user_id).bold(),
                role.as_str().unwrap_or("UNKNOWN")
            );
            Ok(())
        }
        None => {
            println!("Not signed in. Run `admin login`.");
            Ok(())
        }
    }
}

async fn logout(store: Arc<dyn CredentialStore>) -> Result<()> {
    store.clear().await.context("Failed to clear session")?;
    println!("Signed out.");
    Ok(())
}

async fn houses(gateway: Arc<ApiGateway>) -> Result<()> {
    let response = gateway
        .call(ApiRequest::get("/admin/houses/list"))
        .await
        .context("House listing failed")?;
    let body = response.text().await.context("Failed to read response")?;
    println!("{body}");
    Ok(())
}
