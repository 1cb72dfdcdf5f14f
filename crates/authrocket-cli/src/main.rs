//! authrocket - command-line client for the AuthRocket auth service.
//!
//! Logs in, registers and deletes accounts, and sends authenticated requests
//! using a token persisted between runs.

mod config;

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use authrocket_core::{ApiRequest, AuthError, AuthSession, Credentials, Method, TOKEN_KEY};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Config, Store};

const USAGE: &str = "\
Usage: authrocket <command>

Commands:
  register                     Create an account and sign in
  login [username]             Sign in
  whoami                       Show the signed-in user
  logout                       Forget the stored token
  delete <user-id>             Delete an account and sign out
  request <METHOD> <path> [json-body]
                               Send an authenticated request

Environment:
  AUTHROCKET_BASE_URL, AUTHROCKET_CLIENT_ID, AUTHROCKET_CLIENT_SECRET
  AUTHROCKET_TOKEN_STORE=file|keyring
  RUST_LOG=debug for request logging";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    if command == "-h" || command == "--help" {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    let store = config.store()?;
    let session = AuthSession::new(config.auth_config()?, store.shared())?;
    info!(command = %command, "authrocket starting");

    match command.as_str() {
        "register" => {
            let credentials = prompt_credentials(&config, None)?;
            session.register(&credentials).await?;
            remember_username(&mut config, &credentials.username);
            print_user(&session);
        }
        "login" => {
            let credentials = prompt_credentials(&config, args.get(1).map(String::as_str))?;
            session.login(&credentials).await?;
            remember_username(&mut config, &credentials.username);
            print_user(&session);
        }
        "whoami" => {
            resume(&session).await?;
            print_user(&session);
            if let Store::File(file_store) = &store {
                if let Ok(Some(stored_at)) = file_store.stored_at(TOKEN_KEY) {
                    println!("Token stored {}", stored_at.to_rfc3339());
                }
            }
        }
        "logout" => {
            session.logout();
            println!("Signed out");
        }
        "delete" => {
            let user_id: i64 = args
                .get(1)
                .context("delete needs a user id")?
                .parse()
                .context("user id must be a number")?;
            resume(&session).await?;
            session.delete_user(user_id).await?;
            println!("Deleted user {}", user_id);
        }
        "request" => {
            let (Some(method), Some(path)) = (args.get(1), args.get(2)) else {
                bail!("request needs a method and a path");
            };
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method: {}", method))?;
            let mut request = ApiRequest::new(method, path.as_str());
            if let Some(body) = args.get(3) {
                let body: serde_json::Value =
                    serde_json::from_str(body).context("request body must be JSON")?;
                request = request.json(body);
            }

            resume(&session).await?;
            match session.authenticated_request::<serde_json::Value>(request).await {
                Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
                Err(AuthError::Request(e)) if e.is_unauthorized() => {
                    bail!("Session expired, please log in again")
                }
                Err(e) => return Err(e.into()),
            }
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Restore the session from the stored token, if there is one
async fn resume(session: &AuthSession) -> Result<()> {
    match session.resume().await? {
        Some(_) => Ok(()),
        None => bail!("Not signed in. Run `authrocket login` first."),
    }
}

fn print_user(session: &AuthSession) {
    match session.get_user().borrow().as_ref() {
        Some(user) => println!("Signed in as {}", user.display_name()),
        None => println!("Not signed in"),
    }
}

fn remember_username(config: &mut Config, username: &str) {
    config.last_username = Some(username.to_string());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }
}

fn prompt_credentials(config: &Config, username: Option<&str>) -> Result<Credentials> {
    let username = match username {
        Some(name) => name.to_string(),
        None => prompt_username(config.last_username.as_deref())?,
    };
    if username.is_empty() {
        bail!("username is required");
    }

    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    Ok(Credentials::new(username, password))
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let entered = line.trim();

    Ok(match (entered.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => entered.to_string(),
    })
}
