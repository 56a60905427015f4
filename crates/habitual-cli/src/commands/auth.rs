use clap::Subcommand;
use habitual_core::credentials::{self, keyring_store, OPENAI_API_KEY_ENTRY, OPENAI_API_KEY_ENV};

use super::CommandResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the OpenAI API key in the OS keyring
    Login {
        /// API key
        #[arg(long)]
        token: String,
    },
    /// Remove the stored key
    Logout,
    /// Check whether a key is available
    Status,
}

pub fn run(action: AuthAction) -> CommandResult {
    match action {
        AuthAction::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("token must not be empty".into());
            }
            keyring_store::set(OPENAI_API_KEY_ENTRY, token)?;
            println!("OpenAI API key saved.");
        }
        AuthAction::Logout => {
            keyring_store::delete(OPENAI_API_KEY_ENTRY)?;
            println!("OpenAI API key removed.");
        }
        AuthAction::Status => {
            let from_env = std::env::var(OPENAI_API_KEY_ENV)
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false);
            let status = if from_env {
                format!("authenticated (from {OPENAI_API_KEY_ENV})")
            } else if credentials::openai_api_key().is_ok() {
                "authenticated (keyring)".to_string()
            } else {
                "not authenticated".to_string()
            };
            println!("openai: {status}");
        }
    }
    Ok(())
}
