// ABOUTME: CLI auth command - store, remove, and inspect the GitHub access token

use anyhow::Result;
use serde_json::json;

use super::{AuthCommand, OutputFormat};
use repoterm::credentials::{self, mask_token};

pub fn execute(command: AuthCommand, format: OutputFormat) -> Result<()> {
    match command {
        AuthCommand::Login { token } => {
            credentials::store_github_token(&token)?;
            println!("Token stored in system keychain ({})", mask_token(token.trim()));
        }
        AuthCommand::Logout => {
            credentials::delete_github_token()?;
            println!("Stored token removed");
        }
        AuthCommand::Status => {
            let resolved = credentials::resolve_token(None)?;
            match format {
                OutputFormat::Text => match &resolved {
                    Some((token, source)) => println!("Token {} (from {})", mask_token(token), source),
                    None => println!("No token configured"),
                },
                OutputFormat::Json => {
                    let status = json!({
                        "configured": resolved.is_some(),
                        "source": resolved.as_ref().map(|(_, s)| s.to_string()),
                        "token": resolved.as_ref().map(|(t, _)| mask_token(t)),
                    });
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
            }
        }
    }
    Ok(())
}
