//! `login` / `logout`: manage the saved endpoint and token.

use std::io::BufRead;

use secrecy::SecretString;

use nexview_config::TokenStorage;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::commands;
use crate::error::CliError;

fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ")?
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = commands::load_config(global)?;
    let endpoint = nexview_config::endpoint(&cfg).map_err(|_| CliError::Validation {
        field: "host".into(),
        reason: "no server saved: pass --host (and --port if not 9384)".into(),
    })?;
    if args.username.is_empty() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "username cannot be empty".into(),
        });
    }
    let password = read_password(args.password_stdin)?;
    let sc = commands::session_config(&cfg, global)?;

    let token = nexview_core::oneshot::login(&endpoint, &args.username, &password, &sc).await?;

    let storage = nexview_config::store_credentials(&mut cfg, &endpoint, &args.username, &token);
    nexview_config::save_config(&cfg)?;

    if !global.quiet {
        match storage {
            TokenStorage::Keyring => eprintln!("✓ Logged in to {endpoint} (token stored in system keyring)"),
            TokenStorage::Plaintext => eprintln!(
                "✓ Logged in to {endpoint} (token saved to {})",
                nexview_config::config_path().display()
            ),
        }
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = nexview_config::load_config()?;
    let was = nexview_config::endpoint(&cfg).ok();
    nexview_config::clear_credentials(&mut cfg);
    nexview_config::save_config(&cfg)?;

    if !global.quiet {
        match was {
            Some(endpoint) => eprintln!("✓ Logged out of {endpoint}"),
            None => eprintln!("Not logged in"),
        }
    }
    Ok(())
}
