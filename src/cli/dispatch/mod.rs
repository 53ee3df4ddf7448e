//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{self, smtp};
use anyhow::Result;
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);

    // Production mode needs an admin email and SMTP credentials
    commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let development_mode = matches.get_flag(commands::ARG_DEV);
    let smtp_opts = smtp::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        data_dir: matches
            .get_one::<String>(commands::ARG_DATA_DIR)
            .map_or_else(|| PathBuf::from("data"), PathBuf::from),
        assets_dir: matches
            .get_one::<String>(commands::ARG_ASSETS_DIR)
            .map_or_else(|| PathBuf::from("static"), PathBuf::from),
        admin_email: matches
            .get_one::<String>(commands::ARG_ADMIN_EMAIL)
            .cloned()
            .unwrap_or_default(),
        rotation_interval_minutes: matches
            .get_one::<u64>(commands::ARG_ROTATION_INTERVAL)
            .copied()
            .unwrap_or(30),
        session_timeout_hours: matches
            .get_one::<u64>(commands::ARG_SESSION_TIMEOUT)
            .copied()
            .unwrap_or(2),
        development_mode,
        smtp: smtp_opts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_requires_smtp_credentials() {
        temp_env::with_vars(
            [
                ("VETRINA_ADMIN_EMAIL", Some("owner@example.com")),
                ("VETRINA_SMTP_USERNAME", None::<&str>),
                ("VETRINA_SMTP_PASSWORD", None::<&str>),
                ("VETRINA_DEV", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["vetrina"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("--smtp-username"));
                }
            },
        );
    }

    #[test]
    fn dev_mode_builds_server_action() {
        temp_env::with_vars([("VETRINA_DEV", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec!["vetrina", "--dev", "-p", "3000"]);
            let action = handler(&matches).unwrap();

            let Action::Server(args) = action;
            assert_eq!(args.port, 3000);
            assert!(args.development_mode);
            assert_eq!(args.data_dir, PathBuf::from("data"));
            assert_eq!(args.rotation_interval_minutes, 30);
            assert_eq!(args.session_timeout_hours, 2);
        });
    }
}
