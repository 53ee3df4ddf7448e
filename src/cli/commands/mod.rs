pub mod logging;
pub mod smtp;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

use self::smtp::{ARG_SMTP_PASSWORD, ARG_SMTP_USERNAME};

pub const ARG_PORT: &str = "port";
pub const ARG_DATA_DIR: &str = "data-dir";
pub const ARG_ASSETS_DIR: &str = "assets-dir";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ROTATION_INTERVAL: &str = "rotation-interval-minutes";
pub const ARG_SESSION_TIMEOUT: &str = "session-timeout-hours";
pub const ARG_DEV: &str = "dev";

/// Check that production mode has everything it needs to deliver email.
///
/// # Errors
/// Returns an error string when `--dev` is absent and the admin email or
/// SMTP credentials are missing.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    if matches.get_flag(ARG_DEV) {
        return Ok(());
    }

    if !matches.contains_id(ARG_ADMIN_EMAIL) {
        return Err(format!(
            "Missing required argument: --{ARG_ADMIN_EMAIL} (required unless --dev)"
        ));
    }
    if !matches.contains_id(ARG_SMTP_USERNAME) {
        return Err(format!(
            "Missing required argument: --{ARG_SMTP_USERNAME} (required unless --dev)"
        ));
    }
    if !matches.contains_id(ARG_SMTP_PASSWORD) {
        return Err(format!(
            "Missing required argument: --{ARG_SMTP_PASSWORD} (required unless --dev)"
        ));
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("vetrina")
        .about("Personal portfolio site with a self-rotating admin credential")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("VETRINA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DATA_DIR)
                .short('d')
                .long(ARG_DATA_DIR)
                .help("Directory holding the JSON content sections")
                .default_value("data")
                .env("VETRINA_DATA_DIR"),
        )
        .arg(
            Arg::new(ARG_ASSETS_DIR)
                .long(ARG_ASSETS_DIR)
                .help("Directory served as static assets")
                .default_value("static")
                .env("VETRINA_ASSETS_DIR"),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Recipient for rotated credentials and contact mail (required unless --dev)")
                .env("VETRINA_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_ROTATION_INTERVAL)
                .long(ARG_ROTATION_INTERVAL)
                .help("Minutes between automatic admin password rotations")
                .default_value("30")
                .env("VETRINA_ROTATION_INTERVAL_MINUTES")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_TIMEOUT)
                .long(ARG_SESSION_TIMEOUT)
                .help("Hours an admin session stays valid after login")
                .default_value("2")
                .env("VETRINA_SESSION_TIMEOUT_HOURS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_DEV)
                .long(ARG_DEV)
                .help("Development mode: fixed admin password, no email delivery, no rotation")
                .env("VETRINA_DEV")
                .action(ArgAction::SetTrue),
        );

    let command = smtp::with_args(command);
    logging::with_args(command)
}
