use clap::{Arg, Command};

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host used for credential and contact mail")
                .env("VETRINA_SMTP_HOST")
                .default_value("smtp.gmail.com"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP submission port")
                .env("VETRINA_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username, also used as the From address (required unless --dev)")
                .env("VETRINA_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password or app password (required unless --dev)")
                .env("VETRINA_SMTP_PASSWORD")
                .hide_env_values(true),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            host: matches
                .get_one::<String>(ARG_SMTP_HOST)
                .cloned()
                .unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: matches
                .get_one::<u16>(ARG_SMTP_PORT)
                .copied()
                .unwrap_or(587),
            username: matches.get_one::<String>(ARG_SMTP_USERNAME).cloned(),
            password: matches.get_one::<String>(ARG_SMTP_PASSWORD).cloned(),
        }
    }
}
