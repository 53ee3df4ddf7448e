use crate::{
    api,
    cli::commands::smtp,
    content::ContentStore,
    email::{EmailSender, LogEmailSender, SmtpEmailSender},
    security::{credentials::RotationPolicy, CredentialManager, SessionGate},
    settings::Settings,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub admin_email: String,
    pub rotation_interval_minutes: u64,
    pub session_timeout_hours: u64,
    pub development_mode: bool,
    pub smtp: smtp::Options,
}

fn build_sender(args: &Args) -> Result<Arc<dyn EmailSender>> {
    if args.development_mode {
        return Ok(Arc::new(LogEmailSender));
    }

    let username = args
        .smtp
        .username
        .clone()
        .ok_or_else(|| anyhow!("SMTP username is required outside development mode"))?;
    let password = args
        .smtp
        .password
        .clone()
        .ok_or_else(|| anyhow!("SMTP password is required outside development mode"))?;

    let sender = SmtpEmailSender::new(
        &args.smtp.host,
        args.smtp.port,
        username,
        SecretString::from(password),
    )
    .context("Failed to build SMTP transport")?;

    Ok(Arc::new(sender))
}

/// Execute the server action.
/// # Errors
/// Returns an error if configuration is invalid, the initial credential
/// cannot be delivered, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let contact = Settings::load_contact_settings(&args.data_dir)?;
    let settings = Arc::new(
        Settings::new(args.data_dir.clone(), args.assets_dir.clone())
            .with_rotation_interval_minutes(args.rotation_interval_minutes)
            .with_session_timeout_hours(args.session_timeout_hours)
            .with_development_mode(args.development_mode)
            .with_admin_email(args.admin_email.clone())
            .with_contact(contact),
    );
    settings.validate()?;

    let sender = build_sender(&args)?;

    // The server only becomes reachable once the operator holds a working
    // credential: delivery failure here is fatal.
    let credentials = CredentialManager::initialize(
        RotationPolicy {
            interval_minutes: args.rotation_interval_minutes,
            development_mode: args.development_mode,
        },
        args.admin_email.clone(),
        Arc::clone(&sender),
    )
    .await?;

    let rotation = if args.development_mode {
        None
    } else {
        Some(credentials.spawn_rotation())
    };

    let gate = Arc::new(SessionGate::new(
        Arc::clone(&credentials),
        args.session_timeout_hours,
    ));
    let store = Arc::new(ContentStore::new(args.data_dir));

    info!(
        rotation_interval_minutes = args.rotation_interval_minutes,
        session_timeout_hours = args.session_timeout_hours,
        development_mode = args.development_mode,
        "starting portfolio server"
    );

    api::new(
        args.port,
        api::AppContext {
            settings,
            gate,
            store,
            sender,
        },
        rotation,
    )
    .await
}
