//! Subcommand implementations.

pub mod auth;
pub mod forms;
pub mod output;
pub mod teams;

use std::path::PathBuf;

use thiserror::Error;

use hr_feedback_client::{
    AdminSession, ApiError, AuthError, ClientConfig, ConfigError, StoreError,
};
use hr_feedback_core::AdminIdentity;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The command needs a logged-in admin.
    #[error("Not logged in. Run `hrfb login` first.")]
    NotLoggedIn,

    /// No team or form with the given ID.
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    /// Output could not be encoded.
    #[error("Could not encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Session plus output settings shared by every command.
pub struct Context {
    pub session: AdminSession,
    pub json: bool,
}

impl Context {
    /// Load configuration and open the session for `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn open(data_dir: Option<PathBuf>, json: bool) -> Result<Self, CliError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(dir) = data_dir {
            config = config.with_data_dir(dir);
        }
        tracing::debug!(api = %config.api_base_url, "Configuration loaded");
        let session = AdminSession::open(&config)?;
        Ok(Self { session, json })
    }

    /// Require a logged-in admin and load their teams and forms.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotLoggedIn` if nobody is logged in.
    pub async fn restore(&self) -> Result<AdminIdentity, CliError> {
        let admin = self.session.current_admin().ok_or(CliError::NotLoggedIn)?;
        self.session.restore().await;
        Ok(admin)
    }
}

/// Push pending teams and forms.
///
/// # Errors
///
/// Returns `CliError` if nobody is logged in or the admin changed mid-sync.
pub async fn sync(ctx: &Context) -> Result<(), CliError> {
    ctx.restore().await?;
    let (teams, forms) = ctx.session.sync_pending().await?;

    if ctx.json {
        output::json(&serde_json::json!({
            "teams": { "synced": teams.synced, "failed": teams.failed },
            "forms": { "synced": forms.synced, "failed": forms.failed },
        }))?;
    } else {
        output::line(&format!(
            "Teams: {} synced, {} pending",
            teams.synced, teams.failed
        ));
        output::line(&format!(
            "Forms: {} synced, {} pending",
            forms.synced, forms.failed
        ));
    }
    Ok(())
}
