//! Account commands: register, login, logout, whoami.

use secrecy::SecretString;

use hr_feedback_core::AdminIdentity;

use super::{CliError, Context, output};

fn print_admin(ctx: &Context, admin: &AdminIdentity) -> Result<(), CliError> {
    if ctx.json {
        output::json(admin)
    } else {
        output::line(&format!("{} ({})", admin.email, admin.id));
        Ok(())
    }
}

/// Register a new admin and log in.
///
/// # Errors
///
/// Returns `CliError::Auth` with a message meant for the user.
pub async fn register(ctx: &Context, email: &str, password: String) -> Result<(), CliError> {
    let admin = ctx
        .session
        .register(email, &SecretString::from(password))
        .await?;
    tracing::info!(admin_id = %admin.id, "Registered");
    print_admin(ctx, &admin)
}

/// Log in.
///
/// # Errors
///
/// Returns `CliError::Auth` with a message meant for the user.
pub async fn login(ctx: &Context, email: &str, password: String) -> Result<(), CliError> {
    let admin = ctx
        .session
        .login(email, &SecretString::from(password))
        .await?;
    print_admin(ctx, &admin)
}

pub fn logout(ctx: &Context) {
    ctx.session.logout();
    if !ctx.json {
        output::line("Logged out");
    }
}

/// Print the logged-in admin.
///
/// # Errors
///
/// Returns `CliError::NotLoggedIn` if nobody is logged in.
pub fn whoami(ctx: &Context) -> Result<(), CliError> {
    let admin = ctx.session.current_admin().ok_or(CliError::NotLoggedIn)?;
    print_admin(ctx, &admin)
}
