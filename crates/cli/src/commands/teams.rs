//! Team commands.

use hr_feedback_client::SyncStatus;
use hr_feedback_core::{ResourceId, Team};

use super::{CliError, Context, output};

fn status_label(ctx: &Context, team: &Team) -> &'static str {
    match ctx.session.teams().sync_status(&team.id) {
        Some(SyncStatus::LocalOnly) => " [local only]",
        Some(SyncStatus::Unsynced) => " [unsynced]",
        _ => "",
    }
}

/// List the admin's teams.
///
/// # Errors
///
/// Returns `CliError::NotLoggedIn` if nobody is logged in.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    ctx.restore().await?;
    let teams = ctx.session.teams().teams();

    if ctx.json {
        return output::json(&teams);
    }
    if teams.is_empty() {
        output::line("No teams yet");
    }
    for team in &teams {
        output::line(&format!(
            "{}  {} ({} members){}",
            team.id,
            team.name,
            team.members.len(),
            status_label(ctx, team)
        ));
    }
    Ok(())
}

/// Create a team.
///
/// # Errors
///
/// Returns `CliError` if nobody is logged in.
pub async fn create(ctx: &Context, name: &str, members: Vec<String>) -> Result<(), CliError> {
    ctx.restore().await?;
    let team = ctx.session.teams().create_team(name, members).await?;

    if ctx.json {
        return output::json(&team);
    }
    output::line(&format!("Created team {}{}", team.id, status_label(ctx, &team)));
    Ok(())
}

/// Rename a team.
///
/// # Errors
///
/// Returns `CliError::NotFound` for an unknown ID, or the store's error.
pub async fn rename(ctx: &Context, id: &str, name: &str) -> Result<(), CliError> {
    ctx.restore().await?;
    let teams = ctx.session.teams();
    let mut team = teams
        .get_team_by_id(&ResourceId::new(id))
        .ok_or_else(|| CliError::NotFound {
            kind: "team",
            id: id.to_owned(),
        })?;
    name.trim().clone_into(&mut team.name);
    teams.update_team(team.clone()).await?;

    if !ctx.json {
        output::line(&format!("Renamed team {}{}", team.id, status_label(ctx, &team)));
    }
    Ok(())
}

/// Delete a team. Unknown IDs are ignored.
///
/// # Errors
///
/// Returns `CliError` if nobody is logged in.
pub async fn delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.restore().await?;
    ctx.session.teams().delete_team(&ResourceId::new(id)).await?;
    if !ctx.json {
        output::line(&format!("Deleted team {id}"));
    }
    Ok(())
}
