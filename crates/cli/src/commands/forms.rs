//! Feedback form commands.

use chrono::{NaiveDate, Utc};

use hr_feedback_client::SyncStatus;
use hr_feedback_core::{FeedbackQuestion, FormTemplate, QuestionType, ResourceId};

use super::{CliError, Context, output};

/// Arguments of `forms create`.
pub struct NewForm {
    pub name: String,
    pub team: Option<String>,
    pub due: Option<NaiveDate>,
    pub questions: Vec<String>,
    pub scale_questions: Vec<String>,
}

fn find(ctx: &Context, id: &str) -> Result<FormTemplate, CliError> {
    ctx.session
        .forms()
        .get_form_by_id(&ResourceId::new(id))
        .ok_or_else(|| CliError::NotFound {
            kind: "form",
            id: id.to_owned(),
        })
}

fn summary(ctx: &Context, form: &FormTemplate) -> String {
    let id = form.id.as_ref().map_or("-", ResourceId::as_str);
    let pending = match form
        .id
        .as_ref()
        .and_then(|id| ctx.session.forms().sync_status(id))
    {
        Some(SyncStatus::LocalOnly) => " [local only]",
        Some(SyncStatus::Unsynced) => " [unsynced]",
        _ => "",
    };
    let due = form
        .due_date
        .map(|d| format!(", due {d}"))
        .unwrap_or_default();
    format!(
        "{id}  {} [{}] {} questions{due}{pending}",
        form.name,
        form.status,
        form.questions.len()
    )
}

/// List forms, optionally only those of one team.
///
/// # Errors
///
/// Returns `CliError::NotLoggedIn` if nobody is logged in.
pub async fn list(ctx: &Context, team: Option<&str>) -> Result<(), CliError> {
    ctx.restore().await?;
    let forms = match team {
        Some(team) => ctx.session.forms().forms_for_team(&ResourceId::new(team)),
        None => ctx.session.forms().forms(),
    };

    if ctx.json {
        return output::json(&forms);
    }
    if forms.is_empty() {
        output::line("No forms yet");
    }
    for form in &forms {
        output::line(&summary(ctx, form));
    }
    Ok(())
}

/// Create a form.
///
/// # Errors
///
/// Returns `CliError::NotFound` if `--team` names an unknown team, or the
/// store's error.
pub async fn create(ctx: &Context, args: NewForm) -> Result<(), CliError> {
    let admin = ctx.restore().await?;

    let mut form = FormTemplate::draft(args.name.trim(), admin.id, Utc::now());
    if let Some(team) = args.team {
        let team_id = ResourceId::new(team);
        if ctx.session.teams().get_team_by_id(&team_id).is_none() {
            return Err(CliError::NotFound {
                kind: "team",
                id: team_id.into_inner(),
            });
        }
        form.team_id = Some(team_id);
    }
    form.due_date = args.due;
    form.questions = args
        .questions
        .into_iter()
        .map(|q| FeedbackQuestion::new(q, QuestionType::Free))
        .chain(
            args.scale_questions
                .into_iter()
                .map(|q| FeedbackQuestion::new(q, QuestionType::Scale)),
        )
        .collect();

    let saved = ctx.session.forms().save_form(form).await?;

    if ctx.json {
        return output::json(&saved);
    }
    output::line(&format!("Created {}", summary(ctx, &saved)));
    Ok(())
}

/// Print one form with its questions.
///
/// # Errors
///
/// Returns `CliError::NotFound` for an unknown ID.
pub async fn show(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.restore().await?;
    let form = find(ctx, id)?;

    if ctx.json {
        return output::json(&form);
    }
    output::line(&summary(ctx, &form));
    for (n, question) in form.questions.iter().enumerate() {
        output::line(&format!("  {}. [{}] {}", n + 1, question.kind, question.prompt));
    }
    Ok(())
}

/// Mark a form as sent and print an access code per team member.
///
/// # Errors
///
/// Returns `CliError` for an unknown ID or if the backend rejects the change.
pub async fn send(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.restore().await?;
    let sent = ctx.session.send_form(&ResourceId::new(id)).await?;

    if ctx.json {
        return output::json(&serde_json::json!({
            "form": sent.form,
            "accessCodes": sent.access_codes,
        }));
    }
    output::line(&format!("Sent {}", summary(ctx, &sent.form)));
    for code in &sent.access_codes {
        output::line(&format!("  {}  {}", code.access_code, code.email));
    }
    Ok(())
}

/// Delete a form. Unknown IDs are ignored.
///
/// # Errors
///
/// Returns `CliError` if the backend rejects the deletion.
pub async fn delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.restore().await?;
    ctx.session.forms().delete_form(&ResourceId::new(id)).await?;
    if !ctx.json {
        output::line(&format!("Deleted form {id}"));
    }
    Ok(())
}
