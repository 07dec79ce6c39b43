//! HR Feedback CLI - manage teams and feedback forms from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (password from --password or HRFB_PASSWORD)
//! hrfb register -e hr@example.com
//!
//! # Log in and list teams
//! hrfb login -e hr@example.com
//! hrfb teams list
//!
//! # Create a team and a form for it
//! hrfb teams create "Platform" -m alice@example.com -m bob@example.com
//! hrfb forms create "Q3 review" --team <team id> -q "What went well?"
//!
//! # Push anything created while the backend was unreachable
//! hrfb sync
//! ```
//!
//! # Environment Variables
//!
//! - `HRFB_API_BASE_URL` - Backend base URL (default `http://localhost:8000`)
//! - `HRFB_DATA_DIR` - Directory holding local and session storage (default `.hrfb`)
//! - `HRFB_LOG_FORMAT` - `json` for structured logs on stderr
//! - `RUST_LOG` - Log filter (default `warn`)
//!
//! One data directory behaves like one browser tab: the logged-in admin is
//! remembered per directory, while cached teams and forms are keyed by admin.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "hrfb")]
#[command(author, version, about = "HR 360-feedback client")]
struct Cli {
    /// Directory holding local and session storage
    #[arg(long, global = true, env = "HRFB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account and log in
    Register {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "HRFB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in as an existing admin
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "HRFB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the logged-in admin
    Logout,
    /// Show the logged-in admin
    Whoami,
    /// Manage teams
    Teams {
        #[command(subcommand)]
        action: TeamsAction,
    },
    /// Manage feedback forms
    Forms {
        #[command(subcommand)]
        action: FormsAction,
    },
    /// Push teams and forms that were saved while the backend was unreachable
    Sync,
}

#[derive(Subcommand)]
enum TeamsAction {
    /// List teams
    List,
    /// Create a team
    Create {
        name: String,

        /// Member email (repeatable)
        #[arg(short, long = "member")]
        members: Vec<String>,
    },
    /// Rename a team
    Rename { id: String, name: String },
    /// Delete a team
    Delete { id: String },
}

#[derive(Subcommand)]
enum FormsAction {
    /// List forms
    List {
        /// Only forms assigned to this team
        #[arg(long)]
        team: Option<String>,
    },
    /// Create a form
    Create {
        name: String,

        /// Team the form is for
        #[arg(long)]
        team: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Free-text question (repeatable)
        #[arg(short, long = "question")]
        questions: Vec<String>,

        /// 1-5 scale question (repeatable)
        #[arg(long = "scale")]
        scale_questions: Vec<String>,
    },
    /// Show a form with its questions
    Show { id: String },
    /// Mark a form as sent
    Send { id: String },
    /// Delete a form
    Delete { id: String },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    let is_json = std::env::var("HRFB_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = commands::Context::open(cli.data_dir, cli.json)?;

    match cli.command {
        Commands::Register { email, password } => {
            commands::auth::register(&ctx, &email, password).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx)?,
        Commands::Teams { action } => match action {
            TeamsAction::List => commands::teams::list(&ctx).await?,
            TeamsAction::Create { name, members } => {
                commands::teams::create(&ctx, &name, members).await?;
            }
            TeamsAction::Rename { id, name } => commands::teams::rename(&ctx, &id, &name).await?,
            TeamsAction::Delete { id } => commands::teams::delete(&ctx, &id).await?,
        },
        Commands::Forms { action } => match action {
            FormsAction::List { team } => commands::forms::list(&ctx, team.as_deref()).await?,
            FormsAction::Create {
                name,
                team,
                due,
                questions,
                scale_questions,
            } => {
                let draft = commands::forms::NewForm {
                    name,
                    team,
                    due,
                    questions,
                    scale_questions,
                };
                commands::forms::create(&ctx, draft).await?;
            }
            FormsAction::Show { id } => commands::forms::show(&ctx, &id).await?,
            FormsAction::Send { id } => commands::forms::send(&ctx, &id).await?,
            FormsAction::Delete { id } => commands::forms::delete(&ctx, &id).await?,
        },
        Commands::Sync => commands::sync(&ctx).await?,
    }
    Ok(())
}
