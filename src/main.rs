use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use sqlx::postgres::PgPoolOptions;

use community_poll_analytics::models::SubmissionInput;
use community_poll_analytics::questions::PollDefinition;
use community_poll_analytics::{db, export, report, submission};

#[derive(Parser)]
#[command(name = "community-poll")]
#[command(about = "Community lifestyle poll: intake, storage and analytics", long_about = None)]
struct Cli {
    /// Poll definition to use instead of the built-in questionnaire
    #[arg(long, global = true)]
    poll: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a few sample responses
    Seed,
    /// Print the questionnaire
    Questions,
    /// Record one response from a JSON payload
    Submit {
        #[arg(long)]
        json: PathBuf,
    },
    /// Import responses from a CSV export
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export all responses as CSV
    Export {
        #[arg(long, default_value = "community-poll-responses.csv")]
        out: PathBuf,
    },
    /// Show how many responses are stored
    Count,
    /// Build the analytics report
    Report {
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Permanently delete every stored response
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

fn print_questions(poll: &PollDefinition) {
    for section in poll.sections() {
        println!("== {} ==", section.name);
        for question in section.questions {
            println!("{}/{} {}", question.field.index() + 1, poll.len(), question.headline);
            if question.multi_select {
                match question.max_select {
                    Some(max) => println!("   Select all that apply (max {max})"),
                    None => println!("   Select all that apply"),
                }
            }
            for option in &question.options {
                match &option.image {
                    Some(image) => println!("   - {} [{}]", option.label, image),
                    None => println!("   - {}", option.label),
                }
            }
            if let Some(prompt) = &question.conditional {
                println!(
                    "   If \"{}\": {} -> {}",
                    prompt.trigger,
                    prompt.placeholder,
                    prompt.field.column()
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let poll = PollDefinition::load(cli.poll.as_deref()).context("invalid poll definition")?;

    if let Commands::Questions = cli.command {
        print_questions(&poll);
        return Ok(());
    }

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool, &poll).await?;
            println!("Seed data inserted ({inserted} new responses).");
        }
        Commands::Questions => {}
        Commands::Submit { json } => {
            let payload = std::fs::read_to_string(&json)
                .with_context(|| format!("failed to read {}", json.display()))?;
            let input: SubmissionInput =
                serde_json::from_str(&payload).context("submit payload is not valid JSON")?;
            let submission = submission::validate_submission(&poll, &input)?;
            let id = db::insert_submission(&pool, &submission).await?;
            info!("stored submission {id}");
            println!("Response {id} recorded.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &poll, &csv).await?;
            println!("Inserted {inserted} responses from {}.", csv.display());
        }
        Commands::Export { out } => {
            let submissions = db::fetch_submissions(&pool).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(file, &submissions)?;
            println!("Exported {} responses to {}.", submissions.len(), out.display());
        }
        Commands::Count => {
            let count = db::count_submissions(&pool).await?;
            println!("{count}");
        }
        Commands::Report { format, out } => {
            let submissions = db::fetch_submissions(&pool).await?;
            let analytics = report::build_analytics(&poll, &submissions, &Local);
            if let Some(peak) = &analytics.heatmap.peak {
                info!("peak activity {} at {}", peak.day_label, peak.hour_label);
            }

            let rendered = match format {
                ReportFormat::Markdown => report::build_report(&analytics, &Local),
                ReportFormat::Json => serde_json::to_string_pretty(&analytics)?,
            };

            match out {
                Some(out) => {
                    std::fs::write(&out, rendered)?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                let count = db::count_submissions(&pool).await?;
                bail!("refusing to delete {count} responses without --yes");
            }
            let deleted = db::clear_all(&pool).await?;
            info!("cleared {deleted} submissions");
            println!("Deleted {deleted} responses.");
        }
    }

    Ok(())
}
