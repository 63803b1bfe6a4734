use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod aggregate;
mod cache;
mod db;
mod models;
mod report;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Session attendance tracking for campus classes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import attendance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List classes, optionally only those a student is enrolled in
    Classes {
        #[arg(long)]
        email: Option<String>,
    },
    /// Open a new attendance session and print its code
    StartSession {
        #[arg(long)]
        class: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Close the open session for a class
    EndSession {
        #[arg(long)]
        class: String,
    },
    /// Mark a student present, by session code or by class
    #[command(group(
        ArgGroup::new("target")
            .args(["code", "class"])
            .required(true)
            .multiple(false)
    ))]
    Mark {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        class: Option<String>,
    },
    /// Show attendance analytics for a class or a single student
    Dashboard {
        #[arg(long)]
        class: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        offline: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        class: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        offline: bool,
    },
    /// File a complaint about an attendance record
    Complain {
        #[arg(long)]
        email: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        details: String,
    },
    /// List complaints, open ones only unless --all
    Complaints {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Resolve or discard an open complaint
    Resolve {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        discard: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;
    let cache_dir =
        std::env::var("TALLY_CACHE_DIR").unwrap_or_else(|_| ".tally-cache".to_string());
    let cache = cache::FileCache::new(cache_dir);

    // Lazy so offline commands never dial the database.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&database_url)
        .context("invalid DATABASE_URL")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &cache, &csv).await?;
            println!(
                "Inserted {inserted} attendance records from {}.",
                csv.display()
            );
        }
        Commands::Classes { email } => {
            let classes = match email.as_deref() {
                Some(email) => db::enrolled_classes(&pool, email).await?,
                None => db::fetch_classes(&pool).await?,
            };

            if classes.is_empty() {
                println!("No classes found.");
                return Ok(());
            }
            for class in classes {
                println!("- {}", class.class_name);
            }
        }
        Commands::StartSession { class, date } => {
            let subject = db::class_by_name(&pool, &class).await?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let code = db::start_session(&pool, subject.class_id, date).await?;
            db::invalidate_snapshot(&cache, &subject.class_name)?;
            println!("Session {code} open for {}.", subject.class_name);
        }
        Commands::EndSession { class } => {
            let subject = db::class_by_name(&pool, &class).await?;
            if db::end_session(&pool, subject.class_id).await? {
                db::invalidate_snapshot(&cache, &subject.class_name)?;
                println!("Session closed for {}.", subject.class_name);
            } else {
                println!("No active session. Start a session first.");
            }
        }
        Commands::Mark { email, code, class } => {
            let student = db::student_by_email(&pool, &email).await?;
            let session = match (code, class) {
                (Some(code), _) => db::session_by_code(&pool, &code).await?,
                (None, Some(class)) => {
                    let subject = db::class_by_name(&pool, &class).await?;
                    db::open_session(&pool, subject.class_id)
                        .await?
                        .context("No active session. Start a session first.")?
                }
                (None, None) => anyhow::bail!("either --code or --class is required"),
            };

            if db::mark_present(&pool, &session, student.student_id).await? {
                let subject = db::class_by_id(&pool, session.class_id).await?;
                db::invalidate_snapshot(&cache, &subject.class_name)?;
                println!(
                    "Marked {} present for session {}.",
                    student.display_name, session.session_id
                );
            } else {
                println!("Already marked present for this session.");
            }
        }
        Commands::Dashboard {
            class,
            email,
            limit,
            offline,
        } => {
            let snapshot = db::load_snapshot(&pool, &cache, &class, offline).await?;
            if offline {
                println!("Cached snapshot from {}.", snapshot.fetched_on);
            }

            match email {
                Some(email) => {
                    let student = snapshot
                        .roster
                        .iter()
                        .find(|member| member.email == email)
                        .with_context(|| format!("{email} is not enrolled in {class}"))?;
                    let attended = aggregate::sessions_attended(
                        &snapshot.sessions,
                        &snapshot.records,
                        student.student_id,
                    );
                    let progress =
                        aggregate::individual_progress(attended, snapshot.sessions.len());

                    println!(
                        "You've attended {} out of {} sessions ({:.1}%).",
                        attended,
                        snapshot.sessions.len(),
                        progress.percentage
                    );
                    println!("Status: {}.", report::band_label(progress.band));
                    println!("{}", report::band_notice(progress.band));
                }
                None => {
                    let trend = aggregate::class_trend(
                        &snapshot.sessions,
                        &snapshot.records,
                        &snapshot.roster,
                    );
                    let averages = aggregate::per_student_averages(
                        &snapshot.sessions,
                        &snapshot.records,
                        &snapshot.roster,
                    );

                    println!("Attendance for {}:", snapshot.class.class_name);
                    println!(
                        "{} sessions, {} students enrolled.",
                        snapshot.sessions.len(),
                        snapshot.roster.len()
                    );
                    if trend.is_empty() {
                        println!("No sessions yet. Start a session to view analytics.");
                        return Ok(());
                    }

                    println!("Trend (last {} sessions):", aggregate::TREND_WINDOW);
                    for point in trend.iter() {
                        println!("- {}: {}%", point.label, point.percentage);
                    }

                    println!("Class average: {:.2}%", averages.class_average);
                    println!("Students needing attention:");
                    let ranked = report::ranked_students(&snapshot.roster, &averages);
                    for (name, pct) in ranked.into_iter().take(limit) {
                        println!("- {name}: {pct:.2}%");
                    }
                }
            }
        }
        Commands::Report {
            class,
            email,
            out,
            offline,
        } => {
            let snapshot = db::load_snapshot(&pool, &cache, &class, offline).await?;
            let report = match email {
                Some(email) => {
                    let student = snapshot
                        .roster
                        .iter()
                        .find(|member| member.email == email)
                        .with_context(|| format!("{email} is not enrolled in {class}"))?
                        .clone();
                    report::build_student_report(&snapshot, &student)
                }
                None => report::build_class_report(&snapshot),
            };
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Complain {
            email,
            class,
            subject,
            details,
        } => {
            let student = db::student_by_email(&pool, &email).await?;
            let subject_class = db::class_by_name(&pool, &class).await?;
            let id = db::file_complaint(
                &pool,
                student.student_id,
                subject_class.class_id,
                &subject,
                &details,
            )
            .await?;
            println!("Complaint submitted successfully! Reference {id}.");
        }
        Commands::Complaints { class, all } => {
            let complaints = db::fetch_complaints(&pool, class.as_deref(), all).await?;
            if complaints.is_empty() {
                println!("No complaints to review.");
                return Ok(());
            }

            for complaint in complaints {
                println!(
                    "- [{}] {} ({}) on {}: {}",
                    complaint.status,
                    complaint.student_name,
                    complaint.class_name,
                    complaint.filed_on,
                    complaint.subject
                );
                println!("  {} (id {})", complaint.details, complaint.id);
            }
        }
        Commands::Resolve { id, discard } => {
            if db::resolve_complaint(&pool, id, discard).await? {
                let status = if discard { "discarded" } else { "resolved" };
                println!("Complaint {status}.");
            } else {
                println!("No open complaint with id {id}.");
            }
        }
    }

    Ok(())
}
