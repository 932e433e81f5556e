use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod config;
mod dashboard;
mod db;
mod error;
mod metrics;
mod mock;
mod models;
mod report;
mod search;
mod session;
mod timeseries;

use config::Config;
use dashboard::{DashboardView, LoadTracker};
use metrics::ActivityCounts;
use models::{EngagementBreakdown, GrowthSummary, HealthScore, Phase, SearchDocument};
use session::ActorSource;
use timeseries::TimeRange;

#[derive(Parser)]
#[command(name = "ehrdc-insights")]
#[command(about = "Community health, growth and search insights for the EHRDC citizen portal", long_about = None)]
struct Cli {
    /// Config file (defaults to ./insights.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for placeholder chart data
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Acting user id for writes (falls back to EHRDC_ACTOR_ID)
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample communities
    Seed,
    /// Import community posts from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List community groups
    Groups,
    /// Four-factor health score for a group
    Health {
        #[arg(long)]
        group: String,
        #[arg(long)]
        json: bool,
    },
    /// Weighted engagement score for a group
    Engagement {
        #[arg(long)]
        group: String,
        #[arg(long)]
        json: bool,
    },
    /// Placeholder membership growth series
    Growth {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        range: Option<TimeRange>,
        #[arg(long)]
        json: bool,
    },
    /// Hour-of-day member activity for a group
    Activity {
        #[arg(long)]
        group: String,
        #[arg(long)]
        json: bool,
    },
    /// Search the portal content catalog
    Search {
        query: String,
        #[arg(long = "phase")]
        phases: Vec<Phase>,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long)]
        current_phase: Option<Phase>,
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Suggested content when there is no query
    QuickAccess {
        #[arg(long)]
        current_phase: Option<Phase>,
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Load dashboard panels for several ranges; the last range selected wins
    Dashboard {
        #[arg(long)]
        group: String,
        #[arg(long, value_delimiter = ',', default_value = "7d,30d")]
        ranges: Vec<TimeRange>,
    },
    /// Mentorship goals
    Goals {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Generate a markdown community report
    Report {
        #[arg(long)]
        group: String,
        #[arg(long)]
        range: Option<TimeRange>,
        #[arg(long, default_value = "community-report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum GoalAction {
    /// List goals and completion analytics for a relationship
    List {
        #[arg(long)]
        relationship: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Create a goal
    Add {
        #[arg(long)]
        relationship: Uuid,
        #[arg(long)]
        title: String,
    },
    /// Record progress (0-100)
    Progress {
        #[arg(long)]
        goal: Uuid,
        #[arg(long)]
        progress: u32,
    },
    /// Mark a goal completed
    Complete {
        #[arg(long)]
        goal: Uuid,
    },
}

#[derive(Debug, Serialize)]
struct DashboardPanel {
    range: TimeRange,
    health: HealthScore,
    engagement: EngagementBreakdown,
    growth: GrowthSummary,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "ehrdc_insights=debug"
    } else {
        "ehrdc_insights=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url(std::env::var("DATABASE_URL").ok())
        .context("DATABASE_URL or [database].url must point to the portal Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

fn load_catalog(config: &Config, explicit: Option<PathBuf>) -> anyhow::Result<Vec<SearchDocument>> {
    match explicit.or_else(|| config.analytics.catalog.clone()) {
        Some(path) => Ok(search::load_catalog(&path)?),
        None => Ok(search::default_catalog()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_panel(
    range: TimeRange,
    snapshot: &models::GroupSnapshot,
    seed: Option<u64>,
) -> DashboardPanel {
    let counts = ActivityCounts::from_snapshot(snapshot);
    let mut source = mock::source_for(seed);
    let health = metrics::health_score(&counts, mock::retention_sample(&mut source));
    let series = timeseries::growth_series(range, Utc::now().date_naive(), &mut source);
    DashboardPanel {
        range,
        health,
        engagement: metrics::engagement_breakdown(&counts),
        growth: timeseries::growth_summary(&series),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::discover(cli.config.as_deref())?;
    let seed = cli.seed.or(config.analytics.seed);
    let actor = ActorSource::from_env(cli.actor.clone());

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_posts_csv(&pool, &csv).await?;
            println!("Inserted {inserted} posts from {}.", csv.display());
        }
        Commands::Groups => {
            let pool = connect(&config).await?;
            let groups = db::list_groups(&pool).await?;
            if groups.is_empty() {
                println!("No community groups found.");
                return Ok(());
            }
            for group in groups {
                println!(
                    "- {} ({} members, {} posts) {}",
                    group.name, group.member_count, group.post_count, group.description
                );
            }
        }
        Commands::Health { group, json } => {
            let pool = connect(&config).await?;
            let snapshot = db::fetch_group_snapshot(&pool, &group).await?;
            let counts = ActivityCounts::from_snapshot(&snapshot);
            let mut source = mock::source_for(seed);
            let health = metrics::health_score(&counts, mock::retention_sample(&mut source));
            let recommendations = metrics::recommendations(&health);

            if json {
                #[derive(Serialize)]
                struct HealthOutput<'a> {
                    group: &'a str,
                    health: HealthScore,
                    recommendations: &'a [String],
                }
                return print_json(&HealthOutput {
                    group: &snapshot.group.name,
                    health,
                    recommendations: &recommendations,
                });
            }

            println!("{} health score {}/100", snapshot.group.name, health.overall);
            println!(
                "  engagement {} | growth {} | activity {} | retention {}",
                health.engagement, health.growth, health.activity, health.retention
            );
            for recommendation in recommendations {
                println!("- {recommendation}");
            }
        }
        Commands::Engagement { group, json } => {
            let pool = connect(&config).await?;
            let snapshot = db::fetch_group_snapshot(&pool, &group).await?;
            let breakdown =
                metrics::engagement_breakdown(&ActivityCounts::from_snapshot(&snapshot));
            if json {
                return print_json(&breakdown);
            }
            println!(
                "{} engagement score {} ({} posts, {} comments, {} likes, {} events, {} polls)",
                snapshot.group.name,
                breakdown.score,
                breakdown.posts,
                breakdown.comments,
                breakdown.likes,
                breakdown.events,
                breakdown.polls
            );
        }
        Commands::Growth { group, range, json } => {
            let range = range.unwrap_or(config.analytics.default_range);
            let mut source = mock::source_for(seed);
            let series = timeseries::growth_series(range, Utc::now().date_naive(), &mut source);
            let summary = timeseries::growth_summary(&series);
            tracing::debug!(group = ?group, %range, points = series.len(), "generated growth series");

            if json {
                #[derive(Serialize)]
                struct GrowthOutput<'a> {
                    range: TimeRange,
                    summary: GrowthSummary,
                    points: &'a [models::TimeSeriesPoint],
                }
                return print_json(&GrowthOutput {
                    range,
                    summary,
                    points: &series,
                });
            }

            println!(
                "{} growth over {}: {:+} members ({:.1}%), {:.1}/day",
                group.as_deref().unwrap_or("Community"),
                range,
                summary.total_growth,
                summary.growth_rate,
                summary.average_daily
            );
            for point in &series {
                println!(
                    "  {} +{} -> {}",
                    point.date,
                    point.value,
                    point.cumulative.unwrap_or(point.value)
                );
            }
        }
        Commands::Activity { group, json } => {
            let pool = connect(&config).await?;
            let snapshot = db::fetch_group_snapshot(&pool, &group).await?;
            let mut source = mock::source_for(seed);
            let profile = timeseries::activity_profile(
                snapshot.members.len(),
                snapshot.posts.len(),
                &mut source,
            );
            if json {
                return print_json(&profile);
            }
            println!(
                "{}: peak hour {:02}:00, {} recently active of {} members",
                snapshot.group.name,
                profile.peak_hour,
                profile.recently_active,
                snapshot.members.len()
            );
            for hour in &profile.hours {
                println!("  {:02}:00 {}", hour.hour, hour.activity);
            }
        }
        Commands::Search {
            query,
            phases,
            categories,
            current_phase,
            catalog,
            limit,
            json,
        } => {
            let catalog = load_catalog(&config, catalog)?;
            let query = search::SearchQuery {
                text: query,
                phases,
                categories,
                current_phase,
            };
            let mut hits = search::search(&catalog, &query);
            hits.truncate(limit.unwrap_or(config.report.search_limit));

            if json {
                return print_json(&hits);
            }
            if query.text.trim().is_empty() {
                println!("Enter a search term, or use quick-access for suggestions.");
                return Ok(());
            }
            if hits.is_empty() {
                println!("No results for \"{}\".", query.text);
                return Ok(());
            }
            for hit in hits {
                println!(
                    "- [{}] {} ({}, {}) rank {}",
                    hit.document.id,
                    hit.document.title,
                    hit.document.phase,
                    hit.document.category,
                    hit.rank
                );
            }
        }
        Commands::QuickAccess {
            current_phase,
            catalog,
            limit,
        } => {
            let catalog = load_catalog(&config, catalog)?;
            let limit = limit.unwrap_or(config.report.quick_access_limit);
            for document in search::quick_access(&catalog, current_phase, limit) {
                println!("- {} ({}): {}", document.title, document.phase, document.description);
            }
        }
        Commands::Dashboard { group, ranges } => {
            let pool = connect(&config).await?;
            let mut view = DashboardView::new(LoadTracker::new());
            let mut loads = tokio::task::JoinSet::new();

            for range in ranges {
                let ticket = view.begin_load();
                let pool = pool.clone();
                let group = group.clone();
                tracing::debug!(generation = ticket.generation(), %range, "dashboard load issued");
                loads.spawn(async move {
                    let snapshot = db::fetch_group_snapshot(&pool, &group).await;
                    (ticket, range, snapshot)
                });
            }

            while let Some(joined) = loads.join_next().await {
                let (ticket, range, snapshot) = joined.context("dashboard load panicked")?;
                let snapshot = match snapshot {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        tracing::warn!(%range, error = %err, "dashboard load failed");
                        continue;
                    }
                };
                view.complete(ticket, build_panel(range, &snapshot, seed));
            }

            match view.value() {
                Some(panel) => print_json(panel)?,
                None => println!("Dashboard could not be loaded for {group}."),
            }
            tracing::info!(
                discarded = view.discarded(),
                applied = ?view.applied_ticket().map(|ticket| ticket.generation()),
                "dashboard loads settled"
            );
        }
        Commands::Goals { action } => {
            let pool = connect(&config).await?;
            match action {
                GoalAction::List { relationship, json } => {
                    let goals = db::fetch_goals(&pool, relationship).await?;
                    let analytics = metrics::success_analytics(&goals);
                    if json {
                        #[derive(Serialize)]
                        struct GoalsOutput<'a> {
                            analytics: models::SuccessAnalytics,
                            goals: &'a [models::Goal],
                        }
                        return print_json(&GoalsOutput {
                            analytics,
                            goals: &goals,
                        });
                    }
                    println!(
                        "{} goals, {} completed ({}%), average progress {:.0}%",
                        analytics.total_goals,
                        analytics.completed_goals,
                        analytics.completion_rate,
                        analytics.average_progress
                    );
                    for goal in goals {
                        println!(
                            "- {} [{}] {} {}%",
                            goal.id,
                            goal.status.as_str(),
                            goal.title,
                            goal.progress
                        );
                    }
                }
                GoalAction::Add {
                    relationship,
                    title,
                } => {
                    let actor = actor.require()?;
                    let goal = db::create_goal(&pool, &actor, relationship, &title).await?;
                    tracing::info!(goal = %goal.id, actor = %actor.user_id, "goal created");
                    println!("Created goal {}.", goal.id);
                }
                GoalAction::Progress { goal, progress } => {
                    let actor = actor.require()?;
                    let goal = db::update_goal_progress(&pool, &actor, goal, progress).await?;
                    println!("Goal {} now at {}%.", goal.id, goal.progress);
                }
                GoalAction::Complete { goal } => {
                    let actor = actor.require()?;
                    let goal = db::complete_goal(&pool, &actor, goal).await?;
                    println!("Goal {} completed.", goal.id);
                }
            }
        }
        Commands::Report { group, range, out } => {
            let pool = connect(&config).await?;
            let snapshot = db::fetch_group_snapshot(&pool, &group).await?;
            let range = range.unwrap_or(config.analytics.default_range);
            let counts = ActivityCounts::from_snapshot(&snapshot);
            let mut source = mock::source_for(seed);
            let health = metrics::health_score(&counts, mock::retention_sample(&mut source));
            let recommendations = metrics::recommendations(&health);
            let today = Utc::now().date_naive();
            let series = timeseries::growth_series(range, today, &mut source);
            let activity = timeseries::activity_profile(
                snapshot.members.len(),
                snapshot.posts.len(),
                &mut source,
            );

            let report = report::build_report(&report::ReportInput {
                snapshot: &snapshot,
                generated_on: today,
                health,
                engagement: metrics::engagement_breakdown(&counts),
                recommendations: &recommendations,
                range,
                growth: timeseries::growth_summary(&series),
                activity: &activity,
            });
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
