//! Ivy CLI - pick today's tasks with the Ivy-6 method.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use ivy_core::{Constraints, EngineConfig, Level, PlanSnapshot, Task, TaskId, Time, WorkContext};
use ivy_selection::{Clock, SelectionEngine};
use ivy_storage::{JsonSnapshotStore, SnapshotStore};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ivy")]
#[command(about = "Daily task selection with the Ivy-6 method", long_about = None)]
struct Cli {
    /// Plan snapshot file
    #[arg(long, global = true, default_value = ".ivy/plan.json")]
    file: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pin "now" (RFC 3339 or YYYY-MM-DD)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Override the deep work ceiling
    #[arg(long, global = true)]
    max_deep: Option<usize>,

    /// Override the shallow work ceiling
    #[arg(long, global = true)]
    max_shallow: Option<usize>,

    /// Override the daily effort budget in minutes
    #[arg(long, global = true)]
    max_effort: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty plan, or import a JSON array of tasks
    Init {
        /// Tasks to import
        #[arg(long)]
        from: Option<PathBuf>,
        /// Replace an existing plan
        #[arg(long)]
        force: bool,
    },
    /// Capture a new task
    Add {
        /// Task title
        title: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Work context (deep or shallow)
        #[arg(long, default_value = "shallow")]
        context: String,
        /// Importance (high, medium, low)
        #[arg(long)]
        importance: Option<String>,
        /// Effort (high, medium, low)
        #[arg(long)]
        effort: Option<String>,
        /// Due date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Estimated minutes
        #[arg(long, default_value = "30")]
        duration: u32,
        /// Prerequisite task ids
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Add a task to today's selection
    Select {
        /// Task ID
        id: String,
    },
    /// Remove a task from today's selection
    Deselect {
        /// Task ID
        id: String,
    },
    /// Move a selected task to a position (0 = first)
    Move {
        /// Task ID
        id: String,
        /// Target position
        position: usize,
    },
    /// List tasks
    List,
    /// Show priority scores
    Scores,
    /// Suggest tasks to add
    Suggest,
    /// Check the selection against the constraints
    Validate,
    /// Show the selection in working order
    Order,
    /// Estimate the selection's capacity
    Capacity,
    /// Show a task's prerequisites and dependents
    Deps {
        /// Task ID
        id: String,
    },
    /// Print the full selection state as JSON
    State,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).await?;
    config.constraints = apply_overrides(config.constraints, cli.max_deep, cli.max_shallow, cli.max_effort);
    config.validate().context("Invalid engine configuration")?;

    let weight_total = config.weights.total();
    if (weight_total - 1.0).abs() > 1e-6 {
        warn!("Priority weights sum to {:.3}; scores are not renormalized", weight_total);
    }

    let clock = match cli.now.as_deref() {
        Some(s) => Clock::Fixed(parse_time(s)?),
        None => Clock::System,
    };
    let engine = SelectionEngine::from_config(config).with_clock(clock);

    let mut store = JsonSnapshotStore::new(&cli.file).await?;

    match cli.command {
        Commands::Init { from, force } => {
            if store.exists().await && !force {
                bail!("A plan already exists at {} (use --force to replace it)", cli.file.display());
            }
            let tasks: Vec<Task> = match from {
                Some(path) => {
                    let json = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Reading {}", path.display()))?;
                    serde_json::from_str(&json).context("Parsing task list")?
                }
                None => Vec::new(),
            };

            let mut snapshot = PlanSnapshot::new(tasks);
            if let Some(existing) = store.load().await? {
                snapshot.version = existing.version + 1;
            }
            store.save(&snapshot).await?;
            println!("Initialized plan with {} tasks at {}", snapshot.tasks.len(), cli.file.display());
        }
        Commands::Add { title, description, context, importance, effort, due, duration, depends_on, tags, id } => {
            let context: WorkContext = context.parse().map_err(anyhow::Error::msg)?;
            let mut task = match id {
                Some(id) => Task::with_id(id, title, context),
                None => Task::new(title, context),
            }
            .with_duration(duration);

            if let Some(description) = description {
                task = task.with_description(description);
            }
            if let Some(level) = importance {
                task = task.with_importance(parse_level(&level)?);
            }
            if let Some(level) = effort {
                task = task.with_effort(parse_level(&level)?);
            }
            if let Some(due) = due {
                task = task.with_due_date(parse_time(&due)?);
            }
            for dep in depends_on {
                task = task.depends_on(dep);
            }
            for tag in tags {
                task = task.with_tag(tag);
            }

            let snapshot = store.load_required().await?;
            let next = snapshot.add_task(task.clone())?;
            store.save(&next).await?;
            println!("Added task: {} - {}", task.id, task.title);
        }
        Commands::Select { id } => {
            let snapshot = store.load_required().await?;
            let next = snapshot.select(&TaskId::from(id.as_str()))?;
            store.save(&next).await?;

            let violations = engine.validate_selection(&next.tasks, &next.selected);
            println!("Selected {} ({} of {})", id, next.selected.len(), engine.constraints().max_tasks);
            print_violations(&violations);
        }
        Commands::Deselect { id } => {
            let snapshot = store.load_required().await?;
            let next = snapshot.deselect(&TaskId::from(id.as_str()))?;
            store.save(&next).await?;
            println!("Deselected {}", id);
        }
        Commands::Move { id, position } => {
            let snapshot = store.load_required().await?;
            let next = snapshot.move_to(&TaskId::from(id.as_str()), position)?;
            store.save(&next).await?;
            if let Some(frog) = next.frog() {
                println!("First up: {} - {}", frog.id, frog.title);
            }
        }
        Commands::List => {
            let snapshot = store.load_required().await?;
            if cli.json {
                return print_json(&snapshot);
            }

            println!("Tasks ({})", snapshot.tasks.len());
            for task in &snapshot.tasks {
                let mark = match snapshot.selected.iter().position(|s| *s == task.id) {
                    Some(pos) => format!("{}", pos + 1),
                    None => " ".to_string(),
                };
                println!("  [{}] {} | {} | {} | {}m - {}",
                    mark,
                    task.id,
                    task.context,
                    format_level(task.importance),
                    task.estimated_duration,
                    task.title,
                );
            }
        }
        Commands::Scores => {
            let snapshot = store.load_required().await?;
            let mut scores = engine.calculate_priority_scores(&snapshot.tasks, &snapshot.selected);
            if cli.json {
                return print_json(&scores);
            }

            scores.sort_by(|a, b| b.score.total_cmp(&a.score));
            println!("Priority scores");
            for score in scores {
                let title = snapshot.task(&score.task_id).map(|t| t.title.as_str()).unwrap_or("?");
                let f = &score.factors;
                println!("  {:.3} | {} - {} (due {:.1}, imp {:.1}, effort {:.1}, balance {:.1}, deps {:.1})",
                    score.score, score.task_id, title,
                    f.due_date, f.importance, f.effort, f.balance, f.dependencies,
                );
            }
        }
        Commands::Suggest => {
            let snapshot = store.load_required().await?;
            let suggestions = engine.get_suggestions(&snapshot.tasks, &snapshot.selected);
            if cli.json {
                return print_json(&suggestions);
            }

            if suggestions.is_empty() {
                println!("No suggestions");
            }
            for s in suggestions {
                println!("  {:.3} | {} - {}", s.score.score, s.task_id, s.title);
                for reason in s.reasons {
                    println!("        {}", reason);
                }
            }
        }
        Commands::Validate => {
            let snapshot = store.load_required().await?;
            let violations = engine.validate_selection(&snapshot.tasks, &snapshot.selected);
            if cli.json {
                return print_json(&violations);
            }
            if violations.is_empty() {
                println!("Selection is valid");
            }
            print_violations(&violations);
        }
        Commands::Order => {
            let snapshot = store.load_required().await?;
            let order = engine.working_order(&snapshot.tasks, &snapshot.selected);
            if cli.json {
                return print_json(&order.ordered);
            }

            for (i, task) in order.ordered.iter().enumerate() {
                println!("  {}. {} | {} - {}", i + 1, task.context, task.id, task.title);
            }
            if !order.excluded.is_empty() {
                info!("{} selected tasks left out of the order", order.excluded.len());
                println!("  Left out (dependency cycle):");
                for id in &order.excluded {
                    let title = snapshot.task(id).map(|t| t.title.as_str()).unwrap_or("?");
                    println!("    {} - {}", id, title);
                }
            }
        }
        Commands::Capacity => {
            let snapshot = store.load_required().await?;
            let estimate = engine.estimate_capacity(&snapshot.tasks, &snapshot.selected);
            if cli.json {
                return print_json(&estimate);
            }

            println!("Capacity");
            println!("  Total: {} min", estimate.total_minutes);
            println!("  Deep: {} min", estimate.deep_work_minutes);
            println!("  Shallow: {} min", estimate.shallow_work_minutes);
            println!("  Recommended tasks: {}", estimate.recommended_task_count);
            for warning in &estimate.warnings {
                println!("  ! {}", warning);
            }
        }
        Commands::Deps { id } => {
            let snapshot = store.load_required().await?;
            let task_id = TaskId::from(id.as_str());
            if snapshot.task(&task_id).is_none() {
                bail!("Task not found: {}", id);
            }

            let info = engine.detect_dependencies(&snapshot.tasks, &task_id);
            if cli.json {
                return print_json(&info);
            }

            println!("Task: {}", id);
            println!("  Can be completed: {}", info.can_be_completed);
            println!("  Prerequisites:");
            for t in &info.prerequisites {
                let state = if snapshot.is_selected(&t.id) { "selected" } else { "not selected" };
                println!("    {} - {} ({})", t.id, t.title, state);
            }
            println!("  Dependents:");
            for t in &info.dependents {
                println!("    {} - {}", t.id, t.title);
            }
        }
        Commands::State => {
            let snapshot = store.load_required().await?;
            let state = engine.get_selection_state(&snapshot.tasks, &snapshot.selected);
            print_json(&state)?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Reading config {}", path.display()))?;
    let config = serde_json::from_str(&json).context("Parsing engine configuration")?;
    debug!("Loaded engine configuration from {}", path.display());
    Ok(config)
}

/// Command-line overrides win over the configuration file.
fn apply_overrides(
    constraints: Constraints,
    max_deep: Option<usize>,
    max_shallow: Option<usize>,
    max_effort: Option<u32>,
) -> Constraints {
    let mut constraints = constraints.with_context_limits(
        max_deep.unwrap_or(constraints.max_deep_work_tasks),
        max_shallow.unwrap_or(constraints.max_shallow_tasks),
    );
    if let Some(minutes) = max_effort {
        constraints = constraints.with_max_daily_effort(minutes);
    }
    constraints
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_violations(violations: &[String]) {
    for v in violations {
        println!("  ! {}", v);
    }
}

fn parse_level(s: &str) -> Result<Level> {
    s.parse().map_err(anyhow::Error::msg)
}

/// Accepts RFC 3339 or a bare date; a bare date means the end of that day (UTC).
fn parse_time(s: &str) -> Result<Time> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {}", s))?;
    let Some(end_of_day) = date.and_hms_opt(23, 59, 59) else {
        bail!("Invalid date: {}", s);
    };
    Ok(Utc.from_utc_datetime(&end_of_day))
}

fn format_level(level: Option<Level>) -> &'static str {
    match level {
        Some(Level::High) => "HIGH",
        Some(Level::Medium) => "MEDIUM",
        Some(Level::Low) => "LOW",
        None => "-",
    }
}
