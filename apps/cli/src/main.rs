use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    connect, load_settings, task_href, Completion, ExploreApi, GoalView, InteractionController,
    TaskDetailView,
};
use shared::domain::SubTask;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "explore", about = "Break a goal into sub-tasks and explore ideas for each")]
struct Cli {
    /// Overrides `api_base_url` from settings.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Overrides `database_url` from settings.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the sub-task list with a fresh decomposition of GOAL.
    Decompose {
        goal: String,
        /// Defaults to the stored personalization.
        #[arg(long)]
        personalization: Option<String>,
    },
    /// List the current sub-tasks.
    Tasks,
    /// Fetch ideas for a sub-task, given by number, text or route.
    Options {
        task: String,
        /// Check option N (1-based); repeatable.
        #[arg(long = "select", value_name = "N")]
        select: Vec<usize>,
        /// Append the checked options to personalization.
        #[arg(long)]
        commit: bool,
    },
    /// Show or replace the personalization text.
    Personalization {
        #[arg(long)]
        set: Option<String>,
    },
    /// Ask for a plan summary based on the goal and personalization.
    Summarize,
    /// Forget goal, sub-tasks, personalization and summary.
    Reset,
    /// Check the backend and the local store.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let runtime = connect(&settings).await?;
    let controller = runtime.controller.as_ref();

    match cli.command {
        Command::Decompose {
            goal,
            personalization,
        } => {
            let personalization = match personalization {
                Some(text) => text,
                None => controller.snapshot().await.personalization,
            };
            match controller.decompose(&goal, &personalization).await? {
                Completion::Applied(_) => print_goal_view(controller).await,
                Completion::Skipped => println!("goal is empty; nothing to decompose"),
                Completion::Superseded => bail!("decomposition was superseded"),
            }
        }
        Command::Tasks => print_goal_view(controller).await,
        Command::Options {
            task,
            select,
            commit,
        } => {
            let tasks = controller.snapshot().await.tasks;
            let outcome = match pick_task(&tasks, &task) {
                Some(found) => controller.open_task(found.id).await?,
                None if task.starts_with('/') => controller.open_route(&task).await?,
                None => controller.open_route(&task_href(&task)).await?,
            };
            if !matches!(outcome, Completion::Applied(_)) {
                bail!("options for '{task}' were not applied");
            }

            for number in select {
                let index = number
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("option numbers start at 1"))?;
                controller.toggle_selection(index).await?;
            }

            let snapshot = controller.snapshot().await;
            let detail = TaskDetailView::from_snapshot(&snapshot)
                .context("task detail view is not active")?;
            print_task_detail(&detail);

            if commit {
                match controller.commit_selections().await? {
                    Some(updated) => println!("\npersonalization: {updated}"),
                    None => println!("\nnothing selected; personalization unchanged"),
                }
            }
        }
        Command::Personalization { set } => {
            if let Some(text) = set {
                controller.set_personalization(&text).await?;
            }
            println!("{}", controller.snapshot().await.personalization);
        }
        Command::Summarize => {
            let snapshot = controller.snapshot().await;
            if let Completion::Applied(summary) = controller
                .summarize(&snapshot.goal, &snapshot.personalization)
                .await?
            {
                println!("{summary}");
            }
        }
        Command::Reset => {
            controller.reset_all().await?;
            println!("cleared");
        }
        Command::Status => {
            let health = runtime
                .api
                .health()
                .await
                .with_context(|| format!("backend at {} is unreachable", settings.api_base_url))?;
            runtime
                .store
                .health_check()
                .await
                .context("local store health check failed")?;
            println!("backend: {}", health.status);
            println!("store: ok");
        }
    }

    Ok(())
}

/// A 1-based number from `explore tasks`, or an exact sub-task text.
fn pick_task<'a>(tasks: &'a [SubTask], arg: &str) -> Option<&'a SubTask> {
    if let Ok(number) = arg.parse::<usize>() {
        if let Some(task) = number.checked_sub(1).and_then(|index| tasks.get(index)) {
            return Some(task);
        }
    }
    tasks.iter().find(|task| task.text == arg)
}

async fn print_goal_view(controller: &InteractionController) {
    let view = GoalView::from_snapshot(&controller.snapshot().await);
    if !view.goal.is_empty() {
        println!("goal: {}", view.goal);
    }
    if view.entries.is_empty() {
        println!("no sub-tasks yet");
    }
    for (number, entry) in view.entries.iter().enumerate() {
        println!("{:>3}. {}  ({})", number + 1, entry.label, entry.href);
    }
    if let Some(summary) = view.summary {
        println!("\nsummary:\n{summary}");
    }
}

fn print_task_detail(detail: &TaskDetailView) {
    println!("{}", detail.title);
    if !detail.recommended.is_empty() {
        println!("\nrecommended: {}", detail.recommended);
    }
    for row in &detail.options {
        let mark = if row.checked { "x" } else { " " };
        println!("  [{mark}] {}. {}", row.index + 1, row.label);
    }
}
