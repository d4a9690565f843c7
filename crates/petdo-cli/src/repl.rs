//! Interactive command language. Each stdin line is parsed with clap.

use clap::{Parser, Subcommand};
use petdo_core::app::{RuntimeError, TaskView, TrackerHandle, TrackerView};
use petdo_core::domain::{
    deadline_from_parts, Companion, CompanionEvent, ShopCatalog, TaskId, TaskStatus,
    MAX_HEALTH,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: ReplCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReplCommand {
    /// Add a new task
    ///
    /// Example: add water the plants --hours 1 --minutes 30
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Deadline in minutes (1..=1440)
        #[arg(short, long, conflicts_with_all = ["hours", "minutes"])]
        deadline: Option<u32>,
        /// Deadline hours part (0..=24)
        #[arg(long)]
        hours: Option<u32>,
        /// Deadline minutes part (0..=59)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Pause a pending task
    Pause { task: String },
    /// Resume a paused task
    Resume { task: String },
    /// Mark a task as completed
    #[command(alias = "done")]
    Complete { task: String },
    /// Move a completed task back to pending
    Reopen { task: String },
    /// Restart a failed task with a fresh deadline
    Retry { task: String },
    /// Delete a task
    #[command(alias = "rm")]
    Delete { task: String },
    /// Buy a shop item
    Buy { item: String },
    /// List shop items
    Shop,
    /// List tasks and the companion
    #[command(alias = "ls")]
    List,
    /// Dump the current view as JSON
    Json,
    /// Evaluate deadlines now
    Tick,
    /// Leave
    #[command(alias = "exit")]
    Quit,
}

pub enum Flow {
    Continue,
    Quit,
}

pub async fn execute(handle: &TrackerHandle, command: ReplCommand) -> Result<Flow, RuntimeError> {
    match command {
        ReplCommand::Add {
            text,
            deadline,
            hours,
            minutes,
        } => {
            let deadline = match (hours, minutes) {
                (None, None) => deadline,
                (h, m) => deadline_from_parts(h.unwrap_or(0), m.unwrap_or(0)),
            };
            let task = handle.create(text.join(" "), deadline).await?;
            println!("added: {}", task.text);
        }
        ReplCommand::Pause { task } => transition(handle, &task, TaskStatus::Paused).await?,
        ReplCommand::Resume { task } => transition(handle, &task, TaskStatus::Pending).await?,
        ReplCommand::Complete { task } => {
            transition(handle, &task, TaskStatus::Completed).await?
        }
        ReplCommand::Reopen { task } => transition(handle, &task, TaskStatus::Pending).await?,
        ReplCommand::Retry { task } => {
            if let Some(id) = resolve(handle, &task) {
                let task = handle.retry(id).await?;
                println!("retrying: {}", task.text);
            }
        }
        ReplCommand::Delete { task } => {
            if let Some(id) = resolve(handle, &task) {
                let task = handle.delete(id).await?;
                println!("deleted: {}", task.text);
            }
        }
        ReplCommand::Buy { item } => {
            let companion = handle.purchase(item).await?;
            println!("{}", companion_line(&companion));
        }
        ReplCommand::Shop => print_shop(&handle.view().companion),
        ReplCommand::List => print_view(&handle.view()),
        ReplCommand::Json => match serde_json::to_string_pretty(&handle.view()) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::warn!(error = %err, "failed to render view"),
        },
        ReplCommand::Tick => {
            let failed = handle.tick().await?;
            println!("{} task(s) failed", failed.len());
        }
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn transition(
    handle: &TrackerHandle,
    task: &str,
    target: TaskStatus,
) -> Result<(), RuntimeError> {
    if let Some(id) = resolve(handle, task) {
        let task = handle.set_status(id, target).await?;
        println!("{}: {}", task.status, task.text);
    }
    Ok(())
}

/// Accepts a 1-based list position or a task id.
fn resolve(handle: &TrackerHandle, raw: &str) -> Option<TaskId> {
    let view = handle.view();
    let found = match raw.parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| view.tasks.get(i)).map(|t| t.id),
        Err(_) => raw.parse::<TaskId>().ok(),
    };
    if found.is_none() {
        println!("no such task: {raw}");
    }
    found
}

pub fn print_view(view: &TrackerView) {
    println!("{}", companion_line(&view.companion));
    if view.tasks.is_empty() {
        println!("  (no tasks)");
        return;
    }
    for (i, task) in view.tasks.iter().enumerate() {
        println!("{}", task_line(i + 1, task));
    }
}

fn task_line(position: usize, task: &TaskView) -> String {
    let mut line = format!("{position:>3}. [{:<9}] {}", task.status.as_str(), task.text);
    if let Some(deadline) = task.deadline {
        line.push_str(&format!("  ({deadline})"));
    }
    line
}

fn companion_line(companion: &Companion) -> String {
    format!(
        "{} the {} | Lv {} | XP {} | HP {}/{} | {} coins | {}",
        companion.name,
        companion.species,
        companion.level,
        companion.experience,
        companion.health,
        MAX_HEALTH,
        companion.currency,
        companion.mood,
    )
}

fn print_shop(companion: &Companion) {
    for item in ShopCatalog.items() {
        let marker = if companion.can_afford(item.price) { ' ' } else { 'x' };
        println!(
            "{marker} {} {:<14} {:>4}  {}: {}",
            item.icon, item.id, item.price, item.name, item.description
        );
    }
}

pub fn describe_event(event: &CompanionEvent) -> String {
    match event {
        CompanionEvent::RewardGranted { coins, experience } => {
            format!("* reward: +{coins} coins, +{experience} XP")
        }
        CompanionEvent::PenaltyApplied { health_delta } => {
            format!("* a deadline was missed: {health_delta} HP")
        }
        CompanionEvent::PurchaseMade { item } => format!("* bought {item}"),
    }
}
