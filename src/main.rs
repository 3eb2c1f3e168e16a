use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use todostore::{Config, KvStore, NewTodo, Priority, Todo, TodoPatch, TodoStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - todo list persisted to a local key-value slot")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new todo at the top of the list
    Add {
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },

    /// List todos, newest first
    List {
        /// Print the stored JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Flip the completed flag of a todo
    Toggle { id: i64 },

    /// Change fields of a todo
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        /// Due date as YYYY-MM-DD
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a todo
    Delete { id: i64 },
}

fn check_due(due: &str) -> Result<String> {
    NaiveDate::parse_from_str(due, "%Y-%m-%d").wrap_err_with(|| format!("Invalid due date: {}", due))?;
    Ok(due.to_string())
}

fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "✓".green() } else { "·".normal() };
    let priority = match &todo.priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".blue(),
        Priority::Other(s) => s.normal(),
    };
    let due = todo
        .due_date
        .as_deref()
        .map(|d| format!(" due {}", d))
        .unwrap_or_default();
    let title = if todo.completed {
        todo.title.dimmed()
    } else {
        todo.title.bold()
    };

    let mut line = format!("{} {} [{}] {}{}", mark, todo.id, priority, title, due);
    if !todo.content.is_empty() {
        line.push_str(&format!("\n    {}", todo.content));
    }
    line
}

fn require<K: KvStore>(store: &TodoStore<K>, id: i64) -> Result<()> {
    if store.get(id).is_none() {
        return Err(eyre!("No todo with id {}", id));
    }
    Ok(())
}

fn run<K: KvStore>(store: &mut TodoStore<K>, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            title,
            content,
            priority,
            due,
        } => {
            let due_date = due.as_deref().map(check_due).transpose()?;
            let data = NewTodo {
                title,
                content,
                priority,
                due_date,
            };
            let id = store.add_new_todo(data)?;
            println!("{} Added todo {}", "✓".green(), id);
        }

        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.todos())?);
            } else if store.is_empty() {
                println!("No todos");
            } else {
                for todo in store.todos() {
                    println!("{}", format_todo(todo));
                }
            }
        }

        Commands::Toggle { id } => {
            require(store, id)?;
            store.toggle_complete(id)?;
            if let Some(todo) = store.get(id) {
                println!("{}", format_todo(todo));
            }
        }

        Commands::Edit {
            id,
            title,
            content,
            priority,
            due,
            clear_due,
        } => {
            require(store, id)?;
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(check_due).transpose()?.map(Some)
            };
            let patch = TodoPatch {
                title,
                content,
                completed: None,
                priority,
                due_date,
            };
            store.edit_todo(id, patch)?;
            if let Some(todo) = store.get(id) {
                println!("{}", format_todo(todo));
            }
        }

        Commands::Delete { id } => {
            require(store, id)?;
            store.delete_todo(id)?;
            println!("{} Deleted todo {}", "✓".green(), id);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.dir = dir;
    }

    // One store for the whole process, handed to the command
    let mut store = config.open_store().context("Failed to open todo store")?;
    run(&mut store, cli.command)
}
