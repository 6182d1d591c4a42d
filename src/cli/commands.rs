use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "day", about = concat!("daylist v", env!("CARGO_PKG_VERSION"), " - today, projects, done"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different store directory (default: $DAYLIST_DIR or ~/.local/share/daylist)
    #[arg(short = 'C', long = "store-dir", global = true)]
    pub store_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a view: Today (default) or a project
    List(ListArgs),
    /// Show one task in detail
    Show(IdArg),
    /// Add a task
    Add(AddArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Mark a task completed
    Done(IdArg),
    /// Mark a task not completed
    Undone(IdArg),
    /// Flip a task between completed and not completed
    Toggle(IdArg),
    /// Delete a task and its subtasks
    Rm(IdArg),
    /// Manage projects
    Project(ProjectCmd),
    /// Validate the stored data (read-only)
    Check,
    /// Show or change settings in config.toml
    Config(ConfigArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Project ID to list ("today" for the Today view)
    pub project: Option<String>,
    /// Include completed tasks even when ui.hide_completed is set
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Due date: YYYY-MM-DD, "today" or "tomorrow"
    #[arg(long)]
    pub due: Option<String>,
    /// Priority 1 (highest) to 4 (lowest)
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=4))]
    pub priority: Option<i64>,
    /// Project ID (default: Today, or the parent's project for subtasks)
    #[arg(long)]
    pub project: Option<String>,
    /// Make this a subtask of the given task ID
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description
    #[arg(short, long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,
    /// New due date: YYYY-MM-DD, "today" or "tomorrow"
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    /// New priority 1 (highest) to 4 (lowest)
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=4), conflicts_with = "clear_priority")]
    pub priority: Option<i64>,
    /// Remove the priority
    #[arg(long)]
    pub clear_priority: bool,
    /// Move to another project ("today" for the Today view)
    #[arg(long)]
    pub project: Option<String>,
}

// ---------------------------------------------------------------------------
// Project args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: Option<ProjectAction>,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects, favorites first (default)
    List,
    /// Create a project
    Add(ProjectAddArgs),
    /// Delete a project (its tasks are kept)
    Rm(ProjectRmArgs),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Project name (at most 120 characters)
    pub name: String,
    /// Palette name (charcoal, red, orange, yellow, green, blue, purple, pink),
    /// #rrggbb or rgb(r, g, b)
    #[arg(long)]
    pub color: Option<String>,
    /// Do not mark the project as a favorite
    #[arg(long)]
    pub no_favorite: bool,
}

#[derive(Args)]
pub struct ProjectRmArgs {
    /// Project ID
    pub id: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigArgs {
    /// Setting as section.name, e.g. ui.hide_completed (omit to show all)
    pub key: Option<String>,
    /// New value (omit to print the current one)
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (RFC 3339; default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
