mod maintenance;
mod projects;

use chrono::Local;

use crate::cli::commands::*;
use crate::cli::forms;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::store::FileStore;
use crate::model::config::Config;
use crate::model::todo::{TODAY_PROJECT, TodoDraft, TodoItem, TodoPatch, View};
use crate::ops::projects::ProjectRepository;
use crate::ops::todos::{TodoRepository, resolve_project_for_new};
use crate::ops::view;

/// Everything a command needs: the opened store and the loaded config
pub struct Context {
    pub store: FileStore,
    pub config: Config,
    pub json: bool,
}

impl Context {
    /// Open the store. An unreadable config.toml falls back to the defaults
    /// so that `day config` can still repair it.
    pub fn open(store_dir: Option<&str>, json: bool) -> Self {
        let dir = config_io::resolve_store_dir(store_dir);
        let config = config_io::read_config(&dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default settings");
            Config::default()
        });
        tracing::debug!(dir = %dir.display(), "opened store");
        Context {
            store: FileStore::new(dir),
            config,
            json,
        }
    }

    fn todos(&self) -> TodoRepository<'_, FileStore> {
        TodoRepository::new(&self.store)
    }

    fn projects(&self) -> ProjectRepository<'_, FileStore> {
        ProjectRepository::new(&self.store)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(cli.store_dir.as_deref(), cli.json);

    match cli.command {
        // No subcommand: show Today
        None => cmd_list(
            &ctx,
            ListArgs {
                project: None,
                all: false,
            },
        ),
        Some(cmd) => match cmd {
            Commands::List(args) => cmd_list(&ctx, args),
            Commands::Show(args) => cmd_show(&ctx, args),
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Edit(args) => cmd_edit(&ctx, args),
            Commands::Done(args) => cmd_set_completed(&ctx, args, Some(true)),
            Commands::Undone(args) => cmd_set_completed(&ctx, args, Some(false)),
            Commands::Toggle(args) => cmd_set_completed(&ctx, args, None),
            Commands::Rm(args) => cmd_rm(&ctx, args),
            Commands::Project(args) => projects::cmd_project(&ctx, args),
            Commands::Check => maintenance::cmd_check(&ctx),
            Commands::Config(args) => maintenance::cmd_config(&ctx, args),
            Commands::Recovery(args) => maintenance::cmd_recovery(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: &str) -> Box<dyn std::error::Error> {
    format!("task not found: {}", id).into()
}

/// Direct subtasks of `id`, in display order.
fn subtasks_of(all: &[TodoItem], id: &str) -> Vec<TodoItem> {
    let mut subs: Vec<TodoItem> = all
        .iter()
        .filter(|t| t.parent_id.as_deref() == Some(id))
        .cloned()
        .collect();
    view::sort_for_display(&mut subs);
    subs
}

/// Check a `--project` argument against the stored projects.
fn existing_project(ctx: &Context, project: &str) -> Result<String, Box<dyn std::error::Error>> {
    if project == TODAY_PROJECT || ctx.projects().find(project).is_some() {
        Ok(project.to_string())
    } else {
        Err(format!("project not found: {}", project).into())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let view = args.project.as_deref().map_or(View::Today, View::parse);
    let items = ctx.todos().list_for_view(&view);
    let projects = ctx.projects().list();

    let header = view::header(&view, &projects, &ctx.config.ui.today_accent);
    let summary = view::summarize(&items);
    let mut composed = view::compose(items);
    if ctx.config.ui.hide_completed && !args.all {
        composed = composed.without_completed();
    }

    if ctx.json {
        return print_json(&ListJson {
            view: &header,
            summary,
            composed: &composed,
        });
    }
    for line in format_view(&header, summary, &composed, &ctx.config.ui, &Local) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let all = ctx.todos().list();
    let todo = all
        .iter()
        .find(|t| t.id == args.id)
        .ok_or_else(|| not_found(&args.id))?;
    let subtasks = subtasks_of(&all, &todo.id);

    if ctx.json {
        return print_json(&TodoDetailJson {
            todo,
            subtasks: &subtasks,
        });
    }
    let projects = ctx.projects().list();
    for line in format_todo_detail(todo, &subtasks, &projects, &ctx.config.ui, &Local) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let title = forms::task_title(&args.title)?;
    let description = args.description.as_deref().and_then(forms::description);
    let due_date = args.due.as_deref().map(forms::due_timestamp).transpose()?;

    let parent = match &args.parent {
        Some(pid) => Some(ctx.todos().get(pid).ok_or_else(|| not_found(pid))?),
        None => None,
    };

    // Subtasks land in their parent's project unless told otherwise
    let project_id = match (&args.project, &parent) {
        (Some(p), _) => existing_project(ctx, p)?,
        (None, Some(parent)) => parent
            .project_id
            .clone()
            .unwrap_or_else(|| TODAY_PROJECT.to_string()),
        (None, None) => resolve_project_for_new(None, &View::Today),
    };

    let todo = ctx.todos().add(TodoDraft {
        title,
        description,
        completed: false,
        project_id: Some(project_id),
        due_date,
        priority: args.priority,
        completed_at: None,
        parent_id: parent.map(|p| p.id),
    })?;

    if ctx.json {
        return print_json(&todo);
    }
    println!("{}", todo.id);
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let repo = ctx.todos();
    if repo.get(&args.id).is_none() {
        return Err(not_found(&args.id));
    }

    let mut patch = TodoPatch {
        title: args.title.as_deref().map(forms::task_title).transpose()?,
        ..Default::default()
    };
    if let Some(desc) = &args.description {
        patch.description = Some(forms::description(desc));
    } else if args.clear_description {
        patch.description = Some(None);
    }
    if let Some(due) = &args.due {
        patch.due_date = Some(Some(forms::due_timestamp(due)?));
    } else if args.clear_due {
        patch.due_date = Some(None);
    }
    if let Some(p) = args.priority {
        patch.priority = Some(Some(p));
    } else if args.clear_priority {
        patch.priority = Some(None);
    }
    if let Some(project) = &args.project {
        patch.project_id = Some(Some(existing_project(ctx, project)?));
    }

    if patch.is_empty() {
        return Err("nothing to change: pass at least one field to edit".into());
    }
    repo.update(&args.id, &patch)?;

    if ctx.json {
        let updated = repo.get(&args.id).ok_or_else(|| not_found(&args.id))?;
        return print_json(&updated);
    }
    println!("updated {}", args.id);
    Ok(())
}

/// `done`, `undone` (explicit state) and `toggle` (`None`).
fn cmd_set_completed(
    ctx: &Context,
    args: IdArg,
    completed: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = ctx.todos();
    let updated = match completed {
        Some(state) => repo.set_completed(&args.id, state)?,
        None => repo.toggle(&args.id)?,
    };
    let todo = updated.ok_or_else(|| not_found(&args.id))?;

    if ctx.json {
        return print_json(&todo);
    }
    let state = if todo.completed { "done" } else { "open" };
    println!("{} → {}", todo.id, state);
    Ok(())
}

fn cmd_rm(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let removed = ctx.todos().delete(&args.id)?;

    if ctx.json {
        let ids: Vec<&str> = removed.iter().map(|t| t.id.as_str()).collect();
        return print_json(&serde_json::json!({ "deleted": ids }));
    }
    match removed.len() {
        0 => println!("nothing to delete: {}", args.id),
        1 => println!("deleted {}", args.id),
        n => println!("deleted {} and {} subtask(s)", args.id, n - 1),
    }
    Ok(())
}
