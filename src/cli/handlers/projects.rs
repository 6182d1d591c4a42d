use super::{Context, print_json};
use crate::cli::commands::{ProjectAction, ProjectAddArgs, ProjectCmd, ProjectRmArgs};
use crate::cli::forms;
use crate::cli::output::format_project_list;
use crate::model::project::ProjectDraft;

pub fn cmd_project(ctx: &Context, args: ProjectCmd) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        None | Some(ProjectAction::List) => cmd_project_list(ctx),
        Some(ProjectAction::Add(add)) => cmd_project_add(ctx, add),
        Some(ProjectAction::Rm(rm)) => cmd_project_rm(ctx, rm),
    }
}

fn cmd_project_list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let projects = ctx.projects().list_for_display();
    if ctx.json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("no projects");
        return Ok(());
    }
    for line in format_project_list(&projects) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_project_add(ctx: &Context, args: ProjectAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let name = forms::project_name(&args.name)?;
    let color = match &args.color {
        Some(c) => forms::color(c)?,
        None => forms::color(&ctx.config.projects.default_color)?,
    };

    let project = ctx.projects().add(ProjectDraft {
        name,
        color,
        is_favorite: !args.no_favorite,
    })?;

    if ctx.json {
        return print_json(&project);
    }
    println!("{}", project.id);
    Ok(())
}

fn cmd_project_rm(ctx: &Context, args: ProjectRmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let existed = ctx.projects().find(&args.id).is_some();
    ctx.projects().delete(&args.id)?;

    // Tasks keep their projectId; count them so the user knows
    let orphaned = ctx
        .todos()
        .list()
        .iter()
        .filter(|t| t.project_id.as_deref() == Some(args.id.as_str()))
        .count();

    if ctx.json {
        return print_json(&serde_json::json!({
            "deleted": existed,
            "id": args.id,
            "remainingTasks": orphaned,
        }));
    }
    if !existed {
        println!("nothing to delete: {}", args.id);
    } else if orphaned > 0 {
        println!(
            "deleted {} ({} task(s) still reference it)",
            args.id, orphaned
        );
    } else {
        println!("deleted {}", args.id);
    }
    Ok(())
}
