use chrono::{DateTime, Utc};

use super::{Context, print_json};
use crate::cli::commands::{ConfigArgs, RecoveryAction, RecoveryCmd, RecoveryPruneArgs};
use crate::io::config_io;
use crate::io::recovery;
use crate::ops::check::{self, CheckError, CheckWarning};

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

pub fn cmd_check(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let result = check::check_store(&ctx.store);

    if ctx.json {
        return print_json(&result);
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                CheckError::Unreadable { key, message } => {
                    println!("  [{}] unreadable: {}", key, message);
                }
                CheckError::DuplicateId { key, id } => {
                    println!("  [{}] {} is used by more than one record", key, id);
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                CheckWarning::DanglingProject {
                    todo_id,
                    project_id,
                } => {
                    println!("  {} belongs to missing project: {}", todo_id, project_id);
                }
                CheckWarning::DanglingParent { todo_id, parent_id } => {
                    println!("  {} has missing parent: {}", todo_id, parent_id);
                }
                CheckWarning::PriorityOutOfRange { todo_id, priority } => {
                    println!("  {} has priority {} (expected 1-4)", todo_id, priority);
                }
                CheckWarning::CompletionMismatch { todo_id, completed } => {
                    if *completed {
                        println!("  {} is completed but has no completedAt", todo_id);
                    } else {
                        println!("  {} is open but has a completedAt", todo_id);
                    }
                }
            }
        }
    }
    if result.valid {
        println!("✓ store is valid");
    } else {
        println!("✗ store has errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

pub fn cmd_config(ctx: &Context, args: ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dir = ctx.store.dir();
    match (args.key, args.value) {
        (None, _) => {
            if ctx.json {
                return print_json(&ctx.config);
            }
            print!("{}", toml::to_string_pretty(&ctx.config)?);
        }
        (Some(key), None) => {
            let value = config_io::get_config_value(&ctx.config, &key)?;
            if ctx.json {
                return print_json(&value);
            }
            match value {
                toml::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        (Some(key), Some(value)) => {
            let config = config_io::set_config_value(dir, &key, &value)?;
            let stored = config_io::get_config_value(&config, &key)?;
            tracing::info!(%key, value = %stored, "config updated");
            if ctx.json {
                return print_json(&stored);
            }
            println!("{} = {}", key, stored);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// recovery
// ---------------------------------------------------------------------------

pub fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> Result<(), Box<dyn std::error::Error>> {
    let dir = ctx.store.dir();
    match args.action {
        Some(RecoveryAction::Path) => {
            let path = recovery::recovery_log_path(dir);
            let path = std::path::absolute(&path).unwrap_or(path);
            println!("{}", path.display());
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => cmd_recovery_prune(ctx, prune),
        None => {
            let entries = recovery::read_recovery_entries(dir, Some(args.limit));
            if ctx.json {
                let list: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                return print_json(&list);
            }
            if entries.is_empty() {
                println!("recovery log is empty");
                return Ok(());
            }
            for entry in &entries {
                print!("{}", entry.to_markdown());
            }
            Ok(())
        }
    }
}

fn cmd_recovery_prune(
    ctx: &Context,
    args: RecoveryPruneArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let before = args
        .before
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid --before timestamp {:?}: {}", s, e))
        })
        .transpose()?;

    let removed = recovery::prune_recovery(ctx.store.dir(), before, args.all)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }
    println!("removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
    Ok(())
}
