use super::registry;
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use lessonkit_editor::{CloseOutcome, LessonHost, LessonId, Operation, SaveOutcome, UnsavedPolicy};
use std::io::Read;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Lesson to edit (created if it doesn't exist)
    pub lesson: String,

    /// JSON file with an array of operations, or "-" for stdin
    #[arg(short, long)]
    pub ops: String,

    /// Undo this many steps after applying the operations
    #[arg(long, default_value_t = 0)]
    pub undo: usize,

    /// Apply the operations but discard the result
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let operations = read_operations(&args.ops)?;

    let store = Arc::new(super::open_store(&config, cwd));
    let mut host = LessonHost::new(store, Arc::new(registry()), config.editor.clone());
    let lesson_id = LessonId::new(&args.lesson);

    println!(
        "{} {} ({} operations)",
        "✏️  Editing".bright_blue().bold(),
        lesson_id,
        operations.len()
    );

    let session = host.open_lesson(lesson_id.clone(), UnsavedPolicy::Flush).await?;

    for (i, op) in operations.into_iter().enumerate() {
        let name = op.name();
        match session.mutate(op) {
            Ok(result) => match result.block_id {
                Some(block_id) => println!("  {} {} {}", "✓".green(), name, block_id),
                None => println!("  {} {} {}", "·".dimmed(), name, "(no change)".dimmed()),
            },
            Err(e) => {
                tracing::warn!(
                    lesson = %lesson_id,
                    operation = i + 1,
                    error = %e,
                    "Operation rejected"
                );
                println!("  {} {} - {}", "✗".red(), name, e);
                host.close_lesson(UnsavedPolicy::Discard).await?;
                return Err(anyhow!("operation {} failed, nothing was saved", i + 1));
            }
        }
    }

    for _ in 0..args.undo {
        if !session.undo()? {
            break;
        }
        println!("  {} undo", "↶".yellow());
    }

    let pages = session.document().compute_pages().len();
    let blocks = session.document().len();

    let policy = if args.dry_run {
        UnsavedPolicy::Discard
    } else {
        UnsavedPolicy::Flush
    };

    match host.close_lesson(policy).await? {
        Some(CloseOutcome::Flushed(SaveOutcome::Saved { version })) => {
            tracing::info!(lesson = %lesson_id, version, blocks, "Lesson saved");
            println!("{} saved version {}", "✅".green(), version)
        }
        Some(CloseOutcome::Flushed(SaveOutcome::UpToDate)) => {
            println!("{} nothing to save", "✅".green())
        }
        Some(CloseOutcome::Discarded { dropped_version }) => {
            tracing::info!(lesson = %lesson_id, ?dropped_version, "Dry run discarded");
            println!("{} dry run, changes discarded", "⚠️".yellow())
        }
        None => {}
    }

    println!("   {} blocks on {} pages", blocks, pages);
    Ok(())
}

fn read_operations(source: &str) -> Result<Vec<Operation>> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))?
    };

    serde_json::from_str(&content).context("operations must be a JSON array")
}
