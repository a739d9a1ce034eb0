use super::{load_lesson, open_store};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lessonkit_editor::{CourseId, FileStore, LessonId, LessonNavigator};

#[derive(Debug, Args)]
pub struct LessonsArgs {
    /// Show the outline of this course (defaults to the configured course)
    #[arg(short, long)]
    pub course: Option<String>,

    /// List every lesson file instead of a course outline
    #[arg(short, long)]
    pub all: bool,
}

pub async fn lessons(args: LessonsArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = open_store(&config, cwd);

    let course = args.course.or(config.default_course.clone());
    match course {
        Some(course) if !args.all => print_outline(&store, &CourseId::new(course)).await,
        _ => print_all(&store).await,
    }
}

async fn print_outline(store: &FileStore, course_id: &CourseId) -> Result<()> {
    let outline = store.course_outline(course_id).await?;
    println!("{} ({})", outline.title.bright_white().bold(), course_id);

    for module in &outline.modules {
        println!("  {}", module.title.cyan());
        for lesson in &module.lessons {
            println!("    {:<24} {}", lesson.id.to_string(), describe(store, &lesson.id).await);
        }
    }

    Ok(())
}

async fn print_all(store: &FileStore) -> Result<()> {
    let lessons = store.list_lessons().await?;
    if lessons.is_empty() {
        println!("{}", "⚠️  No lessons found".yellow());
        return Ok(());
    }

    for lesson in &lessons {
        println!("  {:<24} {}", lesson.to_string(), describe(store, lesson).await);
    }
    println!();
    println!("{} lessons", lessons.len());

    Ok(())
}

/// One-line summary; a lesson that fails to load is reported, not fatal
async fn describe(store: &FileStore, lesson_id: &LessonId) -> String {
    match load_lesson(store, lesson_id).await {
        Ok(Some(doc)) => format!("{} blocks, {} pages", doc.len(), doc.compute_pages().len()),
        Ok(None) => "not started".dimmed().to_string(),
        Err(e) => {
            tracing::warn!(lesson = %lesson_id, error = %e, "Failed to read lesson");
            format!("✗ {}", e).red().to_string()
        }
    }
}
