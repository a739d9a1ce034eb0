use super::{load_lesson, open_store};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lessonkit_editor::LessonId;

#[derive(Debug, Args)]
pub struct PagesArgs {
    /// Lesson to inspect
    pub lesson: String,

    /// List the blocks on each page
    #[arg(short, long)]
    pub blocks: bool,
}

pub async fn pages(args: PagesArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = open_store(&config, cwd);
    let lesson_id = LessonId::new(&args.lesson);

    let Some(doc) = load_lesson(&store, &lesson_id).await? else {
        println!("{} {} has no saved content", "⚠️".yellow(), lesson_id);
        return Ok(());
    };

    let pages = doc.compute_pages();
    if pages.is_empty() {
        println!("{} is empty", lesson_id.to_string().bright_white());
        return Ok(());
    }

    println!(
        "{} {} blocks, {} pages",
        lesson_id.to_string().bright_white().bold(),
        doc.len(),
        pages.len()
    );

    for page in &pages {
        let numbering = if page.show_page_number {
            "numbered"
        } else {
            "unnumbered"
        };
        println!(
            "  Page {} {} {} - {} blocks",
            page.number.to_string().bold(),
            page.background_color.cyan(),
            numbering.dimmed(),
            page.blocks.len()
        );

        if args.blocks {
            for block in &page.blocks {
                println!("      {} {}", block.type_name(), block.id.to_string().dimmed());
            }
        }
    }

    Ok(())
}
