use super::{open_store, registry};
use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lessonkit_editor::{
    BlockType, CourseId, CourseOutline, Document, LessonId, LessonStore, LessonSummary,
    ModuleOutline, StoredDocument,
};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Data directory for lessons and courses
    #[arg(short, long, default_value = "content")]
    pub data_dir: String,

    /// Skip the sample course
    #[arg(long)]
    pub empty: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const SAMPLE_COURSE: &str = "getting-started";
const SAMPLE_LESSON: &str = "welcome";

pub async fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Lessonkit project...".bright_blue().bold());

    let config = Config {
        data_dir: args.data_dir.clone(),
        default_course: (!args.empty).then(|| SAMPLE_COURSE.to_string()),
        ..Config::default()
    };

    let data_dir = config.get_data_dir(cwd);
    for sub in ["lessons", "courses"] {
        let dir = data_dir.join(sub);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            println!("  {} Created {}/{}/", "✓".green(), args.data_dir, sub);
        }
    }

    if !args.empty {
        write_sample_course(&config, cwd).await?;
        println!("  {} Created sample course {}", "✓".green(), SAMPLE_COURSE);
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: lessonkit lessons");
    println!("  2. Run: lessonkit pages {}", SAMPLE_LESSON);
    println!("  3. Run: lessonkit edit {} --ops ops.json", SAMPLE_LESSON);

    Ok(())
}

async fn write_sample_course(config: &Config, cwd: &str) -> Result<()> {
    let store = open_store(config, cwd);
    let registry = registry();

    let welcome = LessonId::new(SAMPLE_LESSON);
    let mut doc = Document::new(welcome.clone());

    let content: [(BlockType, Value); 4] = [
        (BlockType::Heading, json!({ "text": "Welcome to the course", "level": 1 })),
        (BlockType::Text, json!({ "content": "Each lesson is a list of blocks." })),
        (BlockType::PageBreak, json!({ "backgroundColor": "#f8fafc" })),
        (BlockType::Quiz, json!({ "question": "Are pages stored separately?" })),
    ];

    for (block_type, data) in content {
        let id = doc.add_block(&registry, block_type, None)?;
        if let Value::Object(fields) = data {
            doc.update_block_data(&registry, &id, &fields)?;
        }
    }

    store
        .save_document(&welcome, &StoredDocument::from(&doc.snapshot()))
        .await?;
    store
        .save_document(&LessonId::new("next-steps"), &StoredDocument::default())
        .await?;

    store
        .save_course(&CourseOutline {
            course_id: CourseId::new(SAMPLE_COURSE),
            title: "Getting Started".to_string(),
            modules: vec![ModuleOutline {
                id: "basics".to_string(),
                title: "Basics".to_string(),
                lessons: vec![
                    LessonSummary {
                        id: welcome,
                        title: "Welcome".to_string(),
                    },
                    LessonSummary {
                        id: LessonId::new("next-steps"),
                        title: "Next steps".to_string(),
                    },
                ],
            }],
        })
        .await?;

    Ok(())
}
