use super::registry;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lessonkit_editor::CategoryFilter;

#[derive(Debug, Args)]
pub struct BlocksArgs {
    /// Category to list (all, basic, media, interactive, layout, advanced)
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,

    /// Print definitions as JSON
    #[arg(long)]
    pub json: bool,

    /// Show each type's settings schema
    #[arg(short, long)]
    pub settings: bool,
}

pub fn blocks(args: BlocksArgs) -> Result<()> {
    let registry = registry();
    let definitions = registry.list_by_category(args.category);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    for definition in &definitions {
        println!(
            "{:<14} {:<14} {:<12} {}",
            definition.type_name().bright_white().bold(),
            definition.name,
            definition.category.to_string().cyan(),
            definition.description.dimmed()
        );

        if args.settings {
            for field in &definition.settings {
                let kind = serde_json::to_value(field.kind)?;
                println!(
                    "    {:<20} {:<10} {}",
                    field.name,
                    kind.as_str().unwrap_or_default(),
                    field.label.dimmed()
                );
            }
        }
    }

    println!();
    println!("{} block types", definitions.len());

    Ok(())
}
