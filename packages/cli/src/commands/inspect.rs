use super::read_page;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagekit_editor::EditorConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Stored page (JSON section list)
    pub page: PathBuf,
}

pub fn inspect(args: InspectArgs, config: &EditorConfig) -> Result<()> {
    let document = read_page(&args.page, config)?;

    println!("{} {}", "📄".bright_blue(), args.page.display().to_string().bold());

    if document.is_empty() {
        println!("{}", "   (empty page)".dimmed());
        return Ok(());
    }

    for (index, block) in document.blocks().iter().enumerate() {
        println!(
            "  {:>3} {} {}/{} {}",
            index,
            block.id.as_str().cyan(),
            block.block_type,
            block.variant.bold(),
            format!(
                "props={} styles={} content={}",
                block.props.len(),
                block.element_styles.len(),
                block.element_content.len()
            )
            .dimmed()
        );
    }

    println!();
    println!("{} {} blocks", "✓".green(), document.len());

    Ok(())
}
