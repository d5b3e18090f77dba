use super::read_page;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagekit_editor::{
    BlockId, DragController, DragPayload, DragSource, DropAction, DropTarget, EditSession, EditorConfig, Mutation,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Stored page (JSON section list)
    pub page: PathBuf,

    /// Edit script (JSON array of steps)
    pub script: PathBuf,

    /// Write the edited page here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// One scripted user action
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Step {
    Apply {
        mutation: Mutation,
    },
    Undo,
    Redo,
    #[serde(rename_all = "camelCase")]
    Select {
        block_id: BlockId,
        #[serde(default)]
        element_key: Option<String>,
    },
    Drop {
        source: ScriptedSource,
        #[serde(default)]
        target: Option<ScriptedTarget>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptedSource {
    #[serde(rename_all = "camelCase")]
    Existing { block_id: BlockId },
    Palette(DragPayload),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ScriptedTarget {
    Gap(usize),
    Block(BlockId),
}

impl From<ScriptedSource> for DragSource {
    fn from(source: ScriptedSource) -> Self {
        match source {
            ScriptedSource::Existing { block_id } => DragSource::Existing { block_id },
            ScriptedSource::Palette(payload) => payload.into(),
        }
    }
}

impl From<ScriptedTarget> for DropTarget {
    fn from(target: ScriptedTarget) -> Self {
        match target {
            ScriptedTarget::Gap(k) => DropTarget::Gap(k),
            ScriptedTarget::Block(id) => DropTarget::Block(id),
        }
    }
}

pub fn apply(args: ApplyArgs, config: &EditorConfig) -> Result<()> {
    let document = read_page(&args.page, config)?;
    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read {}", args.script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&script)
        .with_context(|| format!("{} is not a valid edit script", args.script.display()))?;

    let mut session = EditSession::with_document(document, config.clone());
    let mut drag = DragController::new();
    let mut changed = 0;

    for (i, step) in steps.into_iter().enumerate() {
        let applied = run_step(&mut session, &mut drag, step);
        tracing::debug!(step = i, applied, "Script step");
        if applied {
            changed += 1;
        }
    }

    let page = session.export_page().to_json_string()?;
    match &args.out {
        Some(path) => {
            fs::write(path, &page).with_context(|| format!("Cannot write {}", path.display()))?;
            eprintln!("{} Wrote {}", "✓".green(), path.display());
        }
        None => println!("{}", page),
    }

    eprintln!(
        "{} {} steps changed the page, history depth {}",
        "✨".green(),
        changed,
        session.history().len()
    );

    Ok(())
}

/// Run one step; true if the page changed
fn run_step(session: &mut EditSession, drag: &mut DragController, step: Step) -> bool {
    match step {
        Step::Apply { mutation } => session.apply(mutation),
        Step::Undo => session.undo(),
        Step::Redo => session.redo(),
        Step::Select { block_id, element_key } => {
            match element_key {
                Some(key) => session.select_element(&block_id, key),
                None => session.select_block(&block_id),
            }
            false
        }
        Step::Drop { source, target } => {
            drag.start(source.into());
            match drag.end(target.map(DropTarget::from), session.document()) {
                // Scripts have no content service; the seeded block stays as dropped
                Some(DropAction::InsertAndEnrich {
                    index,
                    variant,
                    block_type,
                    default_props,
                }) => {
                    session.insert_new(index, &variant, block_type.as_deref(), default_props);
                    true
                }
                Some(DropAction::Apply(mutation)) => session.apply(mutation),
                None => false,
            }
        }
    }
}
