use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_model::TextChange;
use quire_renderer::analyze_text_changes;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Text before the edit
    pub old: String,

    /// Text after the edit
    pub new: String,

    /// Caret offset reported by the host (chars)
    #[arg(long, default_value_t = 0)]
    pub caret: usize,

    /// Selection length reported by the host (chars)
    #[arg(long, default_value_t = 0)]
    pub selection_length: usize,
}

pub fn diff(args: DiffArgs) -> Result<()> {
    let change = TextChange::new(args.old, args.new).with_selection(args.caret, args.selection_length);
    let operations = analyze_text_changes(&change);

    if operations.is_empty() {
        eprintln!("{}", "No changes".yellow());
    }
    println!("{}", serde_json::to_string_pretty(&operations)?);

    Ok(())
}
