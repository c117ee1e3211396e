use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_common::{load_decorators, load_snapshot, RealFileSystem};
use quire_model::LayerTarget;
use quire_renderer::{HostTree, MemoryHost, Registries, RenderEngine};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Model snapshot (JSON)
    pub snapshot: PathBuf,

    /// Decorators (JSON array), overrides the config file
    #[arg(short, long)]
    pub decorators: Option<PathBuf>,

    /// Print only the content surface
    #[arg(long)]
    pub content_only: bool,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let fs = RealFileSystem;

    let model = load_snapshot(&fs, &args.snapshot)?;
    let decorators = match args.decorators.or_else(|| config.decorators_path(cwd)) {
        Some(path) => load_decorators(&fs, &path)?,
        None => Vec::new(),
    };
    info!(
        snapshot = %args.snapshot.display(),
        decorators = decorators.len(),
        "Rendering snapshot"
    );

    let mut host = MemoryHost::new();
    let content = host.create_element("div");
    host.set_attribute(content, "data-layer", LayerTarget::Content.as_str());

    let mut engine = RenderEngine::new(Registries::basic(), config.engine.clone(), content)?;
    for layer in LayerTarget::OVERLAYS {
        let root = host.create_element("div");
        host.set_attribute(root, "data-layer", layer.as_str());
        engine.attach_layer(layer, root);
    }

    let report = engine.render(&mut host, &model, &decorators)?;

    for layer in LayerTarget::ALL {
        if args.content_only && layer != LayerTarget::Content {
            continue;
        }
        let Some(root) = engine.layer_root(layer) else {
            continue;
        };
        let html = host.inner_html(root);
        if html.is_empty() && layer != LayerTarget::Content {
            continue;
        }
        println!("{}", format!("[{}]", layer).bright_blue().bold());
        println!("{}", html);
    }

    eprintln!();
    eprintln!(
        "{} {} nodes, {} decorations ({} generated)",
        "✓".green(),
        report.content.created,
        report.records,
        report.generated
    );
    if !report.layers.dropped.is_empty() {
        eprintln!(
            "{} dropped without geometry or surface: {}",
            "⚠️".yellow(),
            report.layers.dropped.join(", ")
        );
    }

    Ok(())
}
