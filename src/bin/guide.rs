//! Guide CLI
//!
//! Inspect, create and convert `.gde` outline files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guide_rs::{ArchBits, Guide, GuideConfig, LoadOptions, NodeId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "guide")]
#[command(about = "Inspect, create and convert .gde outline files")]
struct Args {
    /// TOML file with load/store defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the outline of a guide
    Tree {
        file: PathBuf,

        /// Pointer width of the machine that wrote the file (32 or 64)
        #[arg(short, long)]
        arch: Option<ArchBits>,

        /// Emit a nested JSON outline instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the file header
    Info { file: PathBuf },

    /// Write a small sample guide
    Demo { file: PathBuf },

    /// Reload a guide and write it back with fixed-width references
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Pointer width of the machine that wrote the input (32 or 64)
        #[arg(short, long)]
        arch: Option<ArchBits>,
    },
}

#[derive(Serialize)]
struct OutlineNode {
    uid: u32,
    title: String,
    text: String,
    children: Vec<OutlineNode>,
}

fn outline(guide: &Guide, node: NodeId) -> OutlineNode {
    let data = guide.node(node);
    OutlineNode {
        uid: data.map(|d| d.uid()).unwrap_or_default(),
        title: data.map(|d| d.title.clone()).unwrap_or_default(),
        text: data.map(|d| d.text_lossy().into_owned()).unwrap_or_default(),
        children: guide
            .children(node)
            .map(|child| outline(guide, child))
            .collect(),
    }
}

fn load(file: &Path, arch: Option<ArchBits>, config: &GuideConfig) -> Result<Guide> {
    let options = LoadOptions {
        origin_arch: arch.unwrap_or(config.load.origin_arch),
    };
    Guide::load_with(file, &options).with_context(|| format!("Failed to load {}", file.display()))
}

fn demo() -> guide_rs::Result<Guide> {
    let mut guide = Guide::create_with_root("The Beginning", "Text of the root node")?;
    let root = guide.root();
    for title in ["My child", "My child 2"] {
        let child = guide.new_node_with(title, "Lorem ipsum dolor sit amet.")?;
        guide.add_child(root, child, None)?;
    }
    Ok(guide)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GuideConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => GuideConfig::default(),
    };

    match args.command {
        Command::Tree { file, arch, json } => {
            let guide = load(&file, arch, &config)?;
            if json {
                let tree = outline(&guide, guide.root());
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                println!("Filename={}", file.display());
                for (node, depth) in guide.preorder() {
                    if let Some(data) = guide.node(node) {
                        println!("{}{} [{}]", "-".repeat(depth), data.title, data.uid());
                    }
                }
            }
        }
        Command::Info { file } => {
            let header = guide_rs::probe(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&header)?);
        }
        Command::Demo { file } => {
            let guide = demo()?;
            guide.store_with(&file, &config.store)?;
            info!("Wrote sample guide to {}", file.display());
        }
        Command::Convert {
            input,
            output,
            arch,
        } => {
            let guide = load(&input, arch, &config)?;
            guide.store_with(&output, &config.store)?;
            info!(
                "Converted {} -> {} ({} nodes, {}-bit references)",
                input.display(),
                output.display(),
                guide.len(),
                config.store.ref_width
            );
        }
    }

    Ok(())
}
