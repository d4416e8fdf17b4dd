use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use content::block::validate_blocks;
use content::{BlockTree, PageBlock};

use crate::client::ApiClient;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON file holding an array of blocks (`-` for stdin)
    pub file: PathBuf,
    /// Render through the server's preview endpoint instead of locally
    #[arg(long)]
    pub remote: bool,
    /// Report validation problems without failing
    #[arg(long)]
    pub lenient: bool,
}

pub async fn run(client: &ApiClient, args: RenderArgs) -> Result<()> {
    let raw = if args.file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    let blocks: Vec<PageBlock> = serde_json::from_str(&raw).context("Expected a JSON array of blocks")?;

    if let Err(e) = validate_blocks(&blocks) {
        if !args.lenient {
            return Err(e.into());
        }
        eprintln!("{} {e}", style("warning:").yellow());
    }

    if args.remote {
        for block in &blocks {
            match client.preview(block).await? {
                Some(html) => println!("{html}"),
                None => eprintln!(
                    "{} skipped unrecognized block type '{}'",
                    style("warning:").yellow(),
                    block.block_type
                ),
            }
        }
        return Ok(());
    }

    let tree = BlockTree::from_blocks(blocks);
    for markup in content::render::render_tree(&tree) {
        println!("{markup}");
    }
    Ok(())
}
