use super::{read_input, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use scribe_markdown::{parse, serialize_with};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct FmtArgs {
    /// Markdown file (`-` for stdin)
    pub path: PathBuf,

    /// Rewrite the file in place instead of printing
    #[arg(short, long)]
    pub write: bool,

    /// Fail if the file is not already normalized
    #[arg(long, conflicts_with = "write")]
    pub check: bool,
}

pub fn fmt(args: FmtArgs, ctx: &Context) -> Result<()> {
    let source = read_input(&args.path)?;
    let formatted = format_markdown(&source, ctx);

    if args.check {
        if formatted.trim_end() != source.trim_end() {
            anyhow::bail!("{} is not formatted", args.path.display());
        }
        eprintln!("{} {}", "✓".green(), args.path.display());
        return Ok(());
    }

    if args.write {
        std::fs::write(&args.path, format!("{}\n", formatted))
            .with_context(|| format!("Failed to write {}", args.path.display()))?;
        eprintln!("{} {}", "✓".green(), args.path.display());
        return Ok(());
    }

    println!("{}", formatted);
    Ok(())
}

/// Parse and re-serialize with the configured markdown options
pub fn format_markdown(source: &str, ctx: &Context) -> String {
    let tree = parse(source, ctx.manager.schema());
    let formatted = serialize_with(&tree, &ctx.config.markdown);
    info!(blocks = tree.child_count(), "formatted markdown");
    formatted
}
