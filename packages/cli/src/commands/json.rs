use super::{read_input, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use scribe_editor::{DualContent, InitialContent};
use scribe_markdown::parse;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ToJsonArgs {
    /// Markdown file (`-` for stdin)
    pub path: PathBuf,

    /// Single-line output
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Args)]
pub struct FromJsonArgs {
    /// JSON document file (`-` for stdin)
    pub path: PathBuf,
}

pub fn to_json(args: ToJsonArgs, ctx: &Context) -> Result<()> {
    let source = read_input(&args.path)?;
    println!("{}", markdown_to_json(&source, ctx, !args.compact)?);
    Ok(())
}

pub fn from_json(args: FromJsonArgs, ctx: &Context) -> Result<()> {
    let source = read_input(&args.path)?;
    let text = json_to_markdown(&source, ctx)
        .with_context(|| format!("Invalid document in {}", args.path.display()))?;
    println!("{}", text);
    Ok(())
}

pub fn markdown_to_json(source: &str, ctx: &Context, pretty: bool) -> Result<String> {
    let tree = parse(source, ctx.manager.schema());
    let json = if pretty {
        serde_json::to_string_pretty(&tree)?
    } else {
        serde_json::to_string(&tree)?
    };
    Ok(json)
}

pub fn json_to_markdown(source: &str, ctx: &Context) -> Result<String> {
    let value: Value = serde_json::from_str(source).context("Not valid JSON")?;
    let content = DualContent::from_initial(
        InitialContent::Json(value),
        ctx.manager.schema(),
        &ctx.config.markdown,
    )?;
    Ok(content.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_editor::EditorConfig;
    use serde_json::json;

    fn ctx() -> Context {
        Context::with_config(EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_markdown_to_json() {
        let json = markdown_to_json("# Title\n\nSome *text*.", &ctx(), false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "doc");
        assert_eq!(value["content"][0]["type"], "heading");
        assert_eq!(value["content"][0]["attrs"]["level"], 1);
        assert_eq!(value["content"][1]["content"][1]["marks"], json!([{"type": "italic"}]));
    }

    #[test]
    fn test_json_round_trip() {
        let source = "## Notes\n\n- [site](https://x.dev)\n- `code`";
        let ctx = ctx();
        let json = markdown_to_json(source, &ctx, true).unwrap();
        assert_eq!(json_to_markdown(&json, &ctx).unwrap(), source);
    }

    #[test]
    fn test_invalid_documents_are_errors() {
        let ctx = ctx();
        assert!(json_to_markdown("{ nope", &ctx).is_err());

        let err = json_to_markdown(r#"{"type": "paragraph"}"#, &ctx).unwrap_err();
        assert!(err.to_string().contains("Invalid content"));
    }
}
