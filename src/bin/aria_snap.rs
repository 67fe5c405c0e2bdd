//! Command-line entry point: a test-harness convenience built on the
//! library crate, not part of its public API. Reads HTML from a file or
//! stdin and either renders its accessibility snapshot or checks it against
//! a small YAML-ish template file, following the renderer's own
//! inline-text-child and state-bracket conventions so a rendered snapshot
//! can be fed back in as a template.
//!
//! Grounded on the teacher's `main.rs`: `clap::Parser`/`Subcommand` for the
//! command surface, `tracing_subscriber::fmt()` writing to stderr, `-` for
//! stdin, `anyhow::Result` at the boundary.

use std::io::Read;
use std::sync::OnceLock;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use scraper::Html;
use tracing::{debug, info};

use aria_snap::builder::{BuildOptions, SnapshotBuilder};
use aria_snap::dom_bridge::scraper_dom::ScraperDom;
use aria_snap::dom_bridge::GlobalOptions;
use aria_snap::render::RenderMode;
use aria_snap::role::AriaRole;
use aria_snap::template::{ContainerMode, StateConstraints, TemplateNode, TextMatch, TriStateConstraint};

#[derive(Parser)]
#[command(name = "aria-snap")]
#[command(about = "Accessibility-tree snapshot builder and template matcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an HTML document's accessibility snapshot.
    Render {
        /// HTML file path, or '-' for stdin.
        input: String,

        /// Output mode: raw or regex.
        #[arg(short, long, default_value = "raw")]
        mode: String,

        /// Annotate refs and the cursor-pointer marker, as a live-page snapshot would.
        #[arg(long)]
        for_ai: bool,
    },

    /// Check an HTML document against a template file, printing the diff
    /// target and exiting non-zero on mismatch.
    Check {
        /// HTML file path, or '-' for stdin.
        input: String,

        /// Path to the template file (renderer-style YAML-ish syntax).
        template: String,

        #[arg(long)]
        for_ai: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render { input, mode, for_ai } => run_render(&input, &mode, for_ai),
        Commands::Check { input, template, for_ai } => run_check(&input, &template, for_ai),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
    }
}

fn run_render(input: &str, mode: &str, for_ai: bool) -> Result<()> {
    let html = read_input(input)?;
    let document = Html::parse_document(&html);
    let dom = ScraperDom::new(&document, GlobalOptions::default());
    let options = BuildOptions {
        for_ai,
        ref_prefix: "s1".to_string(),
    };

    let render_mode = match mode {
        "raw" => RenderMode::Raw,
        "regex" => RenderMode::Regex,
        other => bail!("unknown render mode {other:?}, expected raw or regex"),
    };

    let mut builder = SnapshotBuilder::new();
    let snapshot = builder.build(&dom, &options);
    info!(for_ai, mode = %mode, "rendering snapshot");
    print!("{}", aria_snap::render_aria_tree(&snapshot, render_mode, for_ai));
    Ok(())
}

fn run_check(input: &str, template_path: &str, for_ai: bool) -> Result<()> {
    let html = read_input(input)?;
    let template_text =
        std::fs::read_to_string(template_path).with_context(|| format!("reading {template_path}"))?;
    let template = parse_template(&template_text)?;

    let document = Html::parse_document(&html);
    let dom = ScraperDom::new(&document, GlobalOptions::default());
    let options = BuildOptions {
        for_ai,
        ref_prefix: "s1".to_string(),
    };

    let outcome = aria_snap::matches_aria_tree(&dom, &template, &options)?;
    if !outcome.matches.is_empty() {
        info!(matches = outcome.matches.len(), "template matched");
        println!("{}", outcome.raw);
        return Ok(());
    }

    debug!("no match; printing diff target");
    eprintln!("no matching subtree found");
    if let Some(diff_target) = &outcome.diff_target {
        println!("{diff_target}");
    } else {
        println!("{}", outcome.raw);
    }
    std::process::exit(1);
}

// --- Minimal template parser -----------------------------------------
//
// Mirrors the renderer's own textual conventions closely enough that a
// rendered snapshot can be fed back in as a template: `- role "name"
// [state]:` followed by indented children, `- text: "value"` for string
// children, `- /prop: value` for props, and an inline `: "value"` shorthand
// for a role line with a single text child. Not a general YAML parser — it
// understands exactly this subset. Quoted names containing `:` are not
// supported.

struct SourceLine {
    number: u32,
    indent: usize,
    content: String,
}

fn tokenize(text: &str) -> Result<Vec<SourceLine>> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let stripped = raw.trim_start_matches(' ');
        let leading = raw.len() - stripped.len();
        if leading % 2 != 0 {
            bail!("line {}: indentation must be a multiple of two spaces", i + 1);
        }
        let content = stripped
            .strip_prefix("- ")
            .or_else(|| stripped.strip_prefix('-'))
            .ok_or_else(|| anyhow!("line {}: expected a `- ` sequence item", i + 1))?;
        lines.push(SourceLine {
            number: (i + 1) as u32,
            indent: leading / 2,
            content: content.trim().to_string(),
        });
    }
    Ok(lines)
}

fn parse_template(text: &str) -> Result<TemplateNode> {
    let lines = tokenize(text)?;
    if lines.is_empty() {
        bail!("template is empty");
    }
    let mut pos = 0usize;
    let root = parse_node(&lines, &mut pos, 0)?;
    if pos != lines.len() {
        bail!("line {}: unexpected indentation", lines[pos].number);
    }
    Ok(root)
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]]*)\]").unwrap())
}

fn parse_node(lines: &[SourceLine], pos: &mut usize, indent: usize) -> Result<TemplateNode> {
    let line = &lines[*pos];
    if line.indent != indent {
        bail!("line {}: expected indentation level {indent}", line.number);
    }
    let line_number = Some(line.number);
    let content = line.content.clone();
    *pos += 1;

    if let Some(rest) = content.strip_prefix("text:") {
        let text = parse_text_match(rest.trim())?;
        return Ok(TemplateNode::Text { text, line_number });
    }

    let header_end = content.find(':').unwrap_or(content.len());
    let header = &content[..header_end];
    let inline = content[header_end..].trim_start_matches(':').trim();

    let brackets = bracket_pattern();
    let header_without_brackets = brackets.replace_all(header, "").trim().to_string();
    let (role_token, name_token) = split_role_and_name(&header_without_brackets);
    let role = AriaRole::parse(&role_token)
        .ok_or_else(|| anyhow!("line {}: unknown role {role_token:?}", line_number.unwrap_or(0)))?;
    let name = name_token.map(|t| parse_text_match(&t)).transpose()?;

    let mut state = StateConstraints::default();
    let mut url = None;
    for capture in brackets.captures_iter(header) {
        apply_bracket(&mut state, &capture[1])
            .with_context(|| format!("line {}: bad bracket [{}]", line_number.unwrap_or(0), &capture[1]))?;
    }

    let mut children = Vec::new();
    let mut container_mode = ContainerMode::default();

    if !inline.is_empty() {
        children.push(TemplateNode::Text {
            text: parse_text_match(inline)?,
            line_number,
        });
    } else if content.trim_end().ends_with(':') {
        while *pos < lines.len() && lines[*pos].indent == indent + 1 {
            let child_line_content = lines[*pos].content.clone();
            if let Some(mode) = parse_container_directive(&child_line_content) {
                container_mode = mode;
                *pos += 1;
                continue;
            }
            if let Some(rest) = child_line_content.strip_prefix('/') {
                let (prop_name, value) = rest
                    .split_once(':')
                    .ok_or_else(|| anyhow!("line {}: malformed prop line", lines[*pos].number))?;
                if prop_name.trim() == "url" {
                    url = Some(parse_text_match(value.trim())?);
                }
                *pos += 1;
                continue;
            }
            children.push(parse_node(lines, pos, indent + 1)?);
        }
    }

    Ok(TemplateNode::Role {
        role,
        name,
        url,
        state,
        container_mode,
        children,
        line_number,
    })
}

fn split_role_and_name(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    match header.find(char::is_whitespace) {
        Some(space) => {
            let (role, rest) = header.split_at(space);
            (role.to_string(), Some(rest.trim().to_string()))
        }
        None => (header.to_string(), None),
    }
}

fn parse_text_match(token: &str) -> Result<TextMatch> {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('/') && token.ends_with('/') {
        return Ok(TextMatch::regex(&token[1..token.len() - 1]));
    }
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        let inner = &token[1..token.len() - 1];
        let unescaped = inner.replace("\\\"", "\"").replace("\\\\", "\\");
        return Ok(TextMatch::literal(unescaped));
    }
    Ok(TextMatch::literal(token))
}

fn parse_container_directive(content: &str) -> Option<ContainerMode> {
    let token = content.trim().trim_matches('"');
    let rest = token.strip_prefix("/children:")?;
    match rest.trim() {
        "contain" => Some(ContainerMode::Contain),
        "equal" => Some(ContainerMode::Equal),
        "deep-equal" => Some(ContainerMode::DeepEqual),
        _ => None,
    }
}

fn apply_bracket(state: &mut StateConstraints, bracket: &str) -> Result<()> {
    let (key, value) = match bracket.split_once('=') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (bracket.trim(), None),
    };
    match key {
        "checked" => state.checked = Some(parse_tristate(value.unwrap_or("true"))?),
        "pressed" => state.pressed = Some(parse_tristate(value.unwrap_or("true"))?),
        "disabled" => state.disabled = Some(parse_bool(value.unwrap_or("true"))?),
        "expanded" => state.expanded = Some(parse_bool(value.unwrap_or("true"))?),
        "selected" => state.selected = Some(parse_bool(value.unwrap_or("true"))?),
        "level" => {
            let raw = value.ok_or_else(|| anyhow!("level bracket needs a value"))?;
            state.level = Some(raw.parse().with_context(|| format!("invalid level {raw:?}"))?);
        }
        "ref" | "cursor" => {}
        other => bail!("unknown state bracket {other:?}"),
    }
    Ok(())
}

fn parse_tristate(value: &str) -> Result<TriStateConstraint> {
    match value {
        "true" => Ok(TriStateConstraint::True),
        "false" => Ok(TriStateConstraint::False),
        "mixed" => Ok(TriStateConstraint::Mixed),
        other => bail!("invalid tri-state value {other:?}"),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => bail!("invalid boolean value {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_heading_template() {
        let template = parse_template("- heading \"title\"").unwrap();
        match template {
            TemplateNode::Role { role, name, .. } => {
                assert_eq!(role, AriaRole::Heading);
                assert_eq!(name, Some(TextMatch::literal("title")));
            }
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn parses_nested_list_with_children() {
        let text = "- list:\n  - listitem \"One\"\n  - listitem \"Three\"\n";
        let template = parse_template(text).unwrap();
        match template {
            TemplateNode::Role { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn parses_container_mode_directive() {
        let text = "- list:\n  - \"/children: equal\"\n  - listitem \"One\"\n";
        let template = parse_template(text).unwrap();
        match template {
            TemplateNode::Role {
                container_mode,
                children,
                ..
            } => {
                assert_eq!(container_mode, ContainerMode::Equal);
                assert_eq!(children.len(), 1);
            }
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn parses_checked_state_bracket() {
        let template = parse_template("- checkbox [checked=true]").unwrap();
        match template {
            TemplateNode::Role { state, .. } => {
                assert_eq!(state.checked, Some(TriStateConstraint::True));
            }
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn parses_url_prop() {
        let text = "- link:\n  - /url: /.*example.com/\n";
        let template = parse_template(text).unwrap();
        match template {
            TemplateNode::Role { url, .. } => {
                assert_eq!(url, Some(TextMatch::regex(".*example.com")));
            }
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn inline_text_child_shorthand() {
        let template = parse_template("- heading: \"title\"").unwrap();
        match template {
            TemplateNode::Role { children, .. } => {
                assert_eq!(children.len(), 1);
                assert!(matches!(&children[0], TemplateNode::Text { .. }));
            }
            _ => panic!("expected role node"),
        }
    }
}
