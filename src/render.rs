//! Renderer (§4.5): canonical YAML-sequence textual form of an `AriaSnapshot`,
//! in *raw* (literal) or *regex* (dynamic-content-generalized) mode.
//!
//! Generalizes the teacher's `serialize.rs` (`to_compact_text`/
//! `serialize_node`, which emits a single fixed token-compact form) into a
//! two-mode YAML-sequence renderer, reusing its recursive
//! walk-and-indent shape.

use regex::Regex;
use std::sync::OnceLock;

use crate::node::{AriaChild, AriaNode, AriaSnapshot, TriState};
use crate::stringutil::escape_regexp;
use crate::yaml_escape::{yaml_escape_key_if_needed, yaml_escape_value_if_needed};

const MAX_NAME_LEN: usize = 900;
const MAX_SUBSUMPTION_COMPARE_LEN: usize = 200;
const MIN_REMAINDER_RATIO: f64 = 0.1;
const INDENT: &str = "  ";

/// `{ mode, forAI? }` (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Raw,
    Regex,
}

/// `renderAriaTree(snapshot, { mode, forAI }) → string` (§4.5). The
/// synthetic `fragment` root never gets a key line; only its children are
/// emitted.
pub fn render_aria_tree<H>(snapshot: &AriaSnapshot<H>, mode: RenderMode, for_ai: bool) -> String {
    let mut out = String::new();
    render_children(&snapshot.root.children, 0, mode, for_ai, "", &mut out);
    out
}

fn render_children<H>(
    children: &[AriaChild<H>],
    indent: usize,
    mode: RenderMode,
    for_ai: bool,
    parent_name: &str,
    out: &mut String,
) {
    for child in children {
        match child {
            AriaChild::Text(text) => {
                if mode == RenderMode::Regex && !text_contributes_info(parent_name, text) {
                    continue;
                }
                out.push_str(&INDENT.repeat(indent));
                out.push_str("- text: ");
                out.push_str(&render_text_value(text, mode));
                out.push('\n');
            }
            AriaChild::Node(node) => render_node(node, indent, mode, for_ai, out),
        }
    }
}

fn render_node<H>(node: &AriaNode<H>, indent: usize, mode: RenderMode, for_ai: bool, out: &mut String) {
    if node.role.is_fragment() {
        // A nested fragment (e.g. a best-candidate wrapper around the
        // selected siblings, §4.4 "fragment wrapping") renders only its
        // children, at the same indent as the fragment itself.
        render_children(&node.children, indent, mode, for_ai, &node.name, out);
        return;
    }

    let mut line = String::new();
    line.push_str(&INDENT.repeat(indent));
    line.push_str("- ");
    line.push_str(&node.role.to_string());

    if !node.name.is_empty() && node.name.chars().count() <= MAX_NAME_LEN {
        line.push(' ');
        line.push_str(&render_name(&node.name, mode));
    }

    push_state_brackets(node, &mut line);

    if for_ai && node.receives_pointer_events {
        if let Some(r) = &node.ref_id {
            line.push_str(" [ref=");
            line.push_str(r);
            line.push(']');
        }
        if node.node_box.map(|b| b.cursor_pointer).unwrap_or(false) {
            line.push_str(" [cursor=pointer]");
        }
    }

    let visible: Vec<&AriaChild<H>> = node
        .children
        .iter()
        .filter(|c| match c {
            AriaChild::Text(t) => mode != RenderMode::Regex || text_contributes_info(&node.name, t),
            AriaChild::Node(_) => true,
        })
        .collect();
    let has_props = !node.props.is_empty();

    if visible.is_empty() && !has_props {
        out.push_str(&line);
        out.push('\n');
        return;
    }

    if !has_props {
        if let [AriaChild::Text(text)] = visible.as_slice() {
            line.push_str(": ");
            line.push_str(&render_text_value(text, mode));
            out.push_str(&line);
            out.push('\n');
            return;
        }
    }

    line.push(':');
    out.push_str(&line);
    out.push('\n');

    for (key, value) in &node.props {
        out.push_str(&INDENT.repeat(indent + 1));
        out.push_str("- ");
        out.push_str(&yaml_escape_key_if_needed(&format!("/{key}")));
        out.push_str(": ");
        out.push_str(&render_text_value(value, mode));
        out.push('\n');
    }

    render_children(&node.children, indent + 1, mode, for_ai, &node.name, out);
}

fn push_state_brackets<H>(node: &AriaNode<H>, line: &mut String) {
    match node.checked {
        Some(TriState::Mixed) => line.push_str(" [checked=mixed]"),
        Some(TriState::True) => line.push_str(" [checked]"),
        _ => {}
    }
    if node.disabled == Some(true) {
        line.push_str(" [disabled]");
    }
    if node.expanded == Some(true) {
        line.push_str(" [expanded]");
    }
    if let Some(level) = node.level {
        line.push_str(&format!(" [level={level}]"));
    }
    match node.pressed {
        Some(TriState::Mixed) => line.push_str(" [pressed=mixed]"),
        Some(TriState::True) => line.push_str(" [pressed]"),
        _ => {}
    }
    if node.selected == Some(true) {
        line.push_str(" [selected]");
    }
}

fn render_name(name: &str, mode: RenderMode) -> String {
    let value = match mode {
        RenderMode::Raw => name.to_string(),
        RenderMode::Regex => convert_to_best_guess_regex(name),
    };
    yaml_escape_value_if_needed(&value)
}

fn render_text_value(text: &str, mode: RenderMode) -> String {
    let value = match mode {
        RenderMode::Raw => text.to_string(),
        RenderMode::Regex => convert_to_best_guess_regex(text),
    };
    yaml_escape_value_if_needed(&value)
}

/// `textContributesInfo(node, text)` (§4.5): suppress text whose
/// informational content is already captured by the parent's name. Only
/// compared when both strings are short enough for the comparison to be
/// meaningful; otherwise the text is kept as-is.
fn text_contributes_info(parent_name: &str, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if parent_name.is_empty() {
        return true;
    }
    if parent_name.chars().count() > MAX_SUBSUMPTION_COMPARE_LEN
        || text.chars().count() > MAX_SUBSUMPTION_COMPARE_LEN
    {
        return true;
    }

    let original_len = text.chars().count() as f64;
    let mut remainder = text.to_string();
    loop {
        let overlap = longest_common_run(parent_name, &remainder);
        if overlap.is_empty() {
            break;
        }
        match remainder.find(overlap) {
            Some(pos) => remainder.replace_range(pos..pos + overlap.len(), ""),
            None => break,
        }
    }

    let remainder_len = remainder.chars().count() as f64;
    remainder_len / original_len > MIN_REMAINDER_RATIO
}

/// Longest common contiguous substring of `a` and `b`, returned as a slice
/// of `b` (so the caller can excise it). Unlike
/// `stringutil::longest_common_substring`, which only reports a length,
/// `textContributesInfo` needs the actual run to strip repeatedly.
fn longest_common_run<'b>(a: &str, b: &'b str) -> &'b str {
    if a.is_empty() || b.is_empty() {
        return "";
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_char_starts: Vec<usize> = b.char_indices().map(|(i, _)| i).collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut prev = vec![0usize; b_chars.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;
    for ac in &a_chars {
        let mut cur = vec![0usize; b_chars.len() + 1];
        for (j, bc) in b_chars.iter().enumerate() {
            if ac == bc {
                cur[j + 1] = prev[j] + 1;
                if cur[j + 1] > best_len {
                    best_len = cur[j + 1];
                    best_end = j + 1;
                }
            }
        }
        prev = cur;
    }
    if best_len == 0 {
        return "";
    }
    let start_char = best_end - best_len;
    let start_byte = b_char_starts[start_char];
    let end_byte = b_char_starts.get(best_end).copied().unwrap_or(b.len());
    &b[start_byte..end_byte]
}

/// `convertToBestGuessRegex(text)` (§4.5): substitute numeric dynamic
/// content (sizes, durations, decimals, multi-digit integers) with regex
/// equivalents; escape the rest literally. Returns the plain text unchanged
/// if no dynamic content was found (so the caller's regex-literal check
/// falls through to ordinary quoting).
fn convert_to_best_guess_regex(text: &str) -> String {
    let re = dynamic_content_pattern();
    let mut out = String::new();
    let mut last = 0;
    let mut found_dynamic = false;

    for m in re.find_iter(text) {
        found_dynamic = true;
        out.push_str(&escape_regexp(&text[last..m.start()]));
        out.push_str(dynamic_fragment_pattern(m.as_str()));
        last = m.end();
    }
    out.push_str(&escape_regexp(&text[last..]));

    if found_dynamic {
        format!("/{out}/")
    } else {
        text.to_string()
    }
}

fn dynamic_content_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\d+(?:\.\d+)?\s?(?:kb|mb|gb|tb|b|ms|h|m|s)\b|\d+\.\d+|\d{2,}")
            .expect("dynamic-content pattern is a fixed literal")
    })
}

fn dynamic_fragment_pattern(matched: &str) -> &'static str {
    let lower = matched.to_ascii_lowercase();
    if lower.ends_with('b') {
        r"\d+(?:\.\d+)?\s?(?i:[kmgt]?b)"
    } else if lower.ends_with("ms") || lower.ends_with('s') || lower.ends_with('m') || lower.ends_with('h') {
        r"\d+(?:\.\d+)?\s?(?i:ms|[smh])"
    } else if matched.contains('.') {
        r"\d+\.\d+"
    } else {
        r"\d+"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::AriaRole;

    fn snapshot_of(root: AriaNode<()>) -> AriaSnapshot<()> {
        AriaSnapshot::new(root)
    }

    #[test]
    fn key_line_only_for_childless_node() {
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(AriaNode::with_name(AriaRole::Button, "Go"))];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "- button \"Go\"\n");
    }

    #[test]
    fn single_text_child_renders_inline() {
        let mut heading: AriaNode<()> = AriaNode::with_name(AriaRole::Heading, "title");
        heading.level = Some(1);
        heading.children = vec![AriaChild::Text("title".to_string())];
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(heading)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "- heading \"title\" [level=1]: \"title\"\n");
    }

    #[test]
    fn checked_state_brackets_in_fixed_order() {
        let mut checkbox: AriaNode<()> = AriaNode::new(AriaRole::Checkbox);
        checkbox.checked = Some(TriState::True);
        checkbox.disabled = Some(true);
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(checkbox)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "- checkbox [checked] [disabled]\n");
    }

    #[test]
    fn link_props_render_before_children() {
        let mut link: AriaNode<()> = AriaNode::with_name(AriaRole::Link, "Link");
        link.props.insert("url".to_string(), "https://example.com".to_string());
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(link)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "- link \"Link\":\n  - /url: \"https://example.com\"\n");
    }

    #[test]
    fn name_over_limit_is_omitted_from_key() {
        let long_name = "x".repeat(MAX_NAME_LEN + 1);
        let node: AriaNode<()> = AriaNode::with_name(AriaRole::Paragraph, long_name);
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(node)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "- paragraph\n");
    }

    #[test]
    fn regex_mode_generalizes_numbers_in_name() {
        let node: AriaNode<()> = AriaNode::with_name(AriaRole::Heading, "Issues 42");
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(node)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Regex, false);
        assert!(out.starts_with("- heading /Issues \\d+/"));
    }

    #[test]
    fn regex_mode_keeps_literal_text_without_dynamic_content() {
        let node: AriaNode<()> = AriaNode::with_name(AriaRole::Heading, "Welcome");
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(node)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Regex, false);
        assert_eq!(out, "- heading \"Welcome\"\n");
    }

    #[test]
    fn for_ai_annotates_pointer_receiving_node_with_ref() {
        let mut button: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "Go");
        button.receives_pointer_events = true;
        button.ref_id = Some("s1e1".to_string());
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(button)];
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, true);
        assert_eq!(out, "- button \"Go\" [ref=s1e1]\n");
    }

    #[test]
    fn fragment_root_has_no_key_line() {
        let root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        let out = render_aria_tree(&snapshot_of(root), RenderMode::Raw, false);
        assert_eq!(out, "");
    }
}
