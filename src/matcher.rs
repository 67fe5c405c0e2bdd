//! Matcher (§4.3): recursive structural matching with three container
//! modes.
//!
//! Grounded on the recursive-tree-walking style of the teacher's
//! `extract.rs`/`diff.rs` (descend, compare, short-circuit on mismatch),
//! generalized from flat field comparison to the template/container-mode
//! semantics spec.md §4.3 requires.

use regex::Regex;

use crate::error::{EngineError, Result};
use crate::node::{AriaChild, AriaNode, TriState};
use crate::template::{ContainerMode, MatchFailure, StateConstraints, TemplateNode, TextMatch, TriStateConstraint};

/// DFS over `node`'s subtree, returning every node whose subtree matches
/// `template`. Stops at the first hit unless `collect_all`.
pub fn matches_node_deep<'a, H>(
    node: &'a AriaNode<H>,
    template: &TemplateNode,
    collect_all: bool,
    is_deep_equal: bool,
) -> Result<Vec<&'a AriaNode<H>>> {
    let mut out = Vec::new();
    visit_deep(node, template, collect_all, is_deep_equal, &mut out)?;
    Ok(out)
}

fn visit_deep<'a, H>(
    node: &'a AriaNode<H>,
    template: &TemplateNode,
    collect_all: bool,
    is_deep_equal: bool,
    out: &mut Vec<&'a AriaNode<H>>,
) -> Result<()> {
    if matches!(template, TemplateNode::Role { .. }) && matches_node(node, template, is_deep_equal)? {
        out.push(node);
        if !collect_all {
            return Ok(());
        }
    }
    for child in &node.children {
        match child {
            AriaChild::Node(n) => {
                visit_deep(n, template, collect_all, is_deep_equal, out)?;
                if !collect_all && !out.is_empty() {
                    return Ok(());
                }
            }
            AriaChild::Text(t) => {
                if let TemplateNode::Text { text, .. } = template {
                    if matches_text(t, text)? {
                        out.push(node);
                        if !collect_all {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// `matchesNode(node, template, isDeepEqual) → bool` (§4.3). Only role
/// templates can match an `AriaNode` directly; a text template never does
/// (text matches are evaluated against `AriaChild::Text` siblings, one
/// level up).
pub fn matches_node<H>(node: &AriaNode<H>, template: &TemplateNode, is_deep_equal: bool) -> Result<bool> {
    let TemplateNode::Role {
        role,
        name,
        url,
        state,
        container_mode,
        children,
        ..
    } = template
    else {
        return Ok(false);
    };

    if !role.is_fragment() && node.role != *role {
        return Ok(false);
    }
    if !state_matches(node, state) {
        return Ok(false);
    }
    if let Some(name_match) = name {
        if !matches_text(&node.name, name_match)? {
            return Ok(false);
        }
    }
    if let Some(url_match) = url {
        let url_value = node.props.get("url").map(String::as_str).unwrap_or("");
        if !matches_text(url_value, url_match)? {
            return Ok(false);
        }
    }

    let this_is_deep = is_deep_equal || matches!(container_mode, ContainerMode::DeepEqual);
    if this_is_deep {
        matches_equal(&node.children, children, true)
    } else {
        match container_mode {
            ContainerMode::Contain => matches_contain(&node.children, children),
            ContainerMode::Equal => matches_equal(&node.children, children, false),
            ContainerMode::DeepEqual => unreachable!("folded into this_is_deep above"),
        }
    }
}

fn state_matches<H>(node: &AriaNode<H>, state: &StateConstraints) -> bool {
    if let Some(c) = state.checked {
        if !tristate_eq(node.checked, c) {
            return false;
        }
    }
    if let Some(d) = state.disabled {
        if node.disabled != Some(d) {
            return false;
        }
    }
    if let Some(e) = state.expanded {
        if node.expanded != Some(e) {
            return false;
        }
    }
    if let Some(l) = state.level {
        if node.level != Some(l) {
            return false;
        }
    }
    if let Some(p) = state.pressed {
        if !tristate_eq(node.pressed, p) {
            return false;
        }
    }
    if let Some(s) = state.selected {
        if node.selected != Some(s) {
            return false;
        }
    }
    true
}

fn tristate_eq(actual: Option<TriState>, expected: TriStateConstraint) -> bool {
    matches!(
        (actual, expected),
        (Some(TriState::False), TriStateConstraint::False)
            | (Some(TriState::True), TriStateConstraint::True)
            | (Some(TriState::Mixed), TriStateConstraint::Mixed)
    )
}

/// **contain** mode: template children must appear as an in-order
/// subsequence of the actual children.
fn matches_contain<H>(actual: &[AriaChild<H>], templates: &[TemplateNode]) -> Result<bool> {
    let mut ai = 0;
    'templates: for t in templates {
        while ai < actual.len() {
            let idx = ai;
            ai += 1;
            if matches_child(&actual[idx], t, false)? {
                continue 'templates;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// **equal**/**deep-equal** modes: same length, pairwise match.
fn matches_equal<H>(actual: &[AriaChild<H>], templates: &[TemplateNode], is_deep_equal: bool) -> Result<bool> {
    if actual.len() != templates.len() {
        return Ok(false);
    }
    for (a, t) in actual.iter().zip(templates.iter()) {
        if !matches_child(a, t, is_deep_equal)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_child<H>(actual: &AriaChild<H>, template: &TemplateNode, is_deep_equal: bool) -> Result<bool> {
    match (actual, template) {
        (AriaChild::Text(t), TemplateNode::Text { text, .. }) => matches_text(t, text),
        (AriaChild::Node(n), TemplateNode::Role { .. }) => matches_node(n, template, is_deep_equal),
        _ => Ok(false),
    }
}

/// `matchesText(text, template)` (§4.3): empty template matches anything;
/// empty text (with a non-empty template) never matches; literal templates
/// compare by equality; regex templates use an unanchored search.
pub fn matches_text(text: &str, template: &TextMatch) -> Result<bool> {
    match template {
        TextMatch::Literal(s) if s.is_empty() => Ok(true),
        _ if text.is_empty() => Ok(false),
        TextMatch::Literal(s) => Ok(text == s),
        TextMatch::Regex(pattern) => {
            let re = compile(&pattern.pattern)?;
            Ok(re.is_match(text))
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| EngineError::InvalidRegexPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Exploratory line-tracking variant (§3.4, §9): collects every constraint
/// that failed, tagged with the template line and whether it was a regex
/// mismatch, instead of short-circuiting on the first failure. Not used to
/// select a diff target — the Scorer (`crate::score`) owns that.
pub fn diagnose<H>(node: &AriaNode<H>, template: &TemplateNode, is_deep_equal: bool) -> Result<Vec<MatchFailure>> {
    let mut failures = Vec::new();
    diagnose_node(node, template, is_deep_equal, &mut failures)?;
    Ok(failures)
}

fn diagnose_node<H>(
    node: &AriaNode<H>,
    template: &TemplateNode,
    is_deep_equal: bool,
    failures: &mut Vec<MatchFailure>,
) -> Result<()> {
    let TemplateNode::Role {
        role,
        name,
        url,
        state,
        container_mode,
        children,
        line_number,
    } = template
    else {
        failures.push(MatchFailure {
            template_line_number: template.line_number(),
            is_from_template_regex: false,
        });
        return Ok(());
    };

    if !role.is_fragment() && node.role != *role {
        failures.push(MatchFailure {
            template_line_number: *line_number,
            is_from_template_regex: false,
        });
        return Ok(());
    }
    if !state_matches(node, state) {
        failures.push(MatchFailure {
            template_line_number: *line_number,
            is_from_template_regex: false,
        });
    }
    if let Some(name_match) = name {
        let is_regex = matches!(name_match, TextMatch::Regex(_));
        if !matches_text(&node.name, name_match)? {
            failures.push(MatchFailure {
                template_line_number: *line_number,
                is_from_template_regex: is_regex,
            });
        }
    }
    if let Some(url_match) = url {
        let is_regex = matches!(url_match, TextMatch::Regex(_));
        let url_value = node.props.get("url").map(String::as_str).unwrap_or("");
        if !matches_text(url_value, url_match)? {
            failures.push(MatchFailure {
                template_line_number: *line_number,
                is_from_template_regex: is_regex,
            });
        }
    }

    let this_is_deep = is_deep_equal || matches!(container_mode, ContainerMode::DeepEqual);
    let children_ok = if this_is_deep {
        matches_equal(&node.children, children, true)?
    } else {
        match container_mode {
            ContainerMode::Contain => matches_contain(&node.children, children)?,
            ContainerMode::Equal => matches_equal(&node.children, children, false)?,
            ContainerMode::DeepEqual => unreachable!("folded into this_is_deep above"),
        }
    };
    if !children_ok {
        failures.push(MatchFailure {
            template_line_number: *line_number,
            is_from_template_regex: false,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AriaNode;
    use crate::role::AriaRole;
    use crate::template::TemplateNode;

    fn heading(name: &str) -> AriaNode<()> {
        AriaNode::with_name(AriaRole::Heading, name)
    }

    #[test]
    fn role_and_name_match() {
        let node = heading("title");
        let template = TemplateNode::role(AriaRole::Heading).named("title");
        assert!(matches_node(&node, &template, false).unwrap());
    }

    #[test]
    fn role_mismatch_fails() {
        let node = heading("title");
        let template = TemplateNode::role(AriaRole::Button).named("title");
        assert!(!matches_node(&node, &template, false).unwrap());
    }

    #[test]
    fn fragment_role_matches_any_role() {
        let node = heading("title");
        let template = TemplateNode::role(AriaRole::Fragment);
        assert!(matches_node(&node, &template, false).unwrap());
    }

    #[test]
    fn regex_name_matches_unanchored() {
        let node = heading("Issues 42");
        let template = TemplateNode::role(AriaRole::Heading).named_regex(r"Issues \d+");
        assert!(matches_node(&node, &template, false).unwrap());
    }

    #[test]
    fn contain_mode_finds_subsequence() {
        let mut list: AriaNode<()> = AriaNode::new(AriaRole::List);
        list.children = vec![
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "One")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Two")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Three")),
        ];
        let template = TemplateNode::role(AriaRole::List).children([
            TemplateNode::role(AriaRole::ListItem).named("One"),
            TemplateNode::role(AriaRole::ListItem).named("Three"),
        ]);
        assert!(matches_node(&list, &template, false).unwrap());
    }

    #[test]
    fn equal_mode_requires_full_coverage() {
        let mut list: AriaNode<()> = AriaNode::new(AriaRole::List);
        list.children = vec![
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "One")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Two")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Three")),
        ];
        let template = TemplateNode::role(AriaRole::List)
            .container_mode(ContainerMode::Equal)
            .children([
                TemplateNode::role(AriaRole::ListItem).named("One"),
                TemplateNode::role(AriaRole::ListItem).named("Three"),
            ]);
        assert!(!matches_node(&list, &template, false).unwrap());
    }

    #[test]
    fn invalid_regex_surfaces_as_engine_error() {
        let node = heading("title");
        let template = TemplateNode::role(AriaRole::Heading).named_regex("(unterminated");
        assert!(matches_node(&node, &template, false).is_err());
    }

    #[test]
    fn checked_mixed_does_not_match_true() {
        let mut checkbox: AriaNode<()> = AriaNode::new(AriaRole::Checkbox);
        checkbox.checked = Some(TriState::Mixed);
        let template = TemplateNode::role(AriaRole::Checkbox).state(StateConstraints {
            checked: Some(TriStateConstraint::True),
            ..StateConstraints::default()
        });
        assert!(!matches_node(&checkbox, &template, false).unwrap());
    }
}
