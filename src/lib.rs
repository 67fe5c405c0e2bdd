//! Accessibility-Tree (ARIA) Snapshot Matching Engine.
//!
//! Builds a normalized accessibility tree from a DOM subtree (`builder`,
//! `normalize`), matches it against a declarative template (`matcher`),
//! computes a best-candidate diff target when nothing matches (`score`), and
//! renders trees back to canonical text (`render`). `matches_aria_tree`,
//! `get_all_by_aria`, and `render_aria_tree` are the public surface;
//! everything else is an internal collaborator a caller never needs to name
//! directly.

pub mod builder;
pub mod dom_bridge;
pub mod error;
pub mod matcher;
pub mod node;
pub mod normalize;
pub mod render;
pub mod role;
pub mod score;
pub mod stringutil;
pub mod template;
pub mod yaml_escape;

use tracing::info;

use builder::{BuildOptions, SnapshotBuilder};
use dom_bridge::DomBridge;
use error::Result;
use node::{AriaChild, AriaNode, AriaSnapshot};
use render::RenderMode;
use role::AriaRole;
use template::TemplateNode;

pub use render::render_aria_tree;

/// Result of `matches_aria_tree`: every matching subtree, both rendered
/// forms of the full snapshot, and — only on a miss — a rendering of the
/// best-candidate subtree to diff against.
pub struct MatchOutcome<H> {
    pub matches: Vec<AriaNode<H>>,
    pub raw: String,
    pub regex: String,
    pub diff_target: Option<String>,
}

/// `matchesAriaTree(domRoot, template)` (§4.3, §4.6): build a snapshot from
/// `dom`, collect every subtree matching `template`, and — when none match —
/// compute a best-candidate diff target. Consumers diff
/// `diff_target.unwrap_or(raw)` against the template's own rendering.
pub fn matches_aria_tree<D: DomBridge>(
    dom: &D,
    template: &TemplateNode,
    options: &BuildOptions,
) -> Result<MatchOutcome<D::Element>> {
    let mut builder = SnapshotBuilder::new();
    let snapshot = builder.build(dom, options);

    let hits = matcher::matches_node_deep(&snapshot.root, template, true, false)?;
    let matches: Vec<AriaNode<D::Element>> = hits.into_iter().cloned().collect();

    let raw = render::render_aria_tree(&snapshot, RenderMode::Raw, options.for_ai);
    let regex = render::render_aria_tree(&snapshot, RenderMode::Regex, options.for_ai);

    let diff_target = if matches.is_empty() {
        score::find_best_structural_match(&snapshot.root, template).map(|best| render_best_candidate(&best, options.for_ai))
    } else {
        None
    };

    info!(
        matches = matches.len(),
        has_diff_target = diff_target.is_some(),
        "matches_aria_tree"
    );

    Ok(MatchOutcome {
        matches,
        raw,
        regex,
        diff_target,
    })
}

/// `getAllByAria(domRoot, template)` (§4.6): the DOM elements of every
/// matching subtree.
pub fn get_all_by_aria<D: DomBridge>(
    dom: &D,
    template: &TemplateNode,
    options: &BuildOptions,
) -> Result<Vec<D::Element>> {
    let mut builder = SnapshotBuilder::new();
    let snapshot = builder.build(dom, options);
    let hits = matcher::matches_node_deep(&snapshot.root, template, true, false)?;
    let elements: Vec<D::Element> = hits.into_iter().filter_map(|n| n.element).collect();
    info!(count = elements.len(), "get_all_by_aria");
    Ok(elements)
}

/// Wraps a `score::BestMatch` in a synthetic `fragment` root so it can go
/// through the ordinary renderer (§4.4 "fragment wrapping": a multi-child
/// fragment template's best candidate is the selected sibling set, not the
/// whole parent).
fn render_best_candidate<H: Clone>(best: &score::BestMatch<'_, H>, for_ai: bool) -> String {
    let mut synthetic_root = AriaNode::new(AriaRole::Fragment);
    synthetic_root.children = match &best.candidate {
        score::BestCandidate::Node(node) => vec![AriaChild::Node((*node).clone())],
        score::BestCandidate::FragmentChildren { parent, indices } => indices
            .iter()
            .filter_map(|&i| parent.children.get(i).cloned())
            .collect(),
    };
    render::render_aria_tree(&AriaSnapshot::new(synthetic_root), RenderMode::Raw, for_ai)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_bridge::scraper_dom::ScraperDom;
    use dom_bridge::GlobalOptions;
    use scraper::Html;

    #[test]
    fn heading_title_matches_template() {
        let document = Html::parse_document("<body><h1>title</h1></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let template = TemplateNode::role(AriaRole::Heading).named("title");
        let outcome = matches_aria_tree(&dom, &template, &BuildOptions::default()).unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.diff_target.is_none());
    }

    #[test]
    fn mismatch_produces_diff_target() {
        let document = Html::parse_document("<body><h1>title</h1></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let template = TemplateNode::role(AriaRole::Button).named("Click me");
        let outcome = matches_aria_tree(&dom, &template, &BuildOptions::default()).unwrap();
        assert!(outcome.matches.is_empty());
        assert!(outcome.diff_target.is_some());
    }

    #[test]
    fn get_all_by_aria_returns_matching_elements() {
        let document = Html::parse_document("<body><button>Go</button></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let template = TemplateNode::role(AriaRole::Button);
        let elements = get_all_by_aria(&dom, &template, &BuildOptions::default()).unwrap();
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn invalid_template_regex_surfaces_as_error() {
        let document = Html::parse_document("<body><h1>title</h1></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let template = TemplateNode::role(AriaRole::Heading).named_regex("(unterminated");
        assert!(matches_aria_tree(&dom, &template, &BuildOptions::default()).is_err());
    }
}
