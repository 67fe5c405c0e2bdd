//! Tree Builder (§4.1): walks a DOM subtree via a [`DomBridge`] and produces
//! a normalized [`AriaSnapshot`].
//!
//! Generalizes the teacher's single-pass `pipeline.rs` extraction (which
//! prunes non-interactive wrappers outright and bakes heading level into the
//! role) into the richer two-stage pipeline this engine needs: build, then
//! hand off to [`crate::normalize`] for string coalescing and generic-role
//! elision.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::dom_bridge::{AriaCacheGuard, Child, DomBridge, Pseudo};
use crate::node::{AriaChild, AriaNode, AriaSnapshot};
use crate::normalize;
use crate::role::{self, AriaRole};

/// Options threaded explicitly through a build (§6: "the *options struct* is
/// the configuration surface"). There is no environment-variable or file
/// based configuration in this engine.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Enables the visibility fallback, the `generic` default role for
    /// elements with no role at all, and ref assignment.
    pub for_ai: bool,
    /// Prepended to every minted ref id (`<prefix>e<N>`).
    pub ref_prefix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            for_ai: false,
            ref_prefix: String::new(),
        }
    }
}

/// Build-scoped engine instance (§3.5, §5). Owns the monotonic `lastRef`
/// counter and the per-element ref cache; both persist across builds run on
/// the same instance, so repeated builds of an unchanged DOM keep stable
/// refs. Construct a fresh instance per test for deterministic output.
pub struct SnapshotBuilder {
    last_ref: AtomicU64,
    ref_cache: BTreeMap<String, (AriaRole, String, String)>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            last_ref: AtomicU64::new(0),
            ref_cache: BTreeMap::new(),
        }
    }

    /// `build(rootElement, options) → AriaSnapshot` (§4.1).
    pub fn build<D: DomBridge>(
        &mut self,
        dom: &D,
        options: &BuildOptions,
    ) -> AriaSnapshot<D::Element> {
        let _guard = AriaCacheGuard::new(dom);
        let root_el = dom.root();

        let mut root = AriaNode::new(AriaRole::Fragment);
        root.node_box = Some(dom.bounding_box(root_el));

        let mut elements = BTreeMap::new();
        let mut visited = Vec::new();
        let mut path = Vec::new();
        self.visit_children_into(
            dom,
            root_el,
            options,
            &mut visited,
            &mut path,
            &mut elements,
            &mut root.children,
        );

        debug!(for_ai = options.for_ai, refs = elements.len(), "tree built");
        normalize::normalize(&mut root);

        let mut snapshot = AriaSnapshot::new(root);
        snapshot.elements = elements;
        snapshot
    }

    /// Visit one element, producing zero (transparent), one (ordinary), or
    /// several (spliced, when transparent) `AriaChild` entries appended to
    /// `out`.
    fn visit_node<D: DomBridge>(
        &mut self,
        dom: &D,
        el: D::Element,
        opts: &BuildOptions,
        visited: &mut Vec<D::Element>,
        path: &mut Vec<usize>,
        elements: &mut BTreeMap<String, D::Element>,
        out: &mut Vec<AriaChild<D::Element>>,
    ) {
        if visited.iter().any(|v| *v == el) {
            return;
        }
        visited.push(el);

        if dom.is_hidden_for_aria(el) {
            return;
        }

        let tag = dom.tag_name(el);

        if dom.is_iframe(el) {
            let mut node = AriaNode::with_name(AriaRole::Iframe, dom.accessible_name(el, false));
            node.node_box = Some(dom.bounding_box(el));
            node.receives_pointer_events = dom.receives_pointer_events(el);
            self.assign_ref(dom, el, &tag, path, AriaRole::Iframe, &node.name, opts, elements, &mut node.ref_id);
            node.element = Some(el);
            out.push(AriaChild::Node(node));
            return;
        }

        let resolved_role = match dom.aria_role(el) {
            Some(r) => Some(r),
            None if opts.for_ai => Some(AriaRole::Generic),
            None => None,
        };

        let Some(node_role) = resolved_role else {
            // Transparent: no node of its own, but its children still attach
            // to the current parent.
            self.visit_children_into(dom, el, opts, visited, path, elements, out);
            return;
        };

        let name = dom.accessible_name(el, false);
        let mut node = AriaNode::with_name(node_role, name.clone());
        node.node_box = Some(dom.bounding_box(el));
        node.receives_pointer_events = dom.receives_pointer_events(el);

        if node_role == AriaRole::Link {
            if let Some(href) = dom.href(el) {
                node.props.insert("url".to_string(), href);
            }
        }

        if role::admits_checked(&node_role) {
            node.checked = dom.aria_checked(el);
        }
        if role::admits_disabled(&node_role) {
            node.disabled = dom.aria_disabled(el);
        }
        if role::admits_expanded(&node_role) {
            node.expanded = dom.aria_expanded(el);
        }
        if role::admits_level(&node_role) {
            node.level = dom.aria_level(el);
        }
        if role::admits_pressed(&node_role) {
            node.pressed = dom.aria_pressed(el);
        }
        if role::admits_selected(&node_role) {
            node.selected = dom.aria_selected(el);
        }

        if let Some(value) = dom.text_input_value(el) {
            if !value.is_empty() {
                node.children.push(AriaChild::Text(value));
            }
        } else {
            self.visit_children_into(dom, el, opts, visited, path, elements, &mut node.children);
        }

        self.assign_ref(dom, el, &tag, path, node_role, &name, opts, elements, &mut node.ref_id);
        node.element = Some(el);
        out.push(AriaChild::Node(node));
    }

    /// Traversal order (§4.1 step 3): `::before` → assigned-slot-or-natural
    /// children → shadow-root children → `aria-owns` children → `::after`.
    fn visit_children_into<D: DomBridge>(
        &mut self,
        dom: &D,
        el: D::Element,
        opts: &BuildOptions,
        visited: &mut Vec<D::Element>,
        path: &mut Vec<usize>,
        elements: &mut BTreeMap<String, D::Element>,
        out: &mut Vec<AriaChild<D::Element>>,
    ) {
        let before = dom.css_content(el, Pseudo::Before);
        if !before.is_empty() {
            out.push(AriaChild::Text(before));
        }

        match dom.assigned_slot_nodes(el) {
            Some(assigned) => {
                for (i, child_el) in assigned.into_iter().enumerate() {
                    path.push(i);
                    self.visit_node(dom, child_el, opts, visited, path, elements, out);
                    path.pop();
                }
            }
            None => {
                let mut index = 0usize;
                for child in dom.children(el) {
                    match child {
                        Child::Text(text) => out.push(AriaChild::Text(text)),
                        Child::Element(child_el) => {
                            let needs_space = dom
                                .computed_style(child_el)
                                .map(|s| !s.is_inline())
                                .unwrap_or(false)
                                || dom.tag_name(child_el) == "br";
                            if needs_space {
                                out.push(AriaChild::Text(" ".to_string()));
                            }
                            path.push(index);
                            self.visit_node(dom, child_el, opts, visited, path, elements, out);
                            path.pop();
                            if needs_space {
                                out.push(AriaChild::Text(" ".to_string()));
                            }
                            index += 1;
                        }
                    }
                }
            }
        }

        for (i, shadow_el) in dom.shadow_root_children(el).into_iter().enumerate() {
            path.push(1000 + i);
            self.visit_node(dom, shadow_el, opts, visited, path, elements, out);
            path.pop();
        }

        for (i, owned_el) in dom.aria_owns(el).into_iter().enumerate() {
            path.push(2000 + i);
            self.visit_node(dom, owned_el, opts, visited, path, elements, out);
            path.pop();
        }

        let after = dom.css_content(el, Pseudo::After);
        if !after.is_empty() {
            out.push(AriaChild::Text(after));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assign_ref<D: DomBridge>(
        &mut self,
        dom: &D,
        el: D::Element,
        tag: &str,
        path: &[usize],
        role: AriaRole,
        name: &str,
        opts: &BuildOptions,
        elements: &mut BTreeMap<String, D::Element>,
        out_ref: &mut Option<String>,
    ) {
        if !opts.for_ai {
            return;
        }
        let key = stable_key(dom, el, tag, path);
        let reused = self
            .ref_cache
            .get(&key)
            .filter(|(cached_role, cached_name, _)| *cached_role == role && cached_name == name)
            .map(|(_, _, r)| r.clone());

        let ref_id = reused.unwrap_or_else(|| {
            let n = self.last_ref.fetch_add(1, Ordering::SeqCst) + 1;
            let fresh = format!("{}e{}", opts.ref_prefix, n);
            self.ref_cache.insert(key, (role, name.to_string(), fresh.clone()));
            fresh
        });

        elements.insert(ref_id.clone(), el);
        *out_ref = Some(ref_id);
    }
}

/// A stable cache key for ref assignment: the bridge's strong-identity hint
/// when available, else the element's structural path (mirrors the
/// id/name/href-first, path-fallback hashing the teacher's
/// `compute_stable_ref` uses, minus the numeric-range hashing this engine
/// doesn't need since refs are a monotonic counter, not a hash).
fn stable_key<D: DomBridge>(dom: &D, el: D::Element, tag: &str, path: &[usize]) -> String {
    match dom.identity_hint(el) {
        Some(hint) => format!("{tag}|{hint}"),
        None => {
            let mut key = format!("{tag}|path:");
            for p in path {
                key.push_str(&p.to_string());
                key.push(',');
            }
            key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_bridge::scraper_dom::ScraperDom;
    use crate::dom_bridge::GlobalOptions;
    use scraper::Html;

    #[test]
    fn heading_becomes_a_heading_node() {
        let document = Html::parse_document("<body><h1>Title</h1></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&dom, &BuildOptions::default());
        let heading = snapshot
            .root
            .children
            .iter()
            .filter_map(|c| c.as_node())
            .find(|n| n.role == AriaRole::Heading)
            .expect("heading present");
        assert_eq!(heading.name, "Title");
        assert_eq!(heading.level, Some(1));
    }

    #[test]
    fn div_without_role_is_transparent_outside_for_ai() {
        let document = Html::parse_document("<body><div><button>Go</button></div></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&dom, &BuildOptions::default());
        // The div contributes no node; its button attaches straight to root.
        assert!(snapshot
            .root
            .children
            .iter()
            .filter_map(|c| c.as_node())
            .any(|n| n.role == AriaRole::Button));
        assert!(!snapshot
            .root
            .children
            .iter()
            .filter_map(|c| c.as_node())
            .any(|n| n.role == AriaRole::Generic));
    }

    #[test]
    fn div_without_role_becomes_generic_for_ai() {
        let document = Html::parse_document("<body><div>text</div></body>");
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let mut builder = SnapshotBuilder::new();
        let options = BuildOptions {
            for_ai: true,
            ref_prefix: "s1".to_string(),
        };
        let snapshot = builder.build(&dom, &options);
        assert!(snapshot
            .root
            .children
            .iter()
            .filter_map(|c| c.as_node())
            .any(|n| n.role == AriaRole::Generic));
    }

    #[test]
    fn checkbox_checked_state() {
        let document = Html::parse_document(r#"<body><input type="checkbox" checked></body>"#);
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&dom, &BuildOptions::default());
        let checkbox = snapshot
            .root
            .children
            .iter()
            .filter_map(|c| c.as_node())
            .find(|n| n.role == AriaRole::Checkbox)
            .expect("checkbox present");
        assert_eq!(checkbox.checked, Some(crate::node::TriState::True));
    }

    #[test]
    fn refs_are_stable_across_builds_of_the_same_document() {
        let document = Html::parse_document(r#"<body><button id="go">Go</button></body>"#);
        let dom = ScraperDom::new(&document, GlobalOptions::default());
        let mut builder = SnapshotBuilder::new();
        let options = BuildOptions {
            for_ai: true,
            ref_prefix: "s1".to_string(),
        };
        let first = builder.build(&dom, &options);
        let second = builder.build(&dom, &options);
        let ref1 = first.root.children[0].as_node().unwrap().ref_id.clone();
        let ref2 = second.root.children[0].as_node().unwrap().ref_id.clone();
        assert_eq!(ref1, ref2);
    }
}
