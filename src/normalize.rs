//! Normalizer (§4.2): string coalescing, name/child de-duplication, and
//! generic-role elision, applied post-order over a freshly built tree.
//!
//! Generalizes the teacher's `merge_adjacent_text`/`merge_repeated_siblings`
//! pair in `pipeline.rs` — same "fold then compress" shape, but against the
//! richer `AriaNode` model and the spec's generic-elision rule rather than
//! the teacher's sibling-repetition summarizer (which has no counterpart
//! here; templates match by role, not bulk sibling counts).

use crate::node::{AriaChild, AriaNode};
use crate::role::AriaRole;
use crate::stringutil::normalize_whitespace;

/// Run string coalescing, name-subsumption, and generic elision over the
/// whole tree, post-order.
pub fn normalize<H>(root: &mut AriaNode<H>) {
    normalize_node(root);
}

fn normalize_node<H>(node: &mut AriaNode<H>) {
    for child in node.children.iter_mut() {
        if let AriaChild::Node(n) = child {
            normalize_node(n);
        }
    }
    coalesce_strings(&mut node.children);
    drop_name_subsumed_child(node);
    elide_generic_children(&mut node.children);
}

/// Fold consecutive string children into one, whitespace-normalize, drop
/// empties.
fn coalesce_strings<H>(children: &mut Vec<AriaChild<H>>) {
    let mut merged: Vec<AriaChild<H>> = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        match child {
            AriaChild::Text(text) => {
                if let Some(AriaChild::Text(prev)) = merged.last_mut() {
                    prev.push_str(&text);
                } else {
                    merged.push(AriaChild::Text(text));
                }
            }
            other => merged.push(other),
        }
    }
    for child in merged.iter_mut() {
        if let AriaChild::Text(text) = child {
            *text = normalize_whitespace(text);
        }
    }
    merged.retain(|c| !matches!(c, AriaChild::Text(t) if t.is_empty()));
    *children = merged;
}

/// If the node has exactly one child and it's a string equal to the node's
/// own name, the name fully subsumes the content — drop the child.
fn drop_name_subsumed_child<H>(node: &mut AriaNode<H>) {
    if let [AriaChild::Text(t)] = node.children.as_slice() {
        if *t == node.name {
            node.children.clear();
        }
    }
}

/// Splice away `generic` children that add no structure: ≤1 child, and if
/// present, that child is an `AriaNode` currently receiving pointer events.
fn elide_generic_children<H>(children: &mut Vec<AriaChild<H>>) {
    let mut out = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        match child {
            AriaChild::Node(node) if is_elidable(&node) => out.extend(node.children),
            other => out.push(other),
        }
    }
    *children = out;
}

fn is_elidable<H>(node: &AriaNode<H>) -> bool {
    node.role == AriaRole::Generic
        && node.children.len() <= 1
        && node.children.iter().all(|c| match c {
            AriaChild::Node(n) => n.receives_pointer_events,
            AriaChild::Text(_) => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AriaNode;

    fn text(s: &str) -> AriaChild<()> {
        AriaChild::Text(s.to_string())
    }

    #[test]
    fn coalesces_and_trims_adjacent_text() {
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![text("  Hello "), text(" World  ")];
        normalize(&mut root);
        assert_eq!(root.children, vec![text("Hello World")]);
    }

    #[test]
    fn drops_empty_text_after_coalescing() {
        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![text("   "), text("")];
        normalize(&mut root);
        assert!(root.children.is_empty());
    }

    #[test]
    fn name_subsuming_single_text_child_is_dropped() {
        let mut node: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "Submit");
        node.children = vec![text("Submit")];
        normalize(&mut node);
        assert!(node.children.is_empty());
    }

    #[test]
    fn elides_pointer_receiving_generic_wrapper() {
        let mut inner: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "Go");
        inner.receives_pointer_events = true;
        let mut wrapper: AriaNode<()> = AriaNode::new(AriaRole::Generic);
        wrapper.children = vec![AriaChild::Node(inner)];

        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(wrapper)];
        normalize(&mut root);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].as_node().unwrap().role, AriaRole::Button);
    }

    #[test]
    fn generic_wrapper_with_non_pointer_child_is_kept() {
        let mut inner: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "Go");
        inner.receives_pointer_events = false;
        let mut wrapper: AriaNode<()> = AriaNode::new(AriaRole::Generic);
        wrapper.children = vec![AriaChild::Node(inner)];

        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(wrapper)];
        normalize(&mut root);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].as_node().unwrap().role, AriaRole::Generic);
    }

    #[test]
    fn generic_wrapper_with_two_children_is_kept() {
        let mut a: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "A");
        a.receives_pointer_events = true;
        let mut b: AriaNode<()> = AriaNode::with_name(AriaRole::Button, "B");
        b.receives_pointer_events = true;
        let mut wrapper: AriaNode<()> = AriaNode::new(AriaRole::Generic);
        wrapper.children = vec![AriaChild::Node(a), AriaChild::Node(b)];

        let mut root: AriaNode<()> = AriaNode::new(AriaRole::Fragment);
        root.children = vec![AriaChild::Node(wrapper)];
        normalize(&mut root);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].as_node().unwrap().role, AriaRole::Generic);
    }
}
