//! Scorer and Best-Candidate Finder (§4.4): structural similarity used to
//! pick a diff target when `matcher::matches_node_deep` finds nothing.
//!
//! Grounded on the teacher's `extract.rs` field-scoring helpers
//! (`match_field`, string-similarity heuristics) and `diff.rs`'s recursive
//! `diff_node` tree walk, generalized from "compare two known-shaped
//! records" to "find the best-matching subtree for an arbitrary template".

use crate::node::{AriaChild, AriaNode};
use crate::stringutil::similarity_score;
use crate::template::{StateConstraints, TemplateNode, TextMatch, TriStateConstraint};

const NO_MATCH_FLOOR: i64 = -200;
const TEXT_EXACT: i64 = 1000;
const TEXT_SIMILARITY_SCALE: f64 = 400.0;
const ROLE_MATCH_BONUS: i64 = 500;
const NAME_EXACT_BONUS: i64 = 400;
const STATE_FIELD_BONUS: i64 = 100;
const STATE_ALL_BONUS: i64 = 500;
const URL_MATCH_BONUS: i64 = 100;
const CHILD_POSITION_BONUS: i64 = 200;
const CHILD_NO_MATCH_PENALTY: i64 = 50;
const ALL_CHILDREN_MATCHED_BONUS: i64 = 300;
const DEPTH_BONUS: i64 = 20;

/// `scoreNodeMatch(node, template)` (§4.4), specialized to a text leaf
/// scored against a text template: exact match is worth the same as a
/// fully-matching role node (`TEXT_EXACT`); otherwise a literal template
/// falls back to string similarity, and a regex template is all-or-nothing.
fn score_text_match(actual: &str, template: &TextMatch) -> i64 {
    match template {
        TextMatch::Literal(s) => {
            if actual == s {
                TEXT_EXACT
            } else {
                similarity_score(actual, s, TEXT_SIMILARITY_SCALE)
            }
        }
        TextMatch::Regex(_) => {
            if crate::matcher::matches_text(actual, template).unwrap_or(false) {
                TEXT_EXACT
            } else {
                0
            }
        }
    }
}

fn name_score(actual: &str, template: &TextMatch) -> i64 {
    match template {
        TextMatch::Literal(s) => {
            if actual == s {
                NAME_EXACT_BONUS
            } else {
                similarity_score(actual, s, NAME_EXACT_BONUS as f64)
            }
        }
        TextMatch::Regex(_) => {
            if crate::matcher::matches_text(actual, template).unwrap_or(false) {
                NAME_EXACT_BONUS
            } else {
                0
            }
        }
    }
}

fn state_score<H>(node: &AriaNode<H>, state: &StateConstraints) -> i64 {
    let mut specified = 0;
    let mut matched = 0;
    let mut score = 0;

    let mut check = |want_match: bool| {
        specified += 1;
        if want_match {
            matched += 1;
            score += STATE_FIELD_BONUS;
        }
    };

    if let Some(c) = state.checked {
        check(tristate_matches(node.checked, c));
    }
    if let Some(d) = state.disabled {
        check(node.disabled == Some(d));
    }
    if let Some(e) = state.expanded {
        check(node.expanded == Some(e));
    }
    if let Some(l) = state.level {
        check(node.level == Some(l));
    }
    if let Some(p) = state.pressed {
        check(tristate_matches(node.pressed, p));
    }
    if let Some(s) = state.selected {
        check(node.selected == Some(s));
    }

    if specified > 0 && matched == specified {
        score += STATE_ALL_BONUS;
    }
    score
}

fn tristate_matches(actual: Option<crate::node::TriState>, expected: TriStateConstraint) -> bool {
    use crate::node::TriState;
    matches!(
        (actual, expected),
        (Some(TriState::False), TriStateConstraint::False)
            | (Some(TriState::True), TriStateConstraint::True)
            | (Some(TriState::Mixed), TriStateConstraint::Mixed)
    )
}

/// `scoreNodeMatch(node, template)` for a role template against an
/// `AriaNode`: summed contributions from role, name, state, url, and
/// children. Mismatched role still contributes the rest of the score —
/// this function answers "how close", not "does it match".
pub fn score_node_match<H>(node: &AriaNode<H>, template: &TemplateNode) -> i64 {
    let TemplateNode::Role {
        role,
        name,
        url,
        state,
        children,
        ..
    } = template
    else {
        return NO_MATCH_FLOOR;
    };

    let mut score = 0i64;
    if role.is_fragment() || node.role == *role {
        score += ROLE_MATCH_BONUS;
    }
    if let Some(name_match) = name {
        score += name_score(&node.name, name_match);
    }
    score += state_score(node, state);
    if let Some(url_match) = url {
        let url_value = node.props.get("url").map(String::as_str).unwrap_or("");
        if crate::matcher::matches_text(url_value, url_match).unwrap_or(false) {
            score += URL_MATCH_BONUS;
        }
    }
    score += find_best_children_matches(&node.children, children, true).0;
    score
}

fn score_child_match<H>(actual: &AriaChild<H>, template: &TemplateNode) -> i64 {
    match (actual, template) {
        (AriaChild::Text(t), TemplateNode::Text { text, .. }) => score_text_match(t, text),
        (AriaChild::Node(n), TemplateNode::Role { .. }) => score_node_match(n, template),
        _ => NO_MATCH_FLOOR,
    }
}

/// `findBestChildrenMatches(children, templateChildren, includePositionBonus)`
/// (§4.4): greedy per-template-child assignment of the highest-scoring
/// unused actual child (ties go to the lower actual index). Returns the
/// total score and the set of actual indices chosen, in ascending order.
pub fn find_best_children_matches<H>(
    actual: &[AriaChild<H>],
    templates: &[TemplateNode],
    include_position_bonus: bool,
) -> (i64, Vec<usize>) {
    if templates.is_empty() {
        return (0, Vec::new());
    }
    if actual.is_empty() {
        return (templates.len() as i64 * -CHILD_NO_MATCH_PENALTY, Vec::new());
    }

    let mut used = vec![false; actual.len()];
    let mut score = 0i64;
    let mut selected = Vec::new();
    let mut all_matched = true;

    for (t_idx, t) in templates.iter().enumerate() {
        let mut best: Option<(usize, i64)> = None;
        for (a_idx, a) in actual.iter().enumerate() {
            if used[a_idx] {
                continue;
            }
            let s = score_child_match(a, t);
            if best.map(|(_, best_score)| s > best_score).unwrap_or(true) {
                best = Some((a_idx, s));
            }
        }

        match best {
            Some((a_idx, s)) if s > NO_MATCH_FLOOR => {
                used[a_idx] = true;
                selected.push(a_idx);
                let mut contribution = s;
                if include_position_bonus && a_idx == t_idx {
                    contribution += CHILD_POSITION_BONUS;
                }
                score += contribution;
            }
            _ => {
                all_matched = false;
                if include_position_bonus {
                    score -= CHILD_NO_MATCH_PENALTY;
                }
            }
        }
    }

    if include_position_bonus && all_matched {
        score += ALL_CHILDREN_MATCHED_BONUS;
    }

    selected.sort_unstable();
    (score, selected)
}

/// What the best-candidate search landed on: either a single node (ordinary
/// role-template scoring) or a set of sibling indices under `parent`
/// (multi-child fragment-template scoring, §4.4 "fragment wrapping").
pub enum BestCandidate<'a, H> {
    Node(&'a AriaNode<H>),
    FragmentChildren {
        parent: &'a AriaNode<H>,
        indices: Vec<usize>,
    },
}

pub struct BestMatch<'a, H> {
    pub candidate: BestCandidate<'a, H>,
    pub score: i64,
}

/// `findBestStructuralMatch` (§4.4): DFS over the whole tree, keeping the
/// argmax of `score + 20 * depth`.
pub fn find_best_structural_match<'a, H>(
    root: &'a AriaNode<H>,
    template: &TemplateNode,
) -> Option<BestMatch<'a, H>> {
    let mut best = None;
    visit_best(root, template, 0, &mut best);
    best
}

fn visit_best<'a, H>(
    node: &'a AriaNode<H>,
    template: &TemplateNode,
    depth: i64,
    best: &mut Option<BestMatch<'a, H>>,
) {
    let is_multi_child_fragment =
        matches!(template, TemplateNode::Role { role, children, .. } if role.is_fragment() && children.len() > 1);

    let (base_score, candidate) = if is_multi_child_fragment {
        let TemplateNode::Role { children, .. } = template else {
            unreachable!()
        };
        let (score, _) = find_best_children_matches(&node.children, children, true);
        let (_, indices) = find_best_children_matches(&node.children, children, false);
        (score, BestCandidate::FragmentChildren { parent: node, indices })
    } else {
        (score_node_match(node, template), BestCandidate::Node(node))
    };

    let score = base_score + DEPTH_BONUS * depth;
    let better = match best {
        None => true,
        Some(current) => score > current.score,
    };
    if better {
        *best = Some(BestMatch { candidate, score });
    }

    for child in &node.children {
        if let AriaChild::Node(n) = child {
            visit_best(n, template, depth + 1, best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AriaNode;
    use crate::role::AriaRole;

    #[test]
    fn exact_name_match_scores_role_plus_name() {
        let node = AriaNode::with_name(AriaRole::Heading, "title");
        let template = TemplateNode::role(AriaRole::Heading).named("title");
        assert_eq!(score_node_match(&node, &template), ROLE_MATCH_BONUS + NAME_EXACT_BONUS);
    }

    #[test]
    fn mismatched_role_still_scores_name_similarity() {
        let node = AriaNode::with_name(AriaRole::Button, "title");
        let template = TemplateNode::role(AriaRole::Heading).named("title");
        assert_eq!(score_node_match(&node, &template), NAME_EXACT_BONUS);
    }

    #[test]
    fn children_best_candidate_picks_closest_listitem() {
        let mut list: AriaNode<()> = AriaNode::new(AriaRole::List);
        list.children = vec![
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Alpha")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Beta")),
            AriaChild::Node(AriaNode::with_name(AriaRole::ListItem, "Gamma")),
        ];
        let template = TemplateNode::role(AriaRole::List)
            .container_mode(crate::template::ContainerMode::Equal)
            .children([
                TemplateNode::role(AriaRole::ListItem).named("Alpha"),
                TemplateNode::role(AriaRole::ListItem).named("Beta"),
                TemplateNode::role(AriaRole::ListItem).named("Wrong"),
            ]);

        let result = find_best_structural_match(&list, &template).expect("some candidate");
        match result.candidate {
            BestCandidate::Node(n) => assert_eq!(n.role, AriaRole::List),
            _ => panic!("expected node candidate for single-role template"),
        }
        assert!(result.score > 0);
    }

    #[test]
    fn empty_templates_score_zero() {
        let (score, selected) = find_best_children_matches::<()>(&[], &[], true);
        assert_eq!(score, 0);
        assert!(selected.is_empty());
    }

    #[test]
    fn empty_actual_with_templates_penalizes_each() {
        let templates = vec![
            TemplateNode::role(AriaRole::ListItem),
            TemplateNode::role(AriaRole::ListItem),
        ];
        let (score, selected) = find_best_children_matches::<()>(&[], &templates, true);
        assert_eq!(score, -2 * CHILD_NO_MATCH_PENALTY);
        assert!(selected.is_empty());
    }
}
