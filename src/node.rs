use std::collections::BTreeMap;

use crate::role::AriaRole;

/// Tri-state value for `checked`/`pressed` (§3.1: `checked ∈ {true,false,"mixed"}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    False,
    True,
    Mixed,
}

/// Bounding-box + visibility + computed-cursor snapshot (§3.1 `box`).
///
/// Built from parsed HTML rather than a live layout engine, so geometry is a
/// placeholder; only `visible` and `cursor` drive matcher/renderer behavior
/// (see SPEC_FULL.md §4.1a).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
    pub cursor_pointer: bool,
}

/// One child of an `AriaNode`: either a nested node or a raw text run
/// (§3.1: "ordered sequence whose elements are either AriaNode or raw text
/// strings").
#[derive(Debug, Clone, PartialEq)]
pub enum AriaChild<H> {
    Node(AriaNode<H>),
    Text(String),
}

impl<H> AriaChild<H> {
    pub fn as_node(&self) -> Option<&AriaNode<H>> {
        match self {
            AriaChild::Node(n) => Some(n),
            AriaChild::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AriaChild::Text(t) => Some(t.as_str()),
            AriaChild::Node(_) => None,
        }
    }
}

/// One accessibility element (§3.1).
///
/// Generic over `H`, the backend's non-owning DOM element handle type
/// (§9: "implementations in ownership-strict languages scope the entire
/// matching pipeline to the same lifetime as the DOM handle"). Tests and
/// hand-built template fixtures can use `H = ()` and leave `element: None`
/// throughout, since the matcher, scorer, and renderer never dereference it.
#[derive(Debug, Clone, PartialEq)]
pub struct AriaNode<H> {
    pub role: AriaRole,
    pub name: String,
    pub ref_id: Option<String>,
    pub children: Vec<AriaChild<H>>,
    pub props: BTreeMap<String, String>,
    pub checked: Option<TriState>,
    pub disabled: Option<bool>,
    pub expanded: Option<bool>,
    pub level: Option<u32>,
    pub pressed: Option<TriState>,
    pub selected: Option<bool>,
    pub node_box: Option<NodeBox>,
    pub receives_pointer_events: bool,
    pub element: Option<H>,
}

impl<H> AriaNode<H> {
    /// A bare node with the given role and no other attributes set — the
    /// synthetic-root / test-fixture shape.
    pub fn new(role: AriaRole) -> Self {
        Self {
            role,
            name: String::new(),
            ref_id: None,
            children: Vec::new(),
            props: BTreeMap::new(),
            checked: None,
            disabled: None,
            expanded: None,
            level: None,
            pressed: None,
            selected: None,
            node_box: None,
            receives_pointer_events: false,
            element: None,
        }
    }

    pub fn with_name(role: AriaRole, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(role)
        }
    }

    /// True if this node currently has exactly one child and it is a text
    /// child (used by the generic-elision and name-subsumption checks).
    pub fn single_text_child(&self) -> Option<&str> {
        match self.children.as_slice() {
            [AriaChild::Text(t)] => Some(t.as_str()),
            _ => None,
        }
    }
}

/// `{ root, elements }` (§3.2) — populated only in `forAI` mode; otherwise
/// `elements` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AriaSnapshot<H> {
    pub root: AriaNode<H>,
    pub elements: BTreeMap<String, H>,
}

impl<H> AriaSnapshot<H> {
    pub fn new(root: AriaNode<H>) -> Self {
        Self {
            root,
            elements: BTreeMap::new(),
        }
    }
}
