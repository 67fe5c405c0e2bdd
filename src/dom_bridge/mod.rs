//! `DomBridge`: the external collaborator spec.md §6 assumes is available —
//! role/name/state lookups over a DOM element and CSS pseudo-element
//! content. The engine core (`builder`, `normalize`, `matcher`, `score`,
//! `render`) never touches a concrete DOM type directly; it is generic over
//! `DomBridge::Element`.
//!
//! [`scraper_dom`] provides the one concrete implementation shipped with
//! this crate, over parsed (not live-rendered) HTML.

pub mod scraper_dom;

use crate::node::{NodeBox, TriState};
use crate::role::AriaRole;

/// Which CSS pseudo-element to read generated content from (§4.1 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    Before,
    After,
}

/// The subset of computed style the builder needs (§6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComputedStyle {
    pub display: String,
    pub cursor: String,
}

impl ComputedStyle {
    pub fn is_inline(&self) -> bool {
        self.display == "inline" || self.display.is_empty()
    }
}

/// Process-wide options (§6 `getGlobalOptions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalOptions {
    pub input_file_role_textbox: bool,
}

/// External DOM utility contract (§6). `Element` is the backend's
/// non-owning element handle (e.g. `scraper::ElementRef<'doc>`); it must be
/// `Copy` so the builder can pass it around freely during a single build.
pub trait DomBridge {
    type Element: Copy + Eq;

    fn root(&self) -> Self::Element;

    /// Natural children in document order, both element and text nodes.
    fn children(&self, el: Self::Element) -> Vec<Child<Self::Element>>;

    fn tag_name(&self, el: Self::Element) -> String;

    /// Role per tag/attribute semantics. `None` means the element has no
    /// implicit or explicit role at all (a plain `div`, an `<a>` without
    /// `href`, or an explicit `role="presentation"`/`"none"`) — distinct
    /// from `forAI`'s "default absent role to generic" fallback, which the
    /// builder applies on top of this.
    fn aria_role(&self, el: Self::Element) -> Option<AriaRole>;

    /// A strong-identity fingerprint (from `id`/`name`/`href`) used to keep
    /// ref assignment stable across builds of the same document. `None` if
    /// the element carries none, in which case the builder falls back to a
    /// structural-path key.
    fn identity_hint(&self, el: Self::Element) -> Option<String>;

    fn accessible_name(&self, el: Self::Element, include_hidden: bool) -> String;

    fn is_hidden_for_aria(&self, el: Self::Element) -> bool;

    fn is_visible(&self, el: Self::Element) -> bool;

    fn computed_style(&self, el: Self::Element) -> Option<ComputedStyle>;

    fn css_content(&self, el: Self::Element, pseudo: Pseudo) -> String;

    fn aria_checked(&self, el: Self::Element) -> Option<TriState>;
    fn aria_disabled(&self, el: Self::Element) -> Option<bool>;
    fn aria_expanded(&self, el: Self::Element) -> Option<bool>;
    fn aria_level(&self, el: Self::Element) -> Option<u32>;
    fn aria_pressed(&self, el: Self::Element) -> Option<TriState>;
    fn aria_selected(&self, el: Self::Element) -> Option<bool>;

    /// Ids named in `aria-owns`, resolved against the owning document.
    fn aria_owns(&self, el: Self::Element) -> Vec<Self::Element>;

    fn shadow_root_children(&self, el: Self::Element) -> Vec<Self::Element>;

    /// `Some(assigned nodes)` if `el` is a `<slot>`, else `None` (so the
    /// builder knows to use natural children instead).
    fn assigned_slot_nodes(&self, el: Self::Element) -> Option<Vec<Self::Element>>;

    fn is_iframe(&self, el: Self::Element) -> bool;

    /// For `<input>`/`<textarea>` not handled specially (checkbox/radio,
    /// and `file` unless `inputFileRoleTextbox`): the current field value,
    /// to be used as the sole text child (§4.1 step 2).
    fn text_input_value(&self, el: Self::Element) -> Option<String>;

    fn receives_pointer_events(&self, el: Self::Element) -> bool;

    fn bounding_box(&self, el: Self::Element) -> NodeBox;

    fn href(&self, el: Self::Element) -> Option<String>;

    fn global_options(&self) -> GlobalOptions;

    /// Bracketed cache-lifetime hooks (§5). Implementations that don't
    /// cache anything may no-op both.
    fn begin_aria_caches(&self);
    fn end_aria_caches(&self);
}

#[derive(Debug, Clone)]
pub enum Child<E> {
    Element(E),
    Text(String),
}

/// RAII guard around `begin_aria_caches`/`end_aria_caches` so the release
/// path always runs, including when traversal panics (§5).
pub struct AriaCacheGuard<'a, D: DomBridge + ?Sized> {
    bridge: &'a D,
}

impl<'a, D: DomBridge + ?Sized> AriaCacheGuard<'a, D> {
    pub fn new(bridge: &'a D) -> Self {
        bridge.begin_aria_caches();
        Self { bridge }
    }
}

impl<'a, D: DomBridge + ?Sized> Drop for AriaCacheGuard<'a, D> {
    fn drop(&mut self) {
        self.bridge.end_aria_caches();
    }
}
