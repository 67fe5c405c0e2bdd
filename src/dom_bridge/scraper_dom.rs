//! `DomBridge` implementation over parsed (not live-rendered) HTML, via the
//! `scraper` crate.
//!
//! Role/name/visibility heuristics are carried over from this crate's prior
//! life as a flat semantic-tree extractor: tag-to-role mapping, the
//! accessible-name fallback chain, and the pruning rules for
//! `display:none`/`aria-hidden`/`hidden` all come from that extraction pass,
//! generalized here to the `DomBridge` contract instead of baked into a
//! single-pass traversal.

use std::cell::Cell;
use std::collections::HashMap;

use scraper::{ElementRef, Html, Node, Selector};

use super::{ComputedStyle, DomBridge, GlobalOptions, Pseudo};
use crate::node::{NodeBox, TriState};
use crate::role::AriaRole;

type LabelMap = HashMap<String, String>;

/// Tags that carry no accessibility-relevant information.
const PRUNED_TAGS: &[&str] = &[
    "script", "style", "noscript", "meta", "link", "head", "svg", "path", "defs", "clippath",
    "lineargradient", "template", "br", "wbr",
];

/// `DomBridge` over a parsed HTML document. Borrows the document for its
/// whole lifetime, so every `ElementRef<'doc>` handed out stays valid for as
/// long as the bridge does.
pub struct ScraperDom<'doc> {
    document: &'doc Html,
    labels: LabelMap,
    global_options: GlobalOptions,
    caches_active: Cell<bool>,
}

impl<'doc> ScraperDom<'doc> {
    pub fn new(document: &'doc Html, global_options: GlobalOptions) -> Self {
        Self {
            document,
            labels: build_label_map(document),
            global_options,
            caches_active: Cell::new(false),
        }
    }

    fn root_element(&self) -> ElementRef<'doc> {
        self.document.root_element()
    }

    fn style_attr(&self, el: ElementRef<'doc>) -> Option<String> {
        el.value().attr("style").map(|s| s.to_lowercase())
    }
}

impl<'doc> DomBridge for ScraperDom<'doc> {
    type Element = ElementRef<'doc>;

    fn root(&self) -> Self::Element {
        self.root_element()
    }

    fn children(&self, el: Self::Element) -> Vec<super::Child<Self::Element>> {
        let mut out = Vec::new();
        for child in el.children() {
            if let Some(elem) = ElementRef::wrap(child) {
                if should_prune(elem.value()) {
                    continue;
                }
                out.push(super::Child::Element(elem));
            } else if let Node::Text(text) = child.value() {
                if !text.trim().is_empty() {
                    out.push(super::Child::Text(text.to_string()));
                }
            }
        }
        out
    }

    fn tag_name(&self, el: Self::Element) -> String {
        el.value().name.local.to_string()
    }

    fn aria_role(&self, el: Self::Element) -> Option<AriaRole> {
        let value = el.value();
        if let Some(explicit) = value.attr("role") {
            if explicit == "presentation" || explicit == "none" {
                return None;
            }
            return AriaRole::parse(explicit);
        }
        role_from_tag(value.name.local.as_ref(), value)
    }

    fn identity_hint(&self, el: Self::Element) -> Option<String> {
        let value = el.value();
        let mut hint = String::new();
        if let Some(id) = value.attr("id") {
            hint.push_str("id=");
            hint.push_str(id);
        }
        if let Some(name) = value.attr("name") {
            hint.push_str("|name=");
            hint.push_str(name);
        }
        if let Some(href) = value.attr("href") {
            hint.push_str("|href=");
            hint.push_str(href);
        }
        if hint.is_empty() {
            None
        } else {
            Some(hint)
        }
    }

    fn accessible_name(&self, el: Self::Element, include_hidden: bool) -> String {
        let value = el.value();
        let tag = value.name.local.as_ref();

        if let Some(label) = value.attr("aria-label") {
            let trimmed = label.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        if let Some(id) = value.attr("id") {
            if let Some(text) = self.labels.get(id) {
                return text.clone();
            }
        }
        if tag == "img" {
            if let Some(alt) = value.attr("alt") {
                return alt.trim().to_string();
            }
        }
        if matches!(tag, "input" | "textarea") {
            if let Some(ph) = value.attr("placeholder") {
                return ph.trim().to_string();
            }
        }
        if let Some(title) = value.attr("title") {
            let trimmed = title.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }

        let text: String = el
            .text()
            .filter(|_| include_hidden || !self.is_hidden_for_aria(el))
            .collect::<Vec<_>>()
            .join(" ");
        truncate_name(text.trim())
    }

    fn is_hidden_for_aria(&self, el: Self::Element) -> bool {
        let value = el.value();
        if value.attr("aria-hidden") == Some("true") {
            return true;
        }
        if value.attr("hidden").is_some() {
            return true;
        }
        if value.name.local.as_ref() == "input" && value.attr("type") == Some("hidden") {
            return true;
        }
        !self.is_visible(el)
    }

    fn is_visible(&self, el: Self::Element) -> bool {
        match self.style_attr(el) {
            Some(style) => {
                !(style.contains("display:none")
                    || style.contains("display: none")
                    || style.contains("visibility:hidden")
                    || style.contains("visibility: hidden"))
            }
            None => true,
        }
    }

    fn computed_style(&self, el: Self::Element) -> Option<ComputedStyle> {
        let style = self.style_attr(el)?;
        let display = extract_declaration(&style, "display").unwrap_or_default();
        let cursor = extract_declaration(&style, "cursor").unwrap_or_default();
        Some(ComputedStyle { display, cursor })
    }

    fn css_content(&self, _el: Self::Element, _pseudo: Pseudo) -> String {
        // No stylesheet cascade over parsed-only HTML: generated content from
        // a `content:` declaration cannot be resolved without a CSS engine.
        String::new()
    }

    fn aria_checked(&self, el: Self::Element) -> Option<TriState> {
        if let Some(state) = parse_tristate(el.value().attr("aria-checked")) {
            return Some(state);
        }
        let value = el.value();
        if matches!(value.name.local.as_ref(), "input")
            && matches!(value.attr("type"), Some("checkbox") | Some("radio"))
        {
            return Some(if value.attr("checked").is_some() {
                TriState::True
            } else {
                TriState::False
            });
        }
        None
    }

    fn aria_disabled(&self, el: Self::Element) -> Option<bool> {
        if el.value().attr("disabled").is_some() {
            return Some(true);
        }
        parse_bool(el.value().attr("aria-disabled"))
    }

    fn aria_expanded(&self, el: Self::Element) -> Option<bool> {
        parse_bool(el.value().attr("aria-expanded"))
    }

    fn aria_level(&self, el: Self::Element) -> Option<u32> {
        if let Some(level) = el.value().attr("aria-level").and_then(|l| l.parse().ok()) {
            return Some(level);
        }
        match el.value().name.local.as_ref() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    fn aria_pressed(&self, el: Self::Element) -> Option<TriState> {
        parse_tristate(el.value().attr("aria-pressed"))
    }

    fn aria_selected(&self, el: Self::Element) -> Option<bool> {
        if el.value().attr("selected").is_some() {
            return Some(true);
        }
        parse_bool(el.value().attr("aria-selected"))
    }

    fn aria_owns(&self, el: Self::Element) -> Vec<Self::Element> {
        let Some(ids) = el.value().attr("aria-owns") else {
            return Vec::new();
        };
        ids.split_whitespace()
            .filter_map(|id| self.find_by_id(id))
            .collect()
    }

    fn shadow_root_children(&self, _el: Self::Element) -> Vec<Self::Element> {
        // `scraper` parses a single flat document tree; shadow DOM has no
        // representation here.
        Vec::new()
    }

    fn assigned_slot_nodes(&self, _el: Self::Element) -> Option<Vec<Self::Element>> {
        None
    }

    fn is_iframe(&self, el: Self::Element) -> bool {
        el.value().name.local.as_ref() == "iframe"
    }

    fn text_input_value(&self, el: Self::Element) -> Option<String> {
        let value = el.value();
        match value.name.local.as_ref() {
            "textarea" => value.attr("value").map(String::from),
            "input" => {
                let input_type = value.attr("type").unwrap_or("text");
                if matches!(input_type, "checkbox" | "radio") {
                    return None;
                }
                if input_type == "file" && !self.global_options.input_file_role_textbox {
                    return None;
                }
                Some(value.attr("value").unwrap_or("").to_string())
            }
            _ => None,
        }
    }

    fn receives_pointer_events(&self, el: Self::Element) -> bool {
        if let Some(style) = self.style_attr(el) {
            if style.contains("pointer-events:none") || style.contains("pointer-events: none") {
                return false;
            }
        }
        self.is_visible(el)
    }

    fn bounding_box(&self, el: Self::Element) -> NodeBox {
        // No layout engine: geometry is unavailable from parsed HTML alone.
        // Only visibility and cursor feed matcher/renderer decisions.
        let cursor_pointer = self
            .computed_style(el)
            .map(|s| s.cursor == "pointer")
            .unwrap_or(false);
        NodeBox {
            visible: self.is_visible(el),
            cursor_pointer,
            ..NodeBox::default()
        }
    }

    fn href(&self, el: Self::Element) -> Option<String> {
        el.value().attr("href").map(String::from)
    }

    fn global_options(&self) -> GlobalOptions {
        self.global_options
    }

    fn begin_aria_caches(&self) {
        self.caches_active.set(true);
    }

    fn end_aria_caches(&self) {
        self.caches_active.set(false);
    }
}

impl<'doc> ScraperDom<'doc> {
    fn find_by_id(&self, id: &str) -> Option<ElementRef<'doc>> {
        let selector = Selector::parse(&format!("#{}", css_escape_id(id))).ok()?;
        self.document.select(&selector).next()
    }
}

fn css_escape_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c.to_string()
            } else {
                format!("\\{c}")
            }
        })
        .collect()
}

fn should_prune(el: &scraper::node::Element) -> bool {
    let tag = el.name.local.as_ref();
    if PRUNED_TAGS.contains(&tag) {
        return true;
    }
    if tag == "label" && el.attr("for").is_some() {
        // Its text is folded into the associated control's accessible name.
        return true;
    }
    false
}

/// Implicit role from tag + attributes, per the usual HTML-AAM mapping.
/// `None` means the element has no implicit semantic role (plain `div`,
/// `span`, an `<a>` without `href`, …); the builder decides whether that
/// becomes `generic` (forAI) or contributes no node at all (transparent).
fn role_from_tag(tag: &str, el: &scraper::node::Element) -> Option<AriaRole> {
    use AriaRole::*;
    Some(match tag {
        "button" => Button,
        "a" if el.attr("href").is_some() => Link,
        "input" => input_role(el),
        "textarea" => Textbox,
        "select" => Combobox,
        "option" => Option,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Heading,
        "nav" => Navigation,
        "main" => Main,
        "header" => Banner,
        "footer" => ContentInfo,
        "aside" => Complementary,
        "form" => Form,
        "ul" | "ol" => List,
        "li" => ListItem,
        "table" => Table,
        "tr" => Row,
        "td" => Cell,
        "th" => ColumnHeader,
        "img" => Img,
        "dialog" => Dialog,
        "menu" => Menu,
        "hr" => Separator,
        "p" => Paragraph,
        "iframe" => Iframe,
        _ => return None,
    })
}

fn input_role(el: &scraper::node::Element) -> AriaRole {
    use AriaRole::*;
    match el.attr("type").unwrap_or("text") {
        "submit" | "reset" | "button" | "image" => Button,
        "checkbox" => Checkbox,
        "radio" => Radio,
        _ => Textbox,
    }
}

fn truncate_name(s: &str) -> String {
    if s.len() <= 900 {
        return s.to_string();
    }
    let mut end = 900;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn parse_bool(attr: Option<&str>) -> Option<bool> {
    match attr {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

fn parse_tristate(attr: Option<&str>) -> Option<TriState> {
    match attr {
        Some("true") => Some(TriState::True),
        Some("false") => Some(TriState::False),
        Some("mixed") => Some(TriState::Mixed),
        _ => None,
    }
}

fn extract_declaration(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        if k.trim() == property {
            Some(v.trim().to_string())
        } else {
            None
        }
    })
}

fn build_label_map(document: &Html) -> LabelMap {
    let selector = Selector::parse("label[for]").expect("valid selector");
    let mut map = LabelMap::new();
    for label_el in document.select(&selector) {
        if let Some(for_id) = label_el.value().attr("for") {
            let text: String = label_el.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim().to_string();
            if !trimmed.is_empty() {
                map.insert(for_id.to_string(), trimmed);
            }
        }
    }
    map
}
