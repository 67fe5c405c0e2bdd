use crate::role::AriaRole;

/// A regex constraint on a text or name value (§3.3). Interpreted as an
/// un-anchored regular expression by the matcher and scorer — never
/// silently anchored (§9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexPattern {
    pub pattern: String,
}

impl RegexPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// A string or regex constraint, as used for `text`, `name`, and `props.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Literal(String),
    Regex(RegexPattern),
}

impl TextMatch {
    pub fn literal(s: impl Into<String>) -> Self {
        TextMatch::Literal(s.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        TextMatch::Regex(RegexPattern::new(pattern))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            TextMatch::Literal(s) => Some(s.as_str()),
            TextMatch::Regex(_) => None,
        }
    }
}

/// Child-list comparison policy on a role template (§4.3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerMode {
    /// Template children must appear as an in-order subsequence of the
    /// node's children. Default when no mode is specified.
    #[default]
    Contain,
    /// Lists must have the same length and match pairwise.
    Equal,
    /// Same as `Equal`, but child comparisons recurse with `equal` mode
    /// throughout the subtree.
    DeepEqual,
}

/// State-attribute constraints a role template can assert (§3.3). `None`
/// means "unconstrained" for that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateConstraints {
    pub checked: Option<TriStateConstraint>,
    pub disabled: Option<bool>,
    pub expanded: Option<bool>,
    pub level: Option<u32>,
    pub pressed: Option<TriStateConstraint>,
    pub selected: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriStateConstraint {
    False,
    True,
    Mixed,
}

/// Input to the matcher (§3.3): a tagged variant of either a text leaf or a
/// role node with children.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Text {
        text: TextMatch,
        line_number: Option<u32>,
    },
    Role {
        role: AriaRole,
        name: Option<TextMatch>,
        url: Option<TextMatch>,
        state: StateConstraints,
        container_mode: ContainerMode,
        children: Vec<TemplateNode>,
        line_number: Option<u32>,
    },
}

impl TemplateNode {
    /// Construct a bare role template with no constraints — the common
    /// starting point for hand-built templates and tests.
    pub fn role(role: AriaRole) -> Self {
        TemplateNode::Role {
            role,
            name: None,
            url: None,
            state: StateConstraints::default(),
            container_mode: ContainerMode::default(),
            children: Vec::new(),
            line_number: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        TemplateNode::Text {
            text: TextMatch::literal(text),
            line_number: None,
        }
    }

    pub fn text_regex(pattern: impl Into<String>) -> Self {
        TemplateNode::Text {
            text: TextMatch::regex(pattern),
            line_number: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let TemplateNode::Role { name: n, .. } = &mut self {
            *n = Some(TextMatch::literal(name));
        }
        self
    }

    #[must_use]
    pub fn named_regex(mut self, pattern: impl Into<String>) -> Self {
        if let TemplateNode::Role { name: n, .. } = &mut self {
            *n = Some(TextMatch::regex(pattern));
        }
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        if let TemplateNode::Role { url: u, .. } = &mut self {
            *u = Some(TextMatch::literal(url));
        }
        self
    }

    #[must_use]
    pub fn with_url_regex(mut self, pattern: impl Into<String>) -> Self {
        if let TemplateNode::Role { url: u, .. } = &mut self {
            *u = Some(TextMatch::regex(pattern));
        }
        self
    }

    #[must_use]
    pub fn container_mode(mut self, mode: ContainerMode) -> Self {
        if let TemplateNode::Role { container_mode, .. } = &mut self {
            *container_mode = mode;
        }
        self
    }

    #[must_use]
    pub fn state(mut self, state: StateConstraints) -> Self {
        if let TemplateNode::Role { state: s, .. } = &mut self {
            *s = state;
        }
        self
    }

    #[must_use]
    pub fn child(mut self, child: TemplateNode) -> Self {
        if let TemplateNode::Role { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    #[must_use]
    pub fn children(mut self, kids: impl IntoIterator<Item = TemplateNode>) -> Self {
        if let TemplateNode::Role { children, .. } = &mut self {
            children.extend(kids);
        }
        self
    }

    pub fn line_number(&self) -> Option<u32> {
        match self {
            TemplateNode::Text { line_number, .. } => *line_number,
            TemplateNode::Role { line_number, .. } => *line_number,
        }
    }
}

/// Opaque pointer to the template line that failed a match attempt, used
/// only by the exploratory line-tracking matcher variant (§3.4, §9) — *not*
/// consulted when picking a diff target; the Scorer owns that decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFailure {
    pub template_line_number: Option<u32>,
    pub is_from_template_regex: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let t = TemplateNode::role(AriaRole::Heading)
            .named("title")
            .child(TemplateNode::text("hello"));
        match t {
            TemplateNode::Role { name, children, .. } => {
                assert_eq!(name, Some(TextMatch::literal("title")));
                assert_eq!(children.len(), 1);
            }
            _ => panic!("expected role node"),
        }
    }

    #[test]
    fn fragment_role_is_wildcard() {
        let t = TemplateNode::role(AriaRole::Fragment);
        if let TemplateNode::Role { role, .. } = t {
            assert!(role.is_fragment());
        } else {
            panic!("expected role node");
        }
    }
}
