use std::fmt;

/// ARIA roles recognized by the snapshot engine.
///
/// Covers the landmark, document-structure, and widget roles a template can
/// reference, plus the two sentinels the engine itself introduces:
/// `Fragment` (the synthetic snapshot root and wildcard template role) and
/// `Iframe` (always a leaf, regardless of descendants). `Generic` is the
/// "nothing specific" role that `forAI` mode assigns to elements without an
/// explicit or implicit role, and that the Normalizer may collapse away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    Fragment,
    Generic,
    Iframe,
    Alert,
    AlertDialog,
    Banner,
    Button,
    Cell,
    Checkbox,
    ColumnHeader,
    Combobox,
    Complementary,
    ContentInfo,
    Dialog,
    Form,
    Grid,
    Group,
    Heading,
    Img,
    Link,
    List,
    ListItem,
    Main,
    Menu,
    MenuItem,
    Navigation,
    Option,
    Paragraph,
    Radio,
    Region,
    Row,
    RowHeader,
    Search,
    Separator,
    Switch,
    Tab,
    TabList,
    TabPanel,
    Table,
    Textbox,
}

impl AriaRole {
    /// Parse a role from its lowercase wire name (as it appears in a
    /// rendered snapshot or a template's `role` field).
    pub fn parse(name: &str) -> Option<AriaRole> {
        use AriaRole::*;
        Some(match name {
            "fragment" => Fragment,
            "generic" => Generic,
            "iframe" => Iframe,
            "alert" => Alert,
            "alertdialog" => AlertDialog,
            "banner" => Banner,
            "button" => Button,
            "cell" => Cell,
            "checkbox" => Checkbox,
            "columnheader" => ColumnHeader,
            "combobox" => Combobox,
            "complementary" => Complementary,
            "contentinfo" => ContentInfo,
            "dialog" => Dialog,
            "form" => Form,
            "grid" => Grid,
            "group" => Group,
            "heading" => Heading,
            "img" => Img,
            "link" => Link,
            "list" => List,
            "listitem" => ListItem,
            "main" => Main,
            "menu" => Menu,
            "menuitem" | "menuitemcheckbox" | "menuitemradio" => MenuItem,
            "navigation" => Navigation,
            "option" => Option,
            "paragraph" => Paragraph,
            "radio" => Radio,
            "region" => Region,
            "row" => Row,
            "rowheader" => RowHeader,
            "search" => Search,
            "separator" => Separator,
            "switch" => Switch,
            "tab" => Tab,
            "tablist" => TabList,
            "tabpanel" => TabPanel,
            "table" => Table,
            "textbox" => Textbox,
            _ => return None,
        })
    }

    /// Whether `role == "fragment"` should act as a matcher wildcard (§3.3).
    pub fn is_fragment(&self) -> bool {
        matches!(self, AriaRole::Fragment)
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AriaRole::*;
        let s = match self {
            Fragment => "fragment",
            Generic => "generic",
            Iframe => "iframe",
            Alert => "alert",
            AlertDialog => "alertdialog",
            Banner => "banner",
            Button => "button",
            Cell => "cell",
            Checkbox => "checkbox",
            ColumnHeader => "columnheader",
            Combobox => "combobox",
            Complementary => "complementary",
            ContentInfo => "contentinfo",
            Dialog => "dialog",
            Form => "form",
            Grid => "grid",
            Group => "group",
            Heading => "heading",
            Img => "img",
            Link => "link",
            List => "list",
            ListItem => "listitem",
            Main => "main",
            Menu => "menu",
            MenuItem => "menuitem",
            Navigation => "navigation",
            Option => "option",
            Paragraph => "paragraph",
            Radio => "radio",
            Region => "region",
            Row => "row",
            RowHeader => "rowheader",
            Search => "search",
            Separator => "separator",
            Switch => "switch",
            Tab => "tab",
            TabList => "tablist",
            TabPanel => "tabpanel",
            Table => "table",
            Textbox => "textbox",
        };
        write!(f, "{s}")
    }
}

/// Role-sets for which each state attribute is defined (§4.1 step 2,
/// "include each only for roles in its defined role-set"). These mirror the
/// `DomBridge` role-set constants named in §6; they live on the engine side
/// rather than the bridge because they are intrinsic to the ARIA spec, not
/// to whatever backend computed the role.
pub fn admits_checked(role: &AriaRole) -> bool {
    matches!(
        role,
        AriaRole::Checkbox | AriaRole::Radio | AriaRole::MenuItem | AriaRole::Switch
    )
}

pub fn admits_disabled(role: &AriaRole) -> bool {
    matches!(
        role,
        AriaRole::Button
            | AriaRole::Checkbox
            | AriaRole::Combobox
            | AriaRole::Link
            | AriaRole::MenuItem
            | AriaRole::Option
            | AriaRole::Radio
            | AriaRole::Switch
            | AriaRole::Tab
            | AriaRole::Textbox
    )
}

pub fn admits_expanded(role: &AriaRole) -> bool {
    matches!(
        role,
        AriaRole::Button | AriaRole::Combobox | AriaRole::Tab | AriaRole::MenuItem
    )
}

pub fn admits_level(role: &AriaRole) -> bool {
    matches!(role, AriaRole::Heading)
}

pub fn admits_pressed(role: &AriaRole) -> bool {
    matches!(role, AriaRole::Button)
}

pub fn admits_selected(role: &AriaRole) -> bool {
    matches!(
        role,
        AriaRole::Option | AriaRole::Row | AriaRole::Tab | AriaRole::Cell | AriaRole::ColumnHeader
    )
}
