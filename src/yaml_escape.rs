//! YAML-escaping helpers consumed by the Renderer (§6).

/// Escape a mapping key if it contains characters that would change its
/// meaning in a YAML flow scalar (currently: anything that isn't a plain
/// identifier-ish run gets JSON-quoted, matching how the renderer already
/// quotes names).
pub fn yaml_escape_key_if_needed(key: &str) -> String {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'))
    {
        json_quote(key)
    } else {
        key.to_string()
    }
}

/// Escape a scalar value for use after a YAML `: `. Values already wrapped
/// in `/…/` (regex literals) are passed through verbatim.
pub fn yaml_escape_value_if_needed(value: &str) -> String {
    if is_regex_literal(value) {
        value.to_string()
    } else {
        json_quote(value)
    }
}

pub fn is_regex_literal(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('/') && value.ends_with('/')
}

fn json_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_pass_through() {
        assert_eq!(yaml_escape_key_if_needed("button"), "button");
        assert_eq!(yaml_escape_key_if_needed("my-role"), "my-role");
    }

    #[test]
    fn keys_with_specials_are_quoted() {
        assert_eq!(yaml_escape_key_if_needed("a:b"), "\"a:b\"");
    }

    #[test]
    fn regex_values_pass_through_verbatim() {
        assert_eq!(yaml_escape_value_if_needed("/Issues \\d+/"), "/Issues \\d+/");
    }

    #[test]
    fn plain_values_are_json_quoted() {
        assert_eq!(yaml_escape_value_if_needed("hello \"world\""), "\"hello \\\"world\\\"\"");
    }
}
