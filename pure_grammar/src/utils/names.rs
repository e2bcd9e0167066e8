//! Helpers for turning grammar tokens into plain names and strings.
//!
//! Identifiers may appear quoted in the grammar (`'my name'`), and string
//! literals carry their quotes and escape sequences. These helpers centralize
//! the unquoting and unescaping rules so every builder treats them the same
//! way.

/// Separator used between package path segments.
pub const PATH_SEPARATOR: &str = "::";

/// Strip surrounding quotes from a string literal token and resolve escape
/// sequences. When `quoted` is false the text is returned with escapes
/// resolved but no quote stripping.
pub fn from_grammar_string(text: &str, quoted: bool) -> String {
    let inner = if quoted && text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        &text[1..text.len() - 1]
    } else {
        text
    };
    unescape(inner)
}

/// Normalize an identifier token. Quoted identifiers (`'with space'`) are
/// unquoted and unescaped; plain identifiers pass through unchanged.
pub fn from_identifier(text: &str) -> String {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        from_grammar_string(text, true)
    } else {
        text.to_string()
    }
}

/// Join package segments and a name into a full element path.
pub fn element_path(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", package, PATH_SEPARATOR, name)
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grammar_string_unquotes() {
        assert_eq!(from_grammar_string("'hello'", true), "hello");
        assert_eq!(from_grammar_string("'it\\'s'", true), "it's");
        assert_eq!(from_grammar_string("'a\\nb'", true), "a\nb");
    }

    #[test]
    fn test_from_identifier() {
        assert_eq!(from_identifier("plain"), "plain");
        assert_eq!(from_identifier("'quoted name'"), "quoted name");
    }

    #[test]
    fn test_element_path() {
        assert_eq!(element_path("model::domain", "Person"), "model::domain::Person");
        assert_eq!(element_path("", "Person"), "Person");
    }
}
