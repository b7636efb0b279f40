//! Line normalization for the two clone levels (§4.3 step 2): Type 1 keeps
//! identifier names and literals, Type 2 collapses them to placeholders.

/// Keywords and common control/structure words left untouched by the Type 2
/// normalizer so block structure survives identifier/literal collapsing.
const KEYWORDS: &[&str] = &[
    "if", "else", "elif", "elsif", "for", "while", "until", "do", "end", "def", "defp", "fn",
    "func", "class", "module", "struct", "enum", "impl", "trait", "pub", "return", "break",
    "continue", "switch", "case", "default", "try", "catch", "except", "finally", "raise",
    "throw", "new", "this", "self", "super", "true", "false", "nil", "null", "none", "var",
    "let", "const", "static", "void", "int", "float", "double", "bool", "public", "private",
    "protected", "async", "await", "import", "export", "from", "package", "namespace", "use",
    "mod", "extends", "implements", "interface", "yield", "in", "is", "as", "and", "or", "not",
    "unless", "when", "guard",
];

/// Strip a trailing line comment (`//` or `#`, outside string literals) and
/// trailing whitespace.
#[must_use]
pub fn normalize_type1(line: &str) -> String {
    let mut in_single = false;
    let mut in_double = false;
    let mut cut = line.len();
    let mut chars = line.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '/' if !in_single && !in_double => {
                if matches!(chars.peek(), Some((_, '/'))) {
                    cut = idx;
                    break;
                }
            }
            '#' if !in_single && !in_double => {
                cut = idx;
                break;
            }
            _ => {}
        }
    }
    line[..cut].trim_end().to_string()
}

fn classify_token(token: &str, out: &mut String) {
    if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.push_str("LIT");
    } else if KEYWORDS.contains(&token) {
        out.push_str(token);
    } else {
        out.push_str("ID");
    }
}

/// Collapse every identifier to `ID` and every literal to `LIT`, leaving
/// keywords and punctuation untouched (§9 open question 2 / `DESIGN.md`).
#[must_use]
pub fn normalize_type2(type1_line: &str) -> String {
    let chars: Vec<char> = type1_line.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '"' || c == '\'' {
            let quote = c;
            let mut j = i + 1;
            while j < chars.len() && chars[j] != quote {
                if chars[j] == '\\' && j + 1 < chars.len() {
                    j += 1;
                }
                j += 1;
            }
            j = (j + 1).min(chars.len());
            out.push_str("LIT");
            i = j;
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            classify_token(&token, &mut out);
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_type1_strips_line_comment_and_trailing_whitespace() {
        assert_eq!(normalize_type1("let x = 1; // comment   "), "let x = 1;");
        assert_eq!(normalize_type1("value # py comment"), "value");
    }

    #[test]
    fn normalize_type1_preserves_slash_inside_string() {
        assert_eq!(normalize_type1(r#"let p = "a//b";"#), r#"let p = "a//b";"#);
    }

    #[test]
    fn normalize_type2_collapses_identifiers_and_literals() {
        assert_eq!(normalize_type2("let count = 42;"), "let ID = LIT;");
        assert_eq!(normalize_type2(r#"call("hi", name)"#), "ID(LIT, ID)");
    }

    #[test]
    fn normalize_type2_preserves_keywords_and_punctuation() {
        assert_eq!(normalize_type2("if x > 0 { return y }"), "if ID > LIT { return ID }");
    }
}
