//! Per-language function-start detection and body-boundary extraction
//! (§4.2 step 2-3): brace-depth for C-family languages, dedent for Python,
//! keyword-depth for Ruby/Elixir.

/// A single extracted function body, inclusive 1-based line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Does this extension use brace-depth body detection?
fn is_brace_lang(ext: &str) -> bool {
    matches!(
        ext,
        "go" | "js" | "ts" | "jsx" | "tsx" | "java" | "kt" | "rs" | "php" | "swift" | "scala" | "cs"
    )
}

pub fn extract_functions(ext: &str, lines: &[String]) -> Vec<FunctionSpan> {
    match ext {
        "py" => extract_python(lines),
        "rb" | "ex" | "exs" => extract_keyword(lines, ext),
        ext if is_brace_lang(ext) => extract_brace(lines, ext),
        _ => Vec::new(),
    }
}

fn trimmed_indent(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn is_rust_fn_start(trimmed: &str) -> Option<&str> {
    let mut rest = trimmed;
    loop {
        if let Some(r) = rest.strip_prefix("pub(crate) ") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("pub(super) ") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("pub ") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("async ") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("unsafe ") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("const ") {
            rest = r;
        } else if rest.starts_with("extern ") {
            if let Some(idx) = rest.find("fn ") {
                rest = &rest[idx..];
            }
            break;
        } else {
            break;
        }
    }
    rest.strip_prefix("fn ")
}

fn function_start_name(ext: &str, trimmed: &str) -> Option<String> {
    match ext {
        "go" => trimmed.strip_prefix("func ").map(parse_simple_name),
        "rs" => is_rust_fn_start(trimmed).map(parse_simple_name),
        "js" | "ts" | "jsx" | "tsx" => {
            if let Some(rest) = trimmed
                .strip_prefix("export default function ")
                .or_else(|| trimmed.strip_prefix("export function "))
                .or_else(|| trimmed.strip_prefix("async function "))
                .or_else(|| trimmed.strip_prefix("function "))
            {
                Some(parse_simple_name(rest))
            } else {
                None
            }
        }
        "java" | "kt" | "cs" | "scala" | "php" | "swift" => generic_brace_fn_start(trimmed),
        _ => None,
    }
}

fn parse_simple_name(rest: &str) -> String {
    rest.split(|c: char| c == '(' || c == '<' || c.is_whitespace())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .trim_start_matches('*')
        .to_string()
}

/// Generic heuristic for brace-bodied languages without a dedicated
/// keyword prefix: a line that opens a parameter list and ends (after
/// trim) with `{`, and isn't itself a control-flow statement.
fn generic_brace_fn_start(trimmed: &str) -> Option<String> {
    const CONTROL_KEYWORDS: &[&str] = &[
        "if ", "if(", "for ", "for(", "while ", "while(", "switch ", "switch(", "catch ",
        "catch(", "else", "do {", "try {", "try{",
    ];
    if CONTROL_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw)) {
        return None;
    }
    if !trimmed.contains('(') || !trimmed.ends_with('{') {
        return None;
    }
    if trimmed.contains(';') {
        return None;
    }
    let before_paren = trimmed.split('(').next()?;
    let name = before_paren.split_whitespace().last()?;
    if name.is_empty() || !name.chars().next().unwrap_or(' ').is_alphabetic() {
        return None;
    }
    Some(name.trim_start_matches('*').to_string())
}

fn extract_brace(lines: &[String], ext: &str) -> Vec<FunctionSpan> {
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if let Some(name) = function_start_name(ext, trimmed) {
            let mut depth = 0i32;
            let mut seen_open = false;
            let mut end_line = i;
            'body: for (offset, line) in lines[i..].iter().enumerate() {
                for ch in line.chars() {
                    match ch {
                        '{' => {
                            depth += 1;
                            seen_open = true;
                        }
                        '}' => depth -= 1,
                        _ => {}
                    }
                }
                end_line = i + offset;
                if seen_open && depth <= 0 {
                    break 'body;
                }
            }
            if seen_open {
                spans.push(FunctionSpan {
                    name,
                    start_line: i + 1,
                    end_line: end_line + 1,
                });
                i = end_line + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

fn extract_python(lines: &[String]) -> Vec<FunctionSpan> {
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        let def_rest = trimmed
            .strip_prefix("async def ")
            .or_else(|| trimmed.strip_prefix("def "));
        if let Some(rest) = def_rest {
            let name = parse_simple_name(rest);
            let base_indent = trimmed_indent(&lines[i]);
            let mut end_line = i;
            let mut j = i + 1;
            while j < lines.len() {
                let line = &lines[j];
                let is_blank_or_comment =
                    line.trim().is_empty() || line.trim_start().starts_with('#');
                if is_blank_or_comment {
                    end_line = j;
                    j += 1;
                    continue;
                }
                if trimmed_indent(line) > base_indent {
                    end_line = j;
                    j += 1;
                } else {
                    break;
                }
            }
            spans.push(FunctionSpan {
                name,
                start_line: i + 1,
                end_line: end_line + 1,
            });
            i = j.max(i + 1);
            continue;
        }
        i += 1;
    }
    spans
}

const KEYWORD_OPENERS: &[&str] = &[
    "def", "class", "module", "do", "if", "unless", "while", "until", "for", "case", "begin",
];

fn extract_keyword(lines: &[String], ext: &str) -> Vec<FunctionSpan> {
    let def_prefixes: &[&str] = if ext == "rb" {
        &["def "]
    } else {
        &["def ", "defp "]
    };
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        let matched = def_prefixes.iter().find_map(|p| trimmed.strip_prefix(p));
        if let Some(rest) = matched {
            let name = parse_simple_name(rest);
            let mut depth = 1i32;
            let mut end_line = i;
            let mut j = i + 1;
            while j < lines.len() && depth > 0 {
                let words = word_tokens(&lines[j]);
                for word in words {
                    if word == "end" {
                        depth -= 1;
                    } else if KEYWORD_OPENERS.contains(&word) {
                        depth += 1;
                    }
                }
                end_line = j;
                j += 1;
            }
            spans.push(FunctionSpan {
                name,
                start_line: i + 1,
                end_line: end_line + 1,
            });
            i = j;
            continue;
        }
        i += 1;
    }
    spans
}

pub(crate) fn word_tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn extracts_simple_rust_function() {
        let src = lines_of("fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n");
        let spans = extract_functions("rs", &src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "add");
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 3);
    }

    #[test]
    fn extracts_pub_async_unsafe_rust_function() {
        let src = lines_of("pub async unsafe fn run(x: u8) {\n    noop();\n}\n");
        let spans = extract_functions("rs", &src);
        assert_eq!(spans[0].name, "run");
    }

    #[test]
    fn extracts_go_function() {
        let src = lines_of("func Add(a, b int) int {\n\treturn a + b\n}\n");
        let spans = extract_functions("go", &src);
        assert_eq!(spans[0].name, "Add");
    }

    #[test]
    fn extracts_python_function_by_dedent() {
        let src = lines_of("def foo(x):\n    if x:\n        return 1\n    return 0\n\ndef bar():\n    pass\n");
        let spans = extract_functions("py", &src);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "foo");
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 4);
        assert_eq!(spans[1].name, "bar");
    }

    #[test]
    fn extracts_ruby_function_by_keyword_depth() {
        let src = lines_of("def foo\n  if bar\n    do_thing\n  end\nend\n");
        let spans = extract_functions("rb", &src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "foo");
        assert_eq!(spans[0].end_line, 5);
    }

    #[test]
    fn extracts_java_method_via_generic_brace_heuristic() {
        let src = lines_of("public int add(int a, int b) {\n    return a + b;\n}\n");
        let spans = extract_functions("java", &src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "add");
    }

    #[test]
    fn ignores_control_flow_statements_as_function_starts() {
        let src = lines_of("if (x) {\n    doThing();\n}\n");
        let spans = extract_functions("java", &src);
        assert!(spans.is_empty());
    }
}
