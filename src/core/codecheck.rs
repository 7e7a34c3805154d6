use crate::domain::model::{CodeBlock, CodeCheckMode};
use crate::utils::error::{PressError, Result};

const KNOWN_LANGUAGES: &[&str] = &[
    "bash", "c", "c++", "cmake", "console", "cpp", "css", "diff", "go", "html", "java",
    "javascript", "js", "json", "make", "plain", "py", "python", "rb", "ruby", "rust", "sh",
    "shell", "sql", "text", "toml", "ts", "txt", "typescript", "xml", "yaml",
];

// 會做括號平衡檢查的語言
const BRACE_LANGUAGES: &[&str] = &[
    "c", "c++", "cpp", "css", "go", "java", "javascript", "js", "json", "rust", "ts",
    "typescript",
];

/// Syntactic validation of fenced code illustrations. Whether an example
/// actually compiles is out of scope; this catches the mistakes that survive
/// copy-paste editing: missing or unknown language tags and unbalanced
/// delimiters.
pub struct CodeChecker {
    mode: CodeCheckMode,
}

impl CodeChecker {
    pub fn new(mode: CodeCheckMode) -> Self {
        Self { mode }
    }

    /// Check every block of one document. `warn` collects diagnostics and
    /// keeps going; `strict` turns the first diagnostic into an error.
    pub fn check(&self, source_path: &str, blocks: &[CodeBlock]) -> Result<Vec<String>> {
        if self.mode == CodeCheckMode::Off {
            return Ok(Vec::new());
        }

        let mut diagnostics = Vec::new();
        for block in blocks {
            if let Some(problem) = check_block(block) {
                let message = format!(
                    "{}: code block at line {}: {}",
                    source_path, block.line, problem
                );
                if self.mode == CodeCheckMode::Strict {
                    return Err(PressError::CodeCheckError {
                        path: source_path.to_string(),
                        message,
                    });
                }
                tracing::warn!("🔶 {}", message);
                diagnostics.push(message);
            }
        }

        Ok(diagnostics)
    }
}

fn check_block(block: &CodeBlock) -> Option<String> {
    let Some(language) = block.language.as_deref() else {
        return Some("missing language tag".to_string());
    };

    let language = language.to_ascii_lowercase();
    if !KNOWN_LANGUAGES.contains(&language.as_str()) {
        return Some(format!("unknown language tag `{language}`"));
    }

    if BRACE_LANGUAGES.contains(&language.as_str()) {
        return check_balance(&block.code);
    }

    None
}

/// Delimiter balance for C-like sources. String and character literals, `//`
/// line comments and `/* */` block comments are skipped; a bare `'` that does
/// not close within two characters is treated as a Rust lifetime, not a
/// character literal.
fn check_balance(code: &str) -> Option<String> {
    let bytes = code.as_bytes();
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut line = 1usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => line += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let opened_on = line;
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i + 1 >= bytes.len() {
                    return Some(format!(
                        "block comment opened on line {opened_on} is never closed"
                    ));
                }
                i += 2;
                continue;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    } else if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Some(format!("line {line}: unterminated string literal"));
                }
            }
            b'\'' => {
                if let Some(end) = char_literal_end(bytes, i) {
                    i = end;
                }
            }
            open @ (b'(' | b'[' | b'{') => stack.push((open, line)),
            close @ (b')' | b']' | b'}') => match stack.pop() {
                Some((open, _)) if open == matching_open(close) => {}
                Some((open, open_line)) => {
                    return Some(format!(
                        "line {line}: `{}` closes `{}` opened on line {open_line}",
                        close as char, open as char
                    ));
                }
                None => {
                    return Some(format!("line {line}: unexpected `{}`", close as char));
                }
            },
            _ => {}
        }
        i += 1;
    }

    if let Some((open, open_line)) = stack.pop() {
        return Some(format!(
            "`{}` opened on line {open_line} is never closed",
            open as char
        ));
    }

    None
}

fn char_literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start + 1) == Some(&b'\\') {
        // '\n' 之類的跳脫字元
        if bytes.get(start + 3) == Some(&b'\'') {
            return Some(start + 3);
        }
        return None;
    }
    if bytes.get(start + 2) == Some(&b'\'') {
        return Some(start + 2);
    }
    None
}

fn matching_open(close: u8) -> u8 {
    match close {
        b')' => b'(',
        b']' => b'[',
        _ => b'{',
    }
}
