use crate::domain::model::CodeBlock;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Rendered markdown body plus what the rest of the pipeline needs from the
/// same pass: the fenced code blocks (for the code checker) and a prose word
/// count (code excluded).
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub html: String,
    pub code_blocks: Vec<CodeBlock>,
    pub word_count: usize,
}

/// Markdown → HTML with a fixed option set, so the same input always yields
/// byte-identical output.
pub fn render(body: &str) -> RenderOutput {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;

    let parsed: Vec<(Event, std::ops::Range<usize>)> =
        Parser::new_ext(body, options).into_offset_iter().collect();

    let mut code_blocks = Vec::new();
    let mut word_count = 0;
    let mut in_code_block = false;
    let mut current_lang: Option<String> = None;
    let mut current_code = String::new();
    let mut current_line = 0;

    for (event, range) in &parsed {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                current_lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        // info 字串可能帶屬性,只取第一個字作為語言標籤
                        info.split_whitespace().next().map(|tag| tag.to_string())
                    }
                    CodeBlockKind::Indented => None,
                };
                current_line = line_of(body, range.start);
                current_code.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                code_blocks.push(CodeBlock {
                    language: current_lang.take(),
                    code: std::mem::take(&mut current_code),
                    line: current_line,
                });
            }
            Event::Text(text) => {
                if in_code_block {
                    current_code.push_str(text);
                } else {
                    word_count += text.split_whitespace().count();
                }
            }
            _ => {}
        }
    }

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parsed.into_iter().map(|(event, _)| event));

    RenderOutput {
        html: out,
        code_blocks,
        word_count,
    }
}

fn line_of(body: &str, offset: usize) -> usize {
    body[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

/// 供版型插值用的最小 HTML 轉義
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
