//! Markdown to terminal text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Whether ANSI styling is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Styling {
    Ansi,
    Plain,
}

/// Renders markdown as readable terminal text: headings, emphasis, lists,
/// code blocks and pipe tables. Raw HTML is passed through unchanged.
pub fn render_markdown(source: &str, styling: Styling) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut writer = TerminalWriter::new(styling);
    for event in Parser::new_ext(source, options) {
        writer.event(event);
    }
    writer.finish()
}

struct TerminalWriter {
    styling: Styling,
    out: String,
    /// One entry per open list; `Some(n)` is the next ordered number.
    lists: Vec<Option<u64>>,
    link_targets: Vec<String>,
    in_code_block: bool,
    table_row: Vec<String>,
    table_cell: Option<String>,
}

impl TerminalWriter {
    fn new(styling: Styling) -> Self {
        Self {
            styling,
            out: String::new(),
            lists: Vec::new(),
            link_targets: Vec::new(),
            in_code_block: false,
            table_row: Vec::new(),
            table_cell: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                self.style(DIM);
                self.push("`");
                self.push(&code);
                self.push("`");
                self.style(RESET);
            }
            Event::Html(html) => self.push(&html),
            Event::SoftBreak => self.push(" "),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.block_gap();
                self.push("----------------------------------------");
                self.newline();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.block_gap(),
            Tag::Heading(level, _, _) => {
                self.block_gap();
                self.style(BOLD);
                if level != HeadingLevel::H1 {
                    self.push(&"#".repeat(level as usize));
                    self.push(" ");
                } else {
                    self.style(UNDERLINE);
                }
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.block_gap();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.ensure_line_start();
                let depth = self.lists.len().saturating_sub(1);
                self.push(&"  ".repeat(depth));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.push(&marker);
            }
            Tag::CodeBlock(kind) => {
                self.block_gap();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.style(DIM);
                        self.push(&format!("[{lang}]"));
                        self.style(RESET);
                        self.newline();
                    }
                }
                self.in_code_block = true;
            }
            Tag::Emphasis => self.style(ITALIC),
            Tag::Strong => self.style(BOLD),
            Tag::Link(_, dest_url, _) => self.link_targets.push(dest_url.to_string()),
            Tag::Image(_, dest_url, _) => {
                self.push("[image: ");
                self.link_targets.push(dest_url.to_string());
            }
            Tag::Table(_) => self.block_gap(),
            Tag::TableHead | Tag::TableRow => self.table_row.clear(),
            Tag::TableCell => self.table_cell = Some(String::new()),
            _ => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.newline(),
            Tag::Heading(..) => {
                self.style(RESET);
                self.newline();
            }
            Tag::List(_) => {
                self.lists.pop();
                self.ensure_line_start();
            }
            Tag::Item => self.ensure_line_start(),
            Tag::CodeBlock(_) => {
                self.in_code_block = false;
                self.ensure_line_start();
            }
            Tag::Emphasis | Tag::Strong => self.style(RESET),
            Tag::Link(..) => {
                if let Some(url) = self.link_targets.pop() {
                    self.push(&format!(" ({url})"));
                }
            }
            Tag::Image(..) => {
                self.link_targets.pop();
                self.push("]");
            }
            Tag::TableCell => {
                let cell = self.table_cell.take().unwrap_or_default();
                self.table_row.push(cell.trim().to_string());
            }
            Tag::TableHead => {
                self.flush_table_row();
                let rule = vec!["---"; self.table_row.len()].join(" | ");
                self.push(&format!("| {rule} |"));
                self.newline();
            }
            Tag::TableRow => self.flush_table_row(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.push("    ");
                self.push(line);
                self.newline();
            }
        } else {
            self.push(text);
        }
    }

    fn flush_table_row(&mut self) {
        let row = format!("| {} |", self.table_row.join(" | "));
        self.push(&row);
        self.newline();
    }

    fn push(&mut self, text: &str) {
        match self.table_cell.as_mut() {
            Some(cell) => cell.push_str(text),
            None => self.out.push_str(text),
        }
    }

    fn style(&mut self, code: &str) {
        if self.styling == Styling::Ansi {
            self.push(code);
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn ensure_line_start(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// Blank line between top-level blocks; nothing inside lists.
    fn block_gap(&mut self) {
        if !self.lists.is_empty() {
            return;
        }
        self.ensure_line_start();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        self.ensure_line_start();
        self.out
    }
}
