use crate::theme::Theme;
use eframe::egui::{self, RichText};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    Quote(Vec<Span>),
    ListItem {
        depth: usize,
        marker: String,
        spans: Vec<Span>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Paragraph,
    Heading(u8),
    Item,
}

/// Assistant text parsed once into blocks that egui can draw every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    blocks: Vec<Block>,
}

impl MarkdownDocument {
    pub fn parse(source: &str) -> Self {
        let mut builder = Builder::default();
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        for event in Parser::new_ext(source, options) {
            builder.handle(event);
        }
        builder.finish()
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[cfg(test)]
    pub fn to_plain_text(&self) -> String {
        let join = |spans: &[Span]| {
            spans
                .iter()
                .map(|span| span.text.as_str())
                .collect::<String>()
        };
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { spans, .. } | Block::Paragraph(spans) | Block::Quote(spans) => {
                    join(spans)
                }
                Block::ListItem { marker, spans, .. } => format!("{marker} {}", join(spans)),
                Block::CodeBlock { code, .. } => code.clone(),
                Block::Table { header, rows } => std::iter::once(header)
                    .chain(rows)
                    .map(|row| row.join(" | "))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Block::Rule => "---".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn show(&self, ui: &mut egui::Ui, theme: &Theme) {
        for (index, block) in self.blocks.iter().enumerate() {
            match block {
                Block::Heading { level, spans } => {
                    let size = match level {
                        1 => 20.0,
                        2 => 17.0,
                        _ => 15.0,
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        for span in spans {
                            ui.label(styled(span, theme).size(size).strong());
                        }
                    });
                }
                Block::Paragraph(spans) => {
                    show_spans(ui, theme, spans);
                }
                Block::Quote(spans) => {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("▌").color(theme.accent_muted));
                        ui.vertical(|ui| show_spans(ui, theme, spans));
                    });
                }
                Block::ListItem {
                    depth,
                    marker,
                    spans,
                } => {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        ui.add_space(theme.spacing_16 * depth.saturating_sub(1) as f32);
                        ui.label(RichText::new(format!("{marker} ")).color(theme.text_muted));
                        for span in spans {
                            ui.label(styled(span, theme));
                        }
                    });
                }
                Block::CodeBlock { language, code } => {
                    theme.code_frame().show(ui, |ui| {
                        if let Some(language) = language {
                            ui.label(RichText::new(language).color(theme.text_muted).size(12.0));
                        }
                        ui.label(RichText::new(code.trim_end()).monospace());
                    });
                }
                Block::Table { header, rows } => {
                    egui::Grid::new(("markdown_table", index))
                        .striped(true)
                        .spacing(egui::vec2(theme.spacing_12, 4.0))
                        .show(ui, |ui| {
                            for cell in header {
                                ui.label(RichText::new(cell).strong().color(theme.text_primary));
                            }
                            ui.end_row();
                            for row in rows {
                                for cell in row {
                                    ui.label(RichText::new(cell).color(theme.text_primary));
                                }
                                ui.end_row();
                            }
                        });
                }
                Block::Rule => {
                    ui.separator();
                }
            }
        }
    }
}

fn show_spans(ui: &mut egui::Ui, theme: &Theme, spans: &[Span]) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for span in spans {
            ui.label(styled(span, theme));
        }
    });
}

fn styled(span: &Span, theme: &Theme) -> RichText {
    let mut text = RichText::new(&span.text).color(theme.text_primary);
    if span.strong {
        text = text.strong();
    }
    if span.emphasis {
        text = text.italics();
    }
    if span.strikethrough {
        text = text.strikethrough();
    }
    if span.code {
        text = text.code();
    }
    text
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    open: Option<Open>,
    item: Option<(usize, String)>,
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    code_block: Option<(Option<String>, String)>,
    table: Option<TableBuilder>,
}

#[derive(Default)]
struct TableBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl Builder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, code)) = self.code_block.as_mut() {
                    code.push_str(&text);
                } else {
                    self.push_text(&text, false);
                }
            }
            Event::Code(code) => self.push_text(&code, true),
            Event::Html(html) => self.push_text(&html, false),
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::TaskListMarker(done) => {
                self.push_text(if done { "[x] " } else { "[ ] " }, false)
            }
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::FootnoteReference(label) => self.push_text(&format!("[{label}]"), false),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.open.is_none() {
                    self.open = Some(Open::Paragraph);
                }
            }
            Tag::Heading(level, _, _) => {
                self.flush();
                self.open = Some(Open::Heading(level as u8));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                        Some(info.trim().to_string())
                    }
                    _ => None,
                };
                self.code_block = Some((language, String::new()));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len();
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}.");
                        *next += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.item = Some((depth, marker));
                self.open = Some(Open::Item);
            }
            Tag::Table(_) => {
                self.flush();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.clear();
                }
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::Heading(..) | Tag::Item => self.flush(),
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Tag::CodeBlock(_) => {
                if let Some((language, code)) = self.code_block.take() {
                    self.blocks.push(Block::CodeBlock { language, code });
                }
            }
            Tag::List(_) => {
                self.flush();
                self.lists.pop();
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            // pulldown-cmark puts header cells directly under TableHead
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            Tag::Table(_) => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            Tag::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            Tag::Strong => self.strong = self.strong.saturating_sub(1),
            Tag::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }
        let span = Span {
            text: text.to_string(),
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            code,
        };
        if let Some(last) = self.spans.last_mut() {
            if last.strong == span.strong
                && last.emphasis == span.emphasis
                && last.strikethrough == span.strikethrough
                && last.code == span.code
            {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(span);
    }

    fn flush(&mut self) {
        let open = self.open.take();
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let block = match open {
            Some(Open::Heading(level)) => Block::Heading { level, spans },
            Some(Open::Item) => match self.item.take() {
                Some((depth, marker)) => Block::ListItem {
                    depth,
                    marker,
                    spans,
                },
                None => Block::Paragraph(spans),
            },
            _ if self.quote_depth > 0 => Block::Quote(spans),
            _ => Block::Paragraph(spans),
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> MarkdownDocument {
        self.flush();
        MarkdownDocument {
            blocks: self.blocks,
        }
    }
}
