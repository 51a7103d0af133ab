/*!
 * In-memory model of a Word document body.
 *
 * Paragraphs, tables, rows, cells and runs are modelled; everything else the
 * body contains is carried as verbatim XML so that it can be written back in
 * place. Counts of paragraphs, tables, rows and cells are fixed once a
 * document is built: mutable access only hands out slices.
 */

use std::fmt::Write as _;

/// Namespace header used for documents built in memory
pub(crate) const DEFAULT_DOCUMENT_HEAD: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    "<w:body>"
);

pub(crate) const DEFAULT_DOCUMENT_TAIL: &str = "</w:body></w:document>";

/// Verbatim XML children of a container, anchored to the index of the
/// modelled child they precede.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Fragments {
    items: Vec<(usize, String)>,
}

impl Fragments {
    pub(crate) fn push(&mut self, anchor: usize, xml: impl Into<String>) {
        self.items.push((anchor, xml.into()));
    }

    /// Fragments to emit right before child `index`
    pub(crate) fn before(&self, index: usize) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(move |(anchor, _)| *anchor == index)
            .map(|(_, xml)| xml.as_str())
    }

    /// Fragments to emit after the last of `len` children
    pub(crate) fn trailing(&self, len: usize) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(move |(anchor, _)| *anchor >= len)
            .map(|(_, xml)| xml.as_str())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Order of the body's children
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BodyItem {
    Paragraph(usize),
    Table(usize),
    Raw(String),
}

/// Paragraph alignment (`w:jc`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
    Other(String),
}

impl Alignment {
    pub fn from_val(val: &str) -> Self {
        match val {
            "left" | "start" => Self::Left,
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            "both" => Self::Justify,
            "distribute" => Self::Distribute,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_val(&self) -> &str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
            Self::Distribute => "distribute",
            Self::Other(val) => val,
        }
    }
}

/// Character formatting of a run, as read from `w:rPr`
///
/// `None` means the attribute is inherited from the style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RunFormatting {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    /// Font size in half-points (`w:sz`)
    pub font_size_half_points: Option<u32>,
    /// Hex colour (`w:color`)
    pub color: Option<String>,
    /// ASCII font (`w:rFonts/@w:ascii`)
    pub font: Option<String>,
}

impl RunFormatting {
    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Self::default()
        }
    }

    /// Font size in points
    pub fn font_size_pt(&self) -> Option<f32> {
        self.font_size_half_points.map(|hp| hp as f32 / 2.0)
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Render as a `w:rPr` element, or `None` for plain formatting
    pub(crate) fn to_xml(&self) -> Option<String> {
        if self.is_plain() {
            return None;
        }
        let mut xml = String::from("<w:rPr>");
        if let Some(font) = &self.font {
            let font = quick_xml::escape::escape(font.as_str());
            let _ = write!(xml, r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}"/>"#);
        }
        push_toggle(&mut xml, "w:b", self.bold);
        push_toggle(&mut xml, "w:i", self.italic);
        push_toggle(&mut xml, "w:strike", self.strike);
        if let Some(color) = &self.color {
            let _ = write!(xml, r#"<w:color w:val="{}"/>"#, quick_xml::escape::escape(color.as_str()));
        }
        if let Some(size) = self.font_size_half_points {
            let _ = write!(xml, r#"<w:sz w:val="{size}"/>"#);
        }
        match self.underline {
            Some(true) => xml.push_str(r#"<w:u w:val="single"/>"#),
            Some(false) => xml.push_str(r#"<w:u w:val="none"/>"#),
            None => {}
        }
        xml.push_str("</w:rPr>");
        Some(xml)
    }
}

fn push_toggle(xml: &mut String, tag: &str, value: Option<bool>) {
    match value {
        Some(true) => {
            let _ = write!(xml, "<{tag}/>");
        }
        Some(false) => {
            let _ = write!(xml, r#"<{tag} w:val="0"/>"#);
        }
        None => {}
    }
}

/// Atomic span of text with its own formatting
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Raw opening tag (`<w:r ...>`)
    pub(crate) tag: Option<String>,
    /// Raw `w:rPr`
    pub(crate) properties: Option<String>,
    pub(crate) formatting: RunFormatting,
    pub(crate) text: String,
    /// Non-text children seen before any text (drawings, field chars)
    pub(crate) leading: Vec<String>,
    /// Non-text children seen after text
    pub(crate) trailing: Vec<String>,
    /// Source XML, dropped once the text changes
    pub(crate) original: Option<String>,
}

impl Run {
    /// Plain run with default formatting
    pub fn new(text: impl Into<String>) -> Self {
        Self::styled(text, RunFormatting::default())
    }

    /// Run with explicit formatting
    pub fn styled(text: impl Into<String>, formatting: RunFormatting) -> Self {
        Self {
            tag: None,
            properties: formatting.to_xml(),
            formatting,
            text: text.into(),
            leading: Vec::new(),
            trailing: Vec::new(),
            original: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn formatting(&self) -> &RunFormatting {
        &self.formatting
    }

    /// Replace the text; formatting is left as is
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.original = None;
        }
    }

    /// Whether the run carries content other than text (images, fields)
    pub fn has_embedded_content(&self) -> bool {
        !self.leading.is_empty() || !self.trailing.is_empty()
    }
}

/// Block-level paragraph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub(crate) tag: Option<String>,
    /// Raw `w:pPr`
    pub(crate) properties: Option<String>,
    pub(crate) alignment: Option<Alignment>,
    pub(crate) style: Option<String>,
    pub(crate) runs: Vec<Run>,
    pub(crate) fragments: Fragments,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_runs(vec![Run::new(text)])
    }

    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Set the alignment of a paragraph being built
    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.properties = Some(format!(
            r#"<w:pPr><w:jc w:val="{}"/></w:pPr>"#,
            quick_xml::escape::escape(alignment.as_val())
        ));
        self.alignment = Some(alignment);
        self
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    /// Paragraph style id (`w:pStyle`)
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Remove every run; paragraph properties and non-run content stay
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn add_run(&mut self, run: Run) -> &mut Run {
        self.runs.push(run);
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }
}

/// Table cell: a small sequence of paragraphs
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub(crate) tag: Option<String>,
    pub(crate) paragraphs: Vec<Paragraph>,
    /// `w:tcPr`, nested tables and other verbatim content
    pub(crate) fragments: Fragments,
}

impl TableCell {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        // A cell must hold at least one paragraph to be valid WordprocessingML
        let paragraphs = if paragraphs.is_empty() {
            vec![Paragraph::new()]
        } else {
            paragraphs
        };
        Self {
            tag: None,
            paragraphs,
            fragments: Fragments::default(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Paragraph::from_text(text)])
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Newline-joined text of the cell's paragraphs
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub(crate) tag: Option<String>,
    pub(crate) cells: Vec<TableCell>,
    pub(crate) fragments: Fragments,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            tag: None,
            cells,
            fragments: Fragments::default(),
        }
    }

    pub fn cells(&self) -> &[TableCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [TableCell] {
        &mut self.cells
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) tag: Option<String>,
    pub(crate) rows: Vec<TableRow>,
    /// `w:tblPr`, `w:tblGrid` and other verbatim content
    pub(crate) fragments: Fragments,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            tag: None,
            rows,
            fragments: Fragments::default(),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [TableRow] {
        &mut self.rows
    }

    pub fn cell(&self, row: usize, cell: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(cell))
    }

    pub fn cell_mut(&mut self, row: usize, cell: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(cell))
    }
}

/// Structural counts used to check that a pass kept the tree intact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentShape {
    pub paragraphs: usize,
    pub tables: usize,
    pub rows: usize,
    pub cells: usize,
    /// Paragraphs inside table cells
    pub cell_paragraphs: usize,
}

/// Word document body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) head: String,
    pub(crate) tail: String,
    pub(crate) paragraphs: Vec<Paragraph>,
    pub(crate) tables: Vec<Table>,
    pub(crate) layout: Vec<BodyItem>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with the standard namespace header
    pub fn new() -> Self {
        Self {
            head: DEFAULT_DOCUMENT_HEAD.to_string(),
            tail: DEFAULT_DOCUMENT_TAIL.to_string(),
            paragraphs: Vec::new(),
            tables: Vec::new(),
            layout: Vec::new(),
        }
    }

    /// Append a paragraph to the end of the body
    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Self {
        self.layout.push(BodyItem::Paragraph(self.paragraphs.len()));
        self.paragraphs.push(paragraph);
        self
    }

    /// Append a table to the end of the body
    pub fn push_table(&mut self, table: Table) -> &mut Self {
        self.layout.push(BodyItem::Table(self.tables.len()));
        self.tables.push(table);
        self
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [Table] {
        &mut self.tables
    }

    pub fn shape(&self) -> DocumentShape {
        let mut shape = DocumentShape {
            paragraphs: self.paragraphs.len(),
            tables: self.tables.len(),
            ..DocumentShape::default()
        };
        for table in &self.tables {
            shape.rows += table.rows.len();
            for row in &table.rows {
                shape.cells += row.cells.len();
                shape.cell_paragraphs += row.cells.iter().map(|c| c.paragraphs.len()).sum::<usize>();
            }
        }
        shape
    }

    /// All text of the document in body order, one line per paragraph
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for item in &self.layout {
            match item {
                BodyItem::Paragraph(index) => lines.push(self.paragraphs[*index].text()),
                BodyItem::Table(index) => {
                    for row in &self.tables[*index].rows {
                        for cell in &row.cells {
                            lines.push(cell.text());
                        }
                    }
                }
                BodyItem::Raw(_) => {}
            }
        }
        lines.join("\n")
    }
}
