/*!
 * Text unit extraction.
 *
 * A unit is an addressable piece of translatable text. Its identity is the
 * structural path to its source node, captured once at extraction time and
 * carried unchanged through translation and write-back.
 */

use std::fmt;

use crate::document::{Document, Paragraph, RunFormatting};

/// Unit size used for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Whole paragraphs in the body, whole cells in tables
    Block,
    /// Individual runs
    Run,
}

/// Part of the document a unit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Body,
    Table,
}

/// Location of a table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPath {
    pub table: usize,
    pub row: usize,
    pub cell: usize,
}

impl fmt::Display for CellPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t[{}]/r[{}]/c[{}]", self.table, self.row, self.cell)
    }
}

/// Structural identity of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitId {
    /// A whole body paragraph
    Paragraph { paragraph: usize },
    /// A whole table cell
    Cell(CellPath),
    /// One run of a body paragraph
    BodyRun { paragraph: usize, run: usize },
    /// One run of a paragraph inside a cell
    CellRun { cell: CellPath, paragraph: usize, run: usize },
}

impl UnitId {
    pub fn region(&self) -> Region {
        match self {
            Self::Paragraph { .. } | Self::BodyRun { .. } => Region::Body,
            Self::Cell(_) | Self::CellRun { .. } => Region::Table,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Paragraph { .. } | Self::Cell(_) => Granularity::Block,
            Self::BodyRun { .. } | Self::CellRun { .. } => Granularity::Run,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paragraph { paragraph } => write!(f, "p[{}]", paragraph),
            Self::Cell(cell) => write!(f, "{}", cell),
            Self::BodyRun { paragraph, run } => write!(f, "p[{}]/run[{}]", paragraph, run),
            Self::CellRun { cell, paragraph, run } => write!(f, "{}/p[{}]/run[{}]", cell, paragraph, run),
        }
    }
}

/// Translatable text with its location
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub id: UnitId,
    /// Text at extraction time
    pub text: String,
    /// Formatting of the source run, for run units
    pub formatting: Option<RunFormatting>,
}

impl TextUnit {
    pub fn region(&self) -> Region {
        self.id.region()
    }
}

fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Run units of one paragraph
fn push_runs(units: &mut Vec<TextUnit>, paragraph: &Paragraph, id: impl Fn(usize) -> UnitId) {
    for (index, run) in paragraph.runs().iter().enumerate() {
        if has_content(run.text()) {
            units.push(TextUnit {
                id: id(index),
                text: run.text().to_string(),
                formatting: Some(run.formatting().clone()),
            });
        }
    }
}

/// Walk the document and collect its non-empty units
///
/// Body paragraphs come first, then tables; rows top to bottom, cells left
/// to right, paragraphs and runs in order.
pub fn extract(document: &Document, granularity: Granularity) -> Vec<TextUnit> {
    let mut units = Vec::new();

    for (p, paragraph) in document.paragraphs().iter().enumerate() {
        match granularity {
            Granularity::Block => {
                let text = paragraph.text();
                if has_content(&text) {
                    units.push(TextUnit {
                        id: UnitId::Paragraph { paragraph: p },
                        text,
                        formatting: None,
                    });
                }
            }
            Granularity::Run => push_runs(&mut units, paragraph, |run| UnitId::BodyRun { paragraph: p, run }),
        }
    }

    for (t, table) in document.tables().iter().enumerate() {
        for (r, row) in table.rows().iter().enumerate() {
            for (c, cell) in row.cells().iter().enumerate() {
                let path = CellPath {
                    table: t,
                    row: r,
                    cell: c,
                };
                match granularity {
                    Granularity::Block => {
                        let text = cell.text();
                        if has_content(&text) {
                            units.push(TextUnit {
                                id: UnitId::Cell(path),
                                text,
                                formatting: None,
                            });
                        }
                    }
                    Granularity::Run => {
                        for (p, paragraph) in cell.paragraphs().iter().enumerate() {
                            push_runs(&mut units, paragraph, |run| UnitId::CellRun {
                                cell: path,
                                paragraph: p,
                                run,
                            });
                        }
                    }
                }
            }
        }
    }

    units
}
