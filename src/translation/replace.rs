/*!
 * Replacement engine.
 *
 * Writes a translated unit back to the exact location recorded in its
 * identity. Three policies trade formatting fidelity against translation
 * context:
 *
 * - `WholeUnit`: the unit's runs are replaced by one plain run
 * - `FirstRun`: the first run takes the whole text, later runs are blanked
 * - `PerRun`: each run is translated and written on its own
 *
 * Run formatting is never touched; only run text (and for `WholeUnit` the
 * run count) changes. Paragraph, table, row and cell counts never change.
 */

use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::{CellPath, Granularity, TextUnit, UnitId};
use crate::document::{Document, Paragraph, Run, TableCell};
use crate::errors::TranslationError;

/// How translated text replaces the source runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Clear the unit's runs and append one run with the translation
    WholeUnit,
    /// Overwrite the first run, blank the rest
    FirstRun,
    /// Replace each run's text on its own
    #[default]
    PerRun,
}

impl ReplacementPolicy {
    /// Extraction granularity this policy consumes
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::WholeUnit | Self::FirstRun => Granularity::Block,
            Self::PerRun => Granularity::Run,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeUnit => "whole_unit",
            Self::FirstRun => "first_run",
            Self::PerRun => "per_run",
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Put the source's leading and trailing whitespace back around a translation
///
/// Services trim their input, which would glue neighbouring runs together.
pub fn restore_edges(source: &str, translated: &str) -> String {
    let leading = &source[..source.len() - source.trim_start().len()];
    let trailing = &source[source.trim_end().len()..];
    format!("{}{}{}", leading, translated.trim(), trailing)
}

fn violation(unit: &TextUnit, reason: impl Into<String>) -> TranslationError {
    TranslationError::StructuralIntegrity {
        unit: unit.id.to_string(),
        reason: reason.into(),
    }
}

fn ensure_unchanged(unit: &TextUnit, current: &str) -> Result<(), TranslationError> {
    if current == unit.text {
        Ok(())
    } else {
        Err(violation(unit, "source text changed since extraction"))
    }
}

fn cell_mut<'a>(document: &'a mut Document, unit: &TextUnit, path: CellPath) -> Result<&'a mut TableCell, TranslationError> {
    document
        .tables_mut()
        .get_mut(path.table)
        .and_then(|table| table.cell_mut(path.row, path.cell))
        .ok_or_else(|| violation(unit, "cell does not exist"))
}

fn run_mut<'a>(paragraph: Option<&'a mut Paragraph>, unit: &TextUnit, run: usize) -> Result<&'a mut Run, TranslationError> {
    paragraph
        .ok_or_else(|| violation(unit, "paragraph does not exist"))?
        .runs_mut()
        .get_mut(run)
        .ok_or_else(|| violation(unit, "run does not exist"))
}

/// Write one translated unit back into the document
///
/// Fails with `StructuralIntegrity` when the unit's path no longer resolves
/// or its node no longer holds the extracted text, and with
/// `PolicyMismatch` when the unit was extracted for another policy.
pub fn apply(
    document: &mut Document,
    unit: &TextUnit,
    translated: &str,
    policy: ReplacementPolicy,
) -> Result<(), TranslationError> {
    if unit.id.granularity() != policy.granularity() {
        return Err(TranslationError::PolicyMismatch {
            unit: unit.id.to_string(),
            policy: policy.to_string(),
        });
    }

    let text = restore_edges(&unit.text, translated);
    trace!("Writing {} with {}", unit.id, policy);

    match unit.id {
        UnitId::Paragraph { paragraph } => {
            let paragraph = document
                .paragraphs_mut()
                .get_mut(paragraph)
                .ok_or_else(|| violation(unit, "paragraph does not exist"))?;
            ensure_unchanged(unit, &paragraph.text())?;
            match policy {
                ReplacementPolicy::WholeUnit => replace_whole(paragraph, &text),
                _ => overwrite_first_run(paragraph, &text),
            }
        }
        UnitId::Cell(path) => {
            let cell = cell_mut(document, unit, path)?;
            ensure_unchanged(unit, &cell.text())?;
            match policy {
                ReplacementPolicy::WholeUnit => replace_whole_cell(cell, &text),
                _ => overwrite_first_run_cell(cell, &text),
            }
        }
        UnitId::BodyRun { paragraph, run } => {
            let run = run_mut(document.paragraphs_mut().get_mut(paragraph), unit, run)?;
            ensure_unchanged(unit, run.text())?;
            run.set_text(text);
        }
        UnitId::CellRun { cell, paragraph, run } => {
            let cell = cell_mut(document, unit, cell)?;
            let run = run_mut(cell.paragraphs_mut().get_mut(paragraph), unit, run)?;
            ensure_unchanged(unit, run.text())?;
            run.set_text(text);
        }
    }

    Ok(())
}

fn replace_whole(paragraph: &mut Paragraph, text: &str) {
    paragraph.clear();
    if !text.is_empty() {
        paragraph.add_run(Run::new(text));
    }
}

fn overwrite_first_run(paragraph: &mut Paragraph, text: &str) {
    if paragraph.runs().is_empty() {
        if !text.is_empty() {
            paragraph.add_run(Run::new(text));
        }
        return;
    }
    for (index, run) in paragraph.runs_mut().iter_mut().enumerate() {
        run.set_text(if index == 0 { text } else { "" });
    }
}

/// Lines of a translation when they map one-to-one onto the cell paragraphs
fn distributed_lines<'a>(cell: &TableCell, text: &'a str) -> Option<Vec<&'a str>> {
    let lines: Vec<&str> = text.split('\n').collect();
    (lines.len() == cell.paragraphs().len()).then_some(lines)
}

fn replace_whole_cell(cell: &mut TableCell, text: &str) {
    if let Some(lines) = distributed_lines(cell, text) {
        for (paragraph, line) in cell.paragraphs_mut().iter_mut().zip(lines) {
            replace_whole(paragraph, line);
        }
        return;
    }

    let paragraphs = cell.paragraphs_mut();
    for paragraph in paragraphs.iter_mut() {
        paragraph.clear();
    }
    if let Some(first) = paragraphs.first_mut() {
        first.add_run(Run::new(text));
    }
}

fn overwrite_first_run_cell(cell: &mut TableCell, text: &str) {
    if let Some(lines) = distributed_lines(cell, text) {
        for (paragraph, line) in cell.paragraphs_mut().iter_mut().zip(lines) {
            overwrite_first_run(paragraph, line);
        }
        return;
    }

    let mut written = false;
    for paragraph in cell.paragraphs_mut() {
        for run in paragraph.runs_mut() {
            if written {
                run.set_text("");
            } else {
                run.set_text(text);
                written = true;
            }
        }
    }
    if !written {
        if let Some(first) = cell.paragraphs_mut().first_mut() {
            first.add_run(Run::new(text));
        }
    }
}
