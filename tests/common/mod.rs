/*!
 * Common test utilities for the docxlate test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use docxlate::app_config::Config;
use docxlate::document::{Document, Paragraph, Run, RunFormatting, Table, TableCell, TableRow};
use docxlate::language_utils::{SourceLanguage, TargetLanguage};
use docxlate::providers::MockProvider;
use docxlate::translation::{
    ConcurrencyMode, DocumentTranslator, EngineOptions, ReplacementPolicy, TranslationGateway,
};

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

pub const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style></w:styles>"#;

/// Bytes that stand in for an embedded image
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1, 2, 3, 255];

/// Main part of a small report: a heading, a paragraph with mixed
/// formatting, a blank paragraph and a two-row table with one empty cell
pub const REPORT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t>Quarterly report</w:t></w:r></w:p><w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr><w:i/><w:color w:val="FF0000"/></w:rPr><w:t>world</w:t></w:r></w:p><w:p/><w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid><w:gridCol w:w="4000"/><w:gridCol w:w="4000"/></w:tblGrid><w:tr><w:tc><w:tcPr><w:tcW w:w="4000" w:type="dxa"/></w:tcPr><w:p/></w:tc><w:tc><w:p><w:r><w:t>Total</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>Revenue</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>42</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#;

/// Routes library logs to the test output; safe to call more than once
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Builds a package from named parts, the way Word lays them out
pub fn build_docx(parts: &[(&str, &[u8], CompressionMethod)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, method) in parts {
        zip.start_file(*name, SimpleFileOptions::default().compression_method(*method))?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// A complete report package with styles and an image
pub fn report_docx() -> Result<Vec<u8>> {
    build_docx(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes(), CompressionMethod::Deflated),
        ("_rels/.rels", ROOT_RELS.as_bytes(), CompressionMethod::Deflated),
        ("word/document.xml", REPORT_XML.as_bytes(), CompressionMethod::Deflated),
        ("word/styles.xml", STYLES.as_bytes(), CompressionMethod::Deflated),
        ("word/media/image1.png", IMAGE_BYTES, CompressionMethod::Stored),
    ])
}

/// Writes the report package to `dir/name`
pub fn write_report(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, report_docx()?)?;
    Ok(path)
}

/// Paragraph "Hello " (bold) + "world" (plain)
pub fn hello_world_paragraph() -> Paragraph {
    Paragraph::with_runs(vec![Run::styled("Hello ", RunFormatting::bold()), Run::new("world")])
}

/// A document with body paragraphs and one table
pub fn mixed_document() -> Document {
    let mut doc = Document::new();
    doc.push_paragraph(hello_world_paragraph());
    doc.push_paragraph(Paragraph::from_text("Second paragraph"));
    doc.push_paragraph(Paragraph::new());
    doc.push_table(Table::new(vec![
        TableRow::new(vec![TableCell::empty(), TableCell::from_text("Total")]),
        TableRow::new(vec![
            TableCell::from_text("Revenue"),
            TableCell::new(vec![Paragraph::from_text("Line one"), Paragraph::from_text("Line two")]),
        ]),
    ]));
    doc
}

/// A document of `count` distinct paragraphs
pub fn numbered_document(count: usize) -> Document {
    let mut doc = Document::new();
    for index in 0..count {
        doc.push_paragraph(Paragraph::from_text(format!("Paragraph number {}", index)));
    }
    doc
}

/// Gateway over a mock service translating from English to Hindi
pub fn mock_gateway(provider: MockProvider) -> TranslationGateway {
    TranslationGateway::new(
        Arc::new(provider),
        SourceLanguage::Fixed("en".to_string()),
        TargetLanguage::Hindi,
    )
}

/// Translator over a mock service
pub fn mock_translator(
    provider: MockProvider,
    policy: ReplacementPolicy,
    mode: ConcurrencyMode,
    pool_size: usize,
) -> DocumentTranslator {
    DocumentTranslator::new(
        mock_gateway(provider),
        EngineOptions::new(policy, mode).with_pool_size(pool_size),
    )
}

/// Default configuration with the given engine settings
pub fn engine_config(policy: ReplacementPolicy, mode: ConcurrencyMode) -> Config {
    let mut config = Config::default();
    config.engine.policy = policy;
    config.engine.mode = mode;
    config
}
