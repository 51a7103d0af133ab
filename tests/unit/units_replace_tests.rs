/*!
 * Tests for unit extraction and write-back on parsed documents
 */

use anyhow::Result;
use std::collections::HashSet;

use docxlate::document::DocxPackage;
use docxlate::translation::{Granularity, Region, ReplacementPolicy, UnitId, apply, extract};

use crate::common;

fn report() -> Result<DocxPackage> {
    Ok(DocxPackage::from_bytes(&common::report_docx()?)?)
}

#[test]
fn test_extract_report_blockGranularity_shouldFollowDocumentOrder() -> Result<()> {
    let package = report()?;
    let units = extract(package.document(), Granularity::Block);
    let ids: Vec<String> = units.iter().map(|u| u.id.to_string()).collect();
    assert_eq!(ids, vec!["p[0]", "p[1]", "t[0]/r[0]/c[1]", "t[0]/r[1]/c[0]", "t[0]/r[1]/c[1]"]);

    let regions: Vec<Region> = units.iter().map(|u| u.region()).collect();
    assert_eq!(regions[..2], [Region::Body, Region::Body]);
    assert!(regions[2..].iter().all(|r| *r == Region::Table));
    Ok(())
}

#[test]
fn test_extract_emptyCell_shouldNotYieldUnit() -> Result<()> {
    let package = report()?;
    for granularity in [Granularity::Block, Granularity::Run] {
        let units = extract(package.document(), granularity);
        assert!(units.iter().all(|u| !matches!(
            u.id,
            UnitId::Cell(path) | UnitId::CellRun { cell: path, .. } if path.row == 0 && path.cell == 0
        )));
    }
    Ok(())
}

#[test]
fn test_extract_runGranularity_shouldGiveDisjointIds() -> Result<()> {
    let doc = common::mixed_document();
    let units = extract(&doc, Granularity::Run);
    let ids: HashSet<UnitId> = units.iter().map(|u| u.id).collect();
    assert_eq!(ids.len(), units.len());
    assert!(units.iter().all(|u| u.id.granularity() == Granularity::Run));
    Ok(())
}

#[test]
fn test_apply_perRun_onParsedRuns_shouldKeepEveryFormattingAttribute() -> Result<()> {
    let mut package = report()?;
    let units = extract(package.document(), Granularity::Run);
    let before: Vec<_> = units.iter().map(|u| u.formatting.clone()).collect();

    for unit in &units {
        apply(package.document_mut(), unit, &format!("[hi] {}", unit.text), ReplacementPolicy::PerRun)?;
    }

    let after = extract(package.document(), Granularity::Run);
    assert_eq!(after.len(), units.len());
    for (unit, formatting) in after.iter().zip(before) {
        assert!(unit.text.starts_with("[hi] "));
        assert_eq!(unit.formatting, formatting);
    }
    Ok(())
}

#[test]
fn test_apply_perRun_shouldKeepRunPropertiesInXml() -> Result<()> {
    let mut package = report()?;
    let units = extract(package.document(), Granularity::Run);
    let hello = units.iter().find(|u| u.text == "Hello ").expect("bold run");
    apply(package.document_mut(), hello, "नमस्ते", ReplacementPolicy::PerRun)?;

    let bytes = package.to_bytes()?;
    let reopened = DocxPackage::from_bytes(&bytes)?;
    let xml = String::from_utf8(reopened.part("word/document.xml").unwrap_or_default().to_vec())?;
    assert!(xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">नमस्ते </w:t>"#));
    assert!(xml.contains(r#"<w:rPr><w:i/><w:color w:val="FF0000"/></w:rPr><w:t>world</w:t>"#));
    Ok(())
}
