/*!
 * Integration tests from package bytes to package bytes.
 */

use anyhow::Result;

use docxlate::document::DocxPackage;
use zip::CompressionMethod;
use docxlate::providers::MockProvider;
use docxlate::translation::{ConcurrencyMode, ReplacementPolicy};

use crate::common;

async fn translate_report(
    provider: MockProvider,
    policy: ReplacementPolicy,
    mode: ConcurrencyMode,
) -> Result<(DocxPackage, DocxPackage)> {
    let bytes = common::report_docx()?;
    let original = DocxPackage::from_bytes(&bytes)?;
    let mut package = original.clone();
    let translator = common::mock_translator(provider, policy, mode, 3);
    translator.translate(package.document_mut()).await?;
    let translated = DocxPackage::from_bytes(&package.to_bytes()?)?;
    Ok((original, translated))
}

#[tokio::test]
async fn test_translateReport_shouldKeepNonMainPartsIdentical() -> Result<()> {
    let (original, translated) =
        translate_report(MockProvider::working(), ReplacementPolicy::PerRun, ConcurrencyMode::WorkerPool).await?;

    for name in ["[Content_Types].xml", "_rels/.rels", "word/styles.xml", "word/media/image1.png"] {
        assert_eq!(translated.part(name), original.part(name), "part {}", name);
    }
    assert_eq!(translated.document().shape(), original.document().shape());
    assert_eq!(translated.document().paragraphs()[0].text(), "[hi] Quarterly report");
    Ok(())
}

#[tokio::test]
async fn test_translateReport_shouldKeepLayoutMarkup() -> Result<()> {
    let (_, translated) =
        translate_report(MockProvider::working(), ReplacementPolicy::WholeUnit, ConcurrencyMode::Sequential).await?;
    let xml = String::from_utf8(translated.part("word/document.xml").unwrap_or_default().to_vec())?;

    assert!(xml.contains(r#"<w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr>"#));
    assert!(xml.contains(r#"<w:tcPr><w:tcW w:w="4000" w:type="dxa"/></w:tcPr><w:p/></w:tc>"#));
    assert!(xml.contains(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#));
    assert!(xml.contains(r#"<w:gridCol w:w="4000"/>"#));
    Ok(())
}

#[tokio::test]
async fn test_translateReport_withFailingService_shouldReproduceMainPart() -> Result<()> {
    for policy in [ReplacementPolicy::WholeUnit, ReplacementPolicy::FirstRun, ReplacementPolicy::PerRun] {
        for mode in [ConcurrencyMode::Sequential, ConcurrencyMode::RegionBatched, ConcurrencyMode::WorkerPool] {
            let (original, translated) = translate_report(MockProvider::failing(), policy, mode).await?;
            assert_eq!(
                translated.part("word/document.xml"),
                original.part("word/document.xml"),
                "policy {} mode {}",
                policy,
                mode
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_translateReport_perRun_shouldKeepBoldAndSize() -> Result<()> {
    let (original, translated) =
        translate_report(MockProvider::working(), ReplacementPolicy::PerRun, ConcurrencyMode::Sequential).await?;

    let before = &original.document().paragraphs()[0].runs()[0];
    let after = &translated.document().paragraphs()[0].runs()[0];
    assert_eq!(after.formatting(), before.formatting());
    assert_eq!(after.formatting().bold, Some(true));
    assert_eq!(after.formatting().font_size_half_points, Some(32));
    Ok(())
}

const LINKED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:rPr><w:rStyle w:val="Hyperlink"/></w:rPr><w:t>the manual</w:t></w:r></w:hyperlink><w:r><w:t xml:space="preserve"> for details</w:t></w:r></w:p></w:body></w:document>"#;

#[tokio::test]
async fn test_translateLinkedParagraph_perRun_shouldTranslateInsideLink() -> Result<()> {
    let bytes = common::build_docx(&[
        ("[Content_Types].xml", common::CONTENT_TYPES.as_bytes(), CompressionMethod::Deflated),
        ("_rels/.rels", common::ROOT_RELS.as_bytes(), CompressionMethod::Deflated),
        ("word/document.xml", LINKED_XML.as_bytes(), CompressionMethod::Deflated),
    ])?;
    let mut package = DocxPackage::from_bytes(&bytes)?;
    let translator = common::mock_translator(
        MockProvider::working().with_dictionary([("the manual", "पुस्तिका")]),
        ReplacementPolicy::PerRun,
        ConcurrencyMode::WorkerPool,
        2,
    );

    let report = translator.translate(package.document_mut()).await?;

    assert_eq!(report.units, 3);
    let reopened = DocxPackage::from_bytes(&package.to_bytes()?)?;
    let xml = String::from_utf8(reopened.part("word/document.xml").unwrap_or_default().to_vec())?;
    assert!(xml.contains(r#"<w:hyperlink r:id="rId5"><w:r><w:rPr><w:rStyle w:val="Hyperlink"/></w:rPr><w:t xml:space="preserve">पुस्तिका</w:t></w:r></w:hyperlink>"#));
    assert!(!xml.contains("the manual"));
    Ok(())
}

#[tokio::test]
async fn test_translateLinkedParagraph_wholeUnit_shouldIncludeLinkText() -> Result<()> {
    let mut document = docxlate::document::Document::from_xml(LINKED_XML)?;
    let translator = common::mock_translator(
        MockProvider::working(),
        ReplacementPolicy::WholeUnit,
        ConcurrencyMode::Sequential,
        1,
    );

    translator.translate(&mut document).await?;

    assert_eq!(document.paragraphs()[0].text(), "[hi] See the manual for details");
    Ok(())
}
