/*!
 * Integration tests for full translation passes over documents.
 *
 * Every test drives the engine through `DocumentTranslator` with a mock
 * service; nothing touches the network.
 */

use anyhow::Result;
use std::time::Duration;

use docxlate::document::{Document, Paragraph, RunFormatting, Table, TableCell, TableRow};
use docxlate::providers::MockProvider;
use docxlate::translation::{
    ConcurrencyMode, DocumentTranslator, EngineOptions, FailureKind, Granularity, ReplacementPolicy, extract,
};

use crate::common;

const ALL_MODES: [ConcurrencyMode; 3] = [
    ConcurrencyMode::Sequential,
    ConcurrencyMode::RegionBatched,
    ConcurrencyMode::WorkerPool,
];

const ALL_POLICIES: [ReplacementPolicy; 3] = [
    ReplacementPolicy::WholeUnit,
    ReplacementPolicy::FirstRun,
    ReplacementPolicy::PerRun,
];

#[tokio::test]
async fn test_scenarioA_wholeUnit_shouldLeaveOneTranslatedRun() -> Result<()> {
    common::init_test_logging();
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::from_text("Hello world"));
    let provider = MockProvider::working().with_dictionary([("Hello world", "नमस्ते दुनिया")]);
    let translator = common::mock_translator(provider, ReplacementPolicy::WholeUnit, ConcurrencyMode::Sequential, 1);

    translator.translate(&mut doc).await?;

    let paragraph = &doc.paragraphs()[0];
    assert_eq!(paragraph.runs().len(), 1);
    assert_eq!(paragraph.runs()[0].text(), "नमस्ते दुनिया");
    Ok(())
}

#[tokio::test]
async fn test_scenarioB_perRun_shouldKeepBoldOnFirstRun() -> Result<()> {
    for mode in ALL_MODES {
        let mut doc = Document::new();
        doc.push_paragraph(common::hello_world_paragraph());
        let provider = MockProvider::working().with_dictionary([("Hello ", "नमस्ते "), ("world", "दुनिया")]);
        let translator = common::mock_translator(provider, ReplacementPolicy::PerRun, mode, 2);

        translator.translate(&mut doc).await?;

        let runs = doc.paragraphs()[0].runs();
        assert_eq!(runs.len(), 2, "mode {}", mode);
        assert_eq!(runs[0].text(), "नमस्ते ");
        assert_eq!(runs[0].formatting(), &RunFormatting::bold());
        assert_eq!(runs[1].text(), "दुनिया");
        assert!(runs[1].formatting().is_plain());
    }
    Ok(())
}

#[tokio::test]
async fn test_scenarioC_emptyCell_shouldStayEmpty() -> Result<()> {
    let mut doc = Document::new();
    doc.push_table(Table::new(vec![TableRow::new(vec![TableCell::empty(), TableCell::from_text("Total")])]));

    assert_eq!(extract(&doc, Granularity::Block).len(), 1);

    for policy in ALL_POLICIES {
        let mut doc = doc.clone();
        let translator = common::mock_translator(MockProvider::working(), policy, ConcurrencyMode::Sequential, 1);
        let report = translator.translate(&mut doc).await?;

        assert_eq!(report.units, 1, "policy {}", policy);
        let table = &doc.tables()[0];
        assert_eq!(table.cell(0, 0).map(|c| c.text()), Some(String::new()));
        assert_eq!(table.cell(0, 0).map(|c| c.paragraphs()[0].runs().len()), Some(0));
        assert_eq!(table.cell(0, 1).map(|c| c.text()), Some("[hi] Total".to_string()));
    }
    Ok(())
}

#[tokio::test]
async fn test_scenarioD_shortBatch_shouldKeepAllOriginals() -> Result<()> {
    let mut doc = common::numbered_document(3);
    let before = doc.plain_text();
    let translator = common::mock_translator(
        MockProvider::short_batch(),
        ReplacementPolicy::WholeUnit,
        ConcurrencyMode::RegionBatched,
        1,
    );

    let report = translator.translate(&mut doc).await?;

    assert_eq!(doc.plain_text(), before);
    assert_eq!(report.translated, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::BatchShapeMismatch);
    Ok(())
}

#[tokio::test]
async fn test_countPreservation_shouldHoldForEveryPolicyAndMode() -> Result<()> {
    for policy in ALL_POLICIES {
        for mode in ALL_MODES {
            let mut doc = common::mixed_document();
            let shape = doc.shape();
            let translator = common::mock_translator(MockProvider::working(), policy, mode, 3);

            translator.translate(&mut doc).await?;

            assert_eq!(doc.shape(), shape, "policy {} mode {}", policy, mode);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_failingService_shouldLeaveTextUnchanged() -> Result<()> {
    for policy in ALL_POLICIES {
        for mode in ALL_MODES {
            let mut doc = common::mixed_document();
            let before = doc.plain_text();
            let translator = common::mock_translator(MockProvider::failing(), policy, mode, 2);

            let report = translator.translate(&mut doc).await?;

            assert_eq!(doc.plain_text(), before, "policy {} mode {}", policy, mode);
            assert!(!report.is_complete());
            assert_eq!(report.translated, 0);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_regionBatched_shortBatch_shouldOnlyAffectItsRegion() -> Result<()> {
    // Body and table batches are judged separately; both come back short here
    let mut doc = common::mixed_document();
    let before = doc.plain_text();
    let translator = common::mock_translator(
        MockProvider::short_batch(),
        ReplacementPolicy::PerRun,
        ConcurrencyMode::RegionBatched,
        1,
    );
    let report = translator.translate(&mut doc).await?;
    assert_eq!(doc.plain_text(), before);
    assert_eq!(report.failures.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_perRun_formattingPreservation_shouldHoldAcrossModes() -> Result<()> {
    let source = common::mixed_document();
    let before = extract(&source, Granularity::Run);

    for mode in ALL_MODES {
        let mut doc = source.clone();
        let translator = common::mock_translator(MockProvider::working(), ReplacementPolicy::PerRun, mode, 4);
        translator.translate(&mut doc).await?;

        let after = extract(&doc, Granularity::Run);
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(&after) {
            assert_eq!(old.id, new.id);
            assert_ne!(old.text, new.text);
            assert_eq!(old.formatting, new.formatting, "mode {} unit {}", mode, old.id);
        }
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workerPool_concurrentWrites_shouldAllLand() -> Result<()> {
    // Distinct delays per call would reorder completions; the mock's slow
    // mode gives every call the same delay so tasks finish interleaved
    let mut doc = common::numbered_document(24);
    let provider = MockProvider::slow(5);
    let translator = common::mock_translator(provider.clone(), ReplacementPolicy::WholeUnit, ConcurrencyMode::WorkerPool, 6);

    let report = translator.translate(&mut doc).await?;

    assert_eq!(report.translated, 24);
    for (index, paragraph) in doc.paragraphs().iter().enumerate() {
        assert_eq!(paragraph.text(), format!("[hi] Paragraph number {}", index));
    }
    assert!(provider.max_in_flight() <= 6);
    assert!(provider.max_in_flight() >= 2);
    Ok(())
}

#[tokio::test]
async fn test_workerPool_poolSizeOne_shouldSerializeCalls() -> Result<()> {
    let mut doc = common::numbered_document(5);
    let provider = MockProvider::slow(2);
    let translator = common::mock_translator(provider.clone(), ReplacementPolicy::WholeUnit, ConcurrencyMode::WorkerPool, 1);
    translator.translate(&mut doc).await?;
    assert_eq!(provider.max_in_flight(), 1);
    assert_eq!(provider.single_calls(), 5);
    Ok(())
}

#[tokio::test]
async fn test_timeout_shouldFallBackPerUnit() -> Result<()> {
    common::init_test_logging();
    let mut doc = common::numbered_document(2);
    let before = doc.plain_text();
    let gateway = common::mock_gateway(MockProvider::slow(300)).with_timeout(Duration::from_millis(20));
    let translator = DocumentTranslator::new(
        gateway,
        EngineOptions::new(ReplacementPolicy::WholeUnit, ConcurrencyMode::WorkerPool).with_pool_size(2),
    );

    let report = translator.translate(&mut doc).await?;

    assert_eq!(doc.plain_text(), before);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.kind == FailureKind::Timeout));
    Ok(())
}

#[tokio::test]
async fn test_intermittentService_shouldTranslateTheRest() -> Result<()> {
    let mut doc = common::numbered_document(6);
    let translator = common::mock_translator(
        MockProvider::intermittent(3),
        ReplacementPolicy::WholeUnit,
        ConcurrencyMode::Sequential,
        1,
    );

    let report = translator.translate(&mut doc).await?;

    assert_eq!(report.units, 6);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.translated, 4);
    assert_eq!(doc.paragraphs()[2].text(), "Paragraph number 2");
    assert_eq!(doc.paragraphs()[3].text(), "[hi] Paragraph number 3");
    Ok(())
}

#[tokio::test]
async fn test_emptyDocument_shouldMakeNoCalls() -> Result<()> {
    for mode in ALL_MODES {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::from_text("   "));
        let provider = MockProvider::working();
        let translator = common::mock_translator(provider.clone(), ReplacementPolicy::PerRun, mode, 2);

        let report = translator.translate(&mut doc).await?;

        assert_eq!(report.units, 0);
        assert_eq!(provider.single_calls() + provider.batch_calls(), 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_firstRun_shouldBlankLaterRunsAndKeepFirstFormatting() -> Result<()> {
    let mut doc = Document::new();
    doc.push_paragraph(common::hello_world_paragraph());
    let translator = common::mock_translator(
        MockProvider::working().with_dictionary([("Hello world", "नमस्ते दुनिया")]),
        ReplacementPolicy::FirstRun,
        ConcurrencyMode::Sequential,
        1,
    );

    translator.translate(&mut doc).await?;

    let runs = doc.paragraphs()[0].runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text(), "नमस्ते दुनिया");
    assert_eq!(runs[0].formatting(), &RunFormatting::bold());
    assert_eq!(runs[1].text(), "");
    Ok(())
}

#[tokio::test]
async fn test_wholeUnit_multiParagraphCell_shouldDistributeLines() -> Result<()> {
    let mut doc = common::mixed_document();
    let translator = common::mock_translator(
        MockProvider::working().with_dictionary([("Line one\nLine two", "पंक्ति एक\nपंक्ति दो")]),
        ReplacementPolicy::WholeUnit,
        ConcurrencyMode::RegionBatched,
        1,
    );

    translator.translate(&mut doc).await?;

    let cell = doc.tables()[0].cell(1, 1).expect("cell");
    assert_eq!(cell.paragraphs()[0].text(), "पंक्ति एक");
    assert_eq!(cell.paragraphs()[1].text(), "पंक्ति दो");
    Ok(())
}

#[test]
fn test_translate_onBlockingRuntime_shouldComplete() {
    let mut doc = common::mixed_document();
    let translator = common::mock_translator(
        MockProvider::working(),
        ReplacementPolicy::PerRun,
        ConcurrencyMode::WorkerPool,
        2,
    );

    let report = tokio_test::block_on(translator.translate(&mut doc));

    let report = tokio_test::assert_ok!(report);
    assert_eq!(report.units, report.translated);
    assert_eq!(doc.paragraphs()[1].text(), "[hi] Second paragraph");
}
