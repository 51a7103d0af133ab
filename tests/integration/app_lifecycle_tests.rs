/*!
 * Tests for the application controller on temporary directories
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use docxlate::app_controller::{Controller, FolderSummary};
use docxlate::document::DocxPackage;
use docxlate::providers::MockProvider;
use docxlate::translation::{ConcurrencyMode, ReplacementPolicy};

use crate::common;

fn controller(provider: MockProvider) -> Result<Controller> {
    let config = common::engine_config(ReplacementPolicy::PerRun, ConcurrencyMode::WorkerPool);
    Controller::with_provider(config, Arc::new(provider))
}

#[tokio::test]
async fn test_translateBytes_shouldReturnTranslatedPackage() -> Result<()> {
    let controller = controller(MockProvider::working())?;
    let (bytes, report) = controller.translate_bytes(&common::report_docx()?).await?;

    assert_eq!(report.units, 6);
    assert!(report.is_complete());
    let package = DocxPackage::from_bytes(&bytes)?;
    assert_eq!(package.document().paragraphs()[1].runs()[1].text(), "[hi] world");
    Ok(())
}

#[tokio::test]
async fn test_translateBytes_withGarbage_shouldFail() -> Result<()> {
    let controller = controller(MockProvider::working())?;
    assert!(controller.translate_bytes(b"not a zip").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_shouldWriteOutputNextToTarget() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::write_report(dir.path(), "report.docx")?;
    let out_dir = dir.path().join("out");
    let controller = controller(MockProvider::working())?;

    let report = controller.run(input.clone(), out_dir.clone(), false).await?;

    assert!(report.is_some());
    let output = out_dir.join("report.hi.docx");
    assert!(output.exists());
    let package = DocxPackage::open(&output)?;
    assert_eq!(package.document().paragraphs()[0].text(), "[hi] Quarterly report");
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::write_report(dir.path(), "report.docx")?;
    let output = dir.path().join("report.hi.docx");
    fs::write(&output, b"previous")?;
    let controller = controller(MockProvider::working())?;

    let skipped = controller.run(input.clone(), dir.path().to_path_buf(), false).await?;
    assert!(skipped.is_none());
    assert_eq!(fs::read(&output)?, b"previous");

    let forced = controller.run(input, dir.path().to_path_buf(), true).await?;
    assert!(forced.is_some());
    assert!(DocxPackage::open(&output).is_ok());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = controller(MockProvider::working())?;
    let result = controller
        .run(dir.path().join("missing.docx"), dir.path().to_path_buf(), false)
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_shouldSkipLockFilesAndPreviousOutputs() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested)?;
    common::write_report(dir.path(), "a.docx")?;
    common::write_report(&nested, "b.docx")?;
    common::write_report(dir.path(), "c.hi.docx")?;
    fs::write(dir.path().join("~$a.docx"), b"lock")?;
    fs::write(dir.path().join("broken.docx"), b"not a zip")?;

    let provider = MockProvider::working();
    let controller = controller(provider.clone())?;
    let summary = controller.run_folder(dir.path().to_path_buf(), false).await?;

    assert_eq!(
        summary,
        FolderSummary {
            processed: 2,
            skipped: 0,
            errors: 1,
        }
    );
    assert!(dir.path().join("a.hi.docx").exists());
    assert!(nested.join("b.hi.docx").exists());
    assert!(!dir.path().join("c.hi.hi.docx").exists());

    let again = controller.run_folder(dir.path().to_path_buf(), false).await?;
    assert_eq!(again.skipped, 2);
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withoutDocuments_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    fs::write(dir.path().join("notes.txt"), b"hello")?;
    let controller = controller(MockProvider::working())?;
    assert!(controller.run_folder(dir.path().to_path_buf(), false).await.is_err());
    Ok(())
}
