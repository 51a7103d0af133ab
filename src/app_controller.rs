use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::document::DocxPackage;
use crate::file_utils::FileManager;
use crate::providers::Provider;
use crate::translation::{DocumentTranslator, EngineOptions, TranslationGateway, TranslationReport};

// @module: Application controller for document translation

/// Outcome of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Engine bound to the configured service
    translator: DocumentTranslator,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let gateway = TranslationGateway::from_config(&config)?;
        Ok(Self::assemble(config, gateway))
    }

    /// Create a controller over a given service client
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Result<Self> {
        config.validate()?;
        let gateway = TranslationGateway::with_provider(&config, provider)?;
        Ok(Self::assemble(config, gateway))
    }

    fn assemble(config: Config, gateway: TranslationGateway) -> Self {
        let options = EngineOptions::from_config(&config);
        debug!("Engine options: {:?}", options);
        Self {
            translator: DocumentTranslator::new(gateway, options),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn translator(&self) -> &DocumentTranslator {
        &self.translator
    }

    /// Check that the configured service answers
    pub async fn test_connection(&self) -> Result<()> {
        self.translator.gateway().test_connection().await
    }

    /// Translate a document held in memory and return the new package bytes
    pub async fn translate_bytes(&self, bytes: &[u8]) -> Result<(Vec<u8>, TranslationReport)> {
        self.translate_bytes_with_progress(bytes, None).await
    }

    async fn translate_bytes_with_progress(
        &self,
        bytes: &[u8],
        progress_bar: Option<&ProgressBar>,
    ) -> Result<(Vec<u8>, TranslationReport)> {
        let mut package = DocxPackage::from_bytes(bytes).context("Failed to read document")?;

        let report = self
            .translator
            .translate_with_progress(package.document_mut(), |done, total| {
                if let Some(pb) = progress_bar {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                }
            })
            .await
            .context("Translation failed")?;

        let output = package.to_bytes().context("Failed to write document")?;
        Ok((output, report))
    }

    /// Where the translation of `input_file` is written
    pub fn output_path(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        let target = self.translator.gateway().target_language();
        FileManager::generate_output_path(input_file, output_dir, target.code(), "docx")
    }

    /// Translate one file into `output_dir`
    ///
    /// Returns `None` when the output already exists and `force_overwrite`
    /// is not set.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<Option<TranslationReport>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<TranslationReport>> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(output_dir)?;

        let output_path = self.output_path(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let bytes = FileManager::read_bytes(input_file)?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::bar_style("units"));
        progress_bar.set_message("Translating");

        let result = self.translate_bytes_with_progress(&bytes, Some(&progress_bar)).await;
        progress_bar.finish_and_clear();
        let (translated, report) =
            result.with_context(|| format!("Failed to translate {:?}", input_file))?;

        FileManager::write_atomic(&output_path, &translated)?;

        if !report.is_complete() {
            warn!(
                "{} service calls fell back to the original text, {} units left unchanged",
                report.failures.len(),
                report.unchanged
            );
        }
        info!(
            "Success: {} ({} of {} units translated in {})",
            output_path.display(),
            report.translated,
            report.units,
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(report))
    }

    /// Translate every document below `input_dir`, writing each output next
    /// to its source
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir)?;
        if documents.is_empty() {
            return Err(anyhow!("No .docx files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(documents.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();
        for document in &documents {
            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match document.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            match self
                .run_with_progress(document, &output_dir, &multi_progress, force_overwrite)
                .await
            {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.errors += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
