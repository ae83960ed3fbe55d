use anyhow::{Result, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::{TranslationService, Translator};
use crate::xliff::{self, Document, MergeReport};

/// Name of the log file written next to processed folders
pub const ISSUES_LOG_FILE: &str = "xliffwai.issues.log";

/// What happened to a single input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was translated and written to the given path
    Translated { output_path: PathBuf, report: MergeReport },
    /// The output already existed and overwriting was not requested
    Skipped { output_path: PathBuf },
}

/// Summary of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for XLIFF translation
pub struct Controller {
    config: Config,
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Configuration the controller runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate a single file with the configured provider.
    ///
    /// `output_path` defaults to `<stem>.<target>.<ext>` next to the input.
    pub async fn run(&self, input_file: PathBuf, output_path: Option<PathBuf>, force_overwrite: bool) -> Result<FileOutcome> {
        let service = self.translation_service()?;
        let multi_progress = MultiProgress::new();
        let outcome = self.run_with_translator(&service, &input_file, output_path, force_overwrite, &multi_progress).await?;
        self.log_usage(&service);
        Ok(outcome)
    }

    /// Translate every XLIFF file under a directory with the configured provider.
    ///
    /// A failing file is logged and recorded in the issues log; the remaining
    /// files are still processed.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let service = self.translation_service()?;
        let summary = self.run_folder_with_translator(&service, &input_dir, force_overwrite).await?;
        self.log_usage(&service);
        Ok(summary)
    }

    fn translation_service(&self) -> Result<TranslationService> {
        TranslationService::new(self.config.translation.clone())
    }

    fn log_usage(&self, service: &TranslationService) {
        let usage = service.usage();
        if usage.requests > 0 {
            info!("{}", usage.summary());
        }
        let (hits, misses, hit_rate) = service.cache.stats();
        debug!("Translation cache: {} hits, {} misses ({:.0}% hit rate)", hits, misses, hit_rate * 100.0);
    }

    /// Translate a single file with any translator
    pub async fn run_with_translator<T>(
        &self,
        translator: &T,
        input_file: &Path,
        output_path: Option<PathBuf>,
        force_overwrite: bool,
        multi_progress: &MultiProgress,
    ) -> Result<FileOutcome>
    where
        T: Translator + ?Sized,
    {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_path.unwrap_or_else(|| {
            let output_dir = input_file.parent().unwrap_or(Path::new("."));
            FileManager::generate_output_path(input_file, output_dir, &self.config.target_language)
        });

        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(FileOutcome::Skipped { output_path });
        }

        let content = FileManager::read_to_string(input_file)?;
        let (translated, report) = self.translate_content(translator, &content, multi_progress).await?;

        FileManager::write_atomic(&output_path, &translated)?;

        info!(
            "Translated {} of {} units in {} -> {}",
            report.translated,
            report.total(),
            format_duration(start_time.elapsed()),
            output_path.display()
        );
        if report.ignored + report.kept_existing > 0 {
            debug!("{} units ignored, {} existing targets kept", report.ignored, report.kept_existing);
        }

        Ok(FileOutcome::Translated { output_path, report })
    }

    /// Translate every XLIFF file under `input_dir` with any translator
    pub async fn run_folder_with_translator<T>(&self, translator: &T, input_dir: &Path, force_overwrite: bool) -> Result<FolderSummary>
    where
        T: Translator + ?Sized,
    {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_xliff_files(input_dir, &self.config.target_language)?;
        if files.is_empty() {
            return Err(anyhow!("No XLIFF files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        folder_pb.set_style(progress_style("files"));
        folder_pb.set_message("Processing files");

        let issues_log = input_dir.join(ISSUES_LOG_FILE);
        let mut summary = FolderSummary::default();

        for file in &files {
            let file_name = file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.run_with_translator(translator, file, None, force_overwrite, &multi_progress).await {
                Ok(FileOutcome::Translated { .. }) => summary.processed += 1,
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                    let entry = format!("ERROR {}: {:#}", file.display(), e);
                    if let Err(log_err) = FileManager::append_to_log_file(&issues_log, &entry) {
                        warn!("Failed to write to {}: {}", issues_log.display(), log_err);
                    }
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.failed
        );
        info!("{} in {}", summary_message, format_duration(start_time.elapsed()));

        if summary.failed > 0 {
            info!("Failures recorded in {}", issues_log.display());
        }

        Ok(summary)
    }

    /// Parse, translate and serialize one document, showing a unit progress bar
    async fn translate_content<T>(&self, translator: &T, content: &str, multi_progress: &MultiProgress) -> Result<(String, MergeReport)>
    where
        T: Translator + ?Sized,
    {
        let mut document = Document::parse(content)?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(progress_style("texts"));

        let options = self.config.translate_options();
        let result = xliff::translate_document(
            &mut document,
            translator,
            &self.config.source_language,
            &self.config.target_language,
            &self.config.ignore_list,
            &options,
            &|completed: usize, total: usize| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(completed as u64);
            },
        )
        .await;

        match result {
            Ok(report) => {
                progress_bar.finish_and_clear();
                Ok((document.serialize(), report))
            }
            Err(e) => {
                progress_bar.abandon();
                Err(e.into())
            }
        }
    }
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

/// Format duration in a human-readable format
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
