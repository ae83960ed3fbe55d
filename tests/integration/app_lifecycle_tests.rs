/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use indicatif::MultiProgress;
use std::fs;
use xliffwai::app_config::Config;
use xliffwai::app_controller::{Controller, FileOutcome, FolderSummary, ISSUES_LOG_FILE};
use xliffwai::providers::mock::MockProvider;
use xliffwai::xliff::Document;
use crate::common::mock_providers::{FailOnTextTranslator, WordSuffixTranslator};
use crate::common;

fn test_config(target_language: &str) -> Config {
    let mut config = Config::default();
    config.target_language = target_language.to_string();
    config
}

/// A single file is written next to the input with the target language in its name
#[tokio::test]
async fn test_runWithTranslator_withSingleFile_shouldWriteOutputNextToInput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_xliff(temp_dir.path(), "messages.xlf")?;
    let controller = Controller::with_config(test_config("de"))?;

    let outcome = controller
        .run_with_translator(&MockProvider::working(), &input, None, false, &MultiProgress::new())
        .await?;

    let expected_path = temp_dir.path().join("messages.de.xlf");
    match outcome {
        FileOutcome::Translated { output_path, report } => {
            assert_eq!(output_path, expected_path);
            assert_eq!(report.translated, 3);
        }
        other => panic!("expected a translation, got {:?}", other),
    }

    let output = fs::read_to_string(&expected_path)?;
    assert!(output.contains("<target>[de] Hello world</target>"));
    Document::parse(&output)?;

    // The input is never modified
    assert_eq!(fs::read_to_string(&input)?, common::SAMPLE_XLIFF);
    Ok(())
}

/// The config's ignore list is honoured by the controller
#[tokio::test]
async fn test_runWithTranslator_withConfiguredIgnoreList_shouldSkipUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_xliff(temp_dir.path(), "messages.xlf")?;
    let mut config = test_config("fr");
    config.ignore_list = vec!["brand".to_string()];
    let controller = Controller::with_config(config)?;
    let output_path = temp_dir.path().join("out/translated.xlf");

    controller
        .run_with_translator(&WordSuffixTranslator, &input, Some(output_path.clone()), false, &MultiProgress::new())
        .await?;

    let output = fs::read_to_string(&output_path)?;
    assert!(output.contains("<target>Hello_TRANSLATED world_TRANSLATED</target>"));
    assert_eq!(output.matches("<target>").count(), 2);
    Ok(())
}

/// Existing outputs are kept unless overwriting is forced
#[tokio::test]
async fn test_runWithTranslator_withExistingOutput_shouldRespectForceFlag() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_xliff(temp_dir.path(), "messages.xlf")?;
    let existing = common::create_test_file(temp_dir.path(), "messages.fr.xlf", "keep me")?;
    let controller = Controller::with_config(test_config("fr"))?;
    let translator = MockProvider::working();

    let outcome = controller
        .run_with_translator(&translator, &input, None, false, &MultiProgress::new())
        .await?;
    assert_eq!(outcome, FileOutcome::Skipped { output_path: existing.clone() });
    assert_eq!(fs::read_to_string(&existing)?, "keep me");
    assert_eq!(translator.request_count(), 0);

    controller
        .run_with_translator(&translator, &input, None, true, &MultiProgress::new())
        .await?;
    assert!(fs::read_to_string(&existing)?.contains("<target>[fr] Goodbye</target>"));
    Ok(())
}

/// A failed translation leaves no output file behind
#[tokio::test]
async fn test_runWithTranslator_withFailingUnit_shouldNotWriteOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_xliff(temp_dir.path(), "messages.xlf")?;
    let controller = Controller::with_config(test_config("fr"))?;

    let result = controller
        .run_with_translator(&FailOnTextTranslator::new("Acme"), &input, None, false, &MultiProgress::new())
        .await;

    let error = result.unwrap_err();
    assert!(format!("{:#}", error).contains("brand"));
    assert!(!temp_dir.path().join("messages.fr.xlf").exists());
    Ok(())
}

/// Missing input files are reported
#[test]
fn test_runWithTranslator_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(test_config("fr"))?;
    let missing = temp_dir.path().join("absent.xlf");

    let result = tokio_test::block_on(async {
        controller
            .run_with_translator(&MockProvider::working(), &missing, None, false, &MultiProgress::new())
            .await
    });

    assert!(result.is_err());
    assert!(!temp_dir.path().join("absent.fr.xlf").exists());
    Ok(())
}

/// Folder mode processes every file, keeps going after a failure and logs it
#[tokio::test]
async fn test_runFolderWithTranslator_withMixedFiles_shouldContinueAfterFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_xliff(root, "app.xlf")?;
    common::create_test_file(root, "nested/broken.xliff", "<xliff><file></xliff>")?;
    common::create_test_xliff(root, "nested/admin.xlf")?;
    common::create_test_file(root, "notes.txt", "not xliff")?;
    let controller = Controller::with_config(test_config("es"))?;

    let summary = controller
        .run_folder_with_translator(&MockProvider::working(), root, false)
        .await?;

    assert_eq!(summary, FolderSummary { processed: 2, skipped: 0, failed: 1 });
    assert!(root.join("app.es.xlf").exists());
    assert!(root.join("nested/admin.es.xlf").exists());
    assert!(!root.join("nested/broken.es.xliff").exists());

    let issues = fs::read_to_string(root.join(ISSUES_LOG_FILE))?;
    assert!(issues.contains("broken.xliff"));

    // Second run skips the existing outputs and ignores them as inputs
    let again = controller
        .run_folder_with_translator(&MockProvider::working(), root, false)
        .await?;
    assert_eq!(again.processed, 0);
    assert_eq!(again.skipped, 2);
    assert_eq!(again.failed, 1);
    Ok(())
}

/// An empty folder is an error
#[tokio::test]
async fn test_runFolderWithTranslator_withNoXliffFiles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.md", "# nothing")?;
    let controller = Controller::with_config(test_config("fr"))?;

    let result = controller
        .run_folder_with_translator(&MockProvider::working(), temp_dir.path(), false)
        .await;

    assert!(result.is_err());
    Ok(())
}

/// Units that already carry a target are left alone when configured so
#[tokio::test]
async fn test_controller_withKeepExistingTargets_shouldLeaveTranslatedUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "partial.xlf",
        r#"<xliff version="1.2"><file><body>
<trans-unit id="a"><source>One</source><target>Uno</target></trans-unit>
<trans-unit id="b"><source>Two</source></trans-unit>
</body></file></xliff>"#,
    )?;
    let mut config = test_config("it");
    config.xliff.keep_existing_targets = true;
    config.xliff.max_concurrent_requests = Some(1);
    let controller = Controller::with_config(config)?;
    let translator = MockProvider::working();

    controller
        .run_with_translator(&translator, &input, None, false, &MultiProgress::new())
        .await?;

    let output = fs::read_to_string(temp_dir.path().join("partial.it.xlf"))?;
    assert!(output.contains("<target>Uno</target>"));
    assert!(output.contains("<target>[it] Two</target>"));
    assert_eq!(translator.request_count(), 1);
    Ok(())
}
