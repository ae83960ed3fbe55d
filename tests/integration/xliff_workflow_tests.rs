/*!
 * End-to-end XLIFF translation tests
 */

use anyhow::Result;
use xliffwai::errors::{TranslationError, XliffError};
use xliffwai::providers::mock::MockProvider;
use xliffwai::xliff::{self, Document, TranslateOptions};
use crate::common::mock_providers::{FailOnTextTranslator, RecordingTranslator, WordSuffixTranslator};
use crate::common;

const ANGULAR_INPUT: &str = r#"
            <?xml version="1.0" encoding="UTF-8" ?>
            <xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
                <file source-language="en" datatype="plaintext" original="ng2.template">
                    <body>
                        <trans-unit id="introductionHeader" datatype="html">
                            <source>Hello i18n!</source>
                            <context-group purpose="location">
                                <context context-type="sourcefile">app\app.component.ts</context>
                                <context context-type="linenumber">4</context>
                            </context-group>
                            <note priority="1" from="description">An introduction header for this sample</note>
                            <note priority="1" from="meaning">User welcome</note>
                        </trans-unit>
                    </body>
                </file>
            </xliff>
        "#;

const ANGULAR_EXPECTED: &str = r#"
            <?xml version="1.0" encoding="UTF-8" ?>
            <xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
                <file source-language="en" datatype="plaintext" original="ng2.template">
                    <body>
                        <trans-unit id="introductionHeader" datatype="html">
                            <source>Hello i18n!</source>
                            <target>Hello_TRANSLATED i18n!_TRANSLATED</target>
                            <context-group purpose="location">
                                <context context-type="sourcefile">app\app.component.ts</context>
                                <context context-type="linenumber">4</context>
                            </context-group>
                            <note priority="1" from="description">An introduction header for this sample</note>
                            <note priority="1" from="meaning">User welcome</note>
                        </trans-unit>
                    </body>
                </file>
            </xliff>
        "#;

/// The Angular i18n sample gets a target right after its source and nothing else changes
#[tokio::test]
async fn test_translate_withAngularSample_shouldMatchExpectedDocument() -> Result<()> {
    let output = xliff::translate(
        &WordSuffixTranslator,
        ANGULAR_INPUT,
        "from",
        "to",
        &[],
        &TranslateOptions::default(),
    )
    .await?;

    let actual = Document::parse(&output)?;
    let expected = Document::parse(ANGULAR_EXPECTED)?;
    assert!(actual.structurally_eq(&expected), "unexpected output:\n{}", output);

    // The new element is lined up with <source>
    assert!(output.contains(
        "<source>Hello i18n!</source>\n                            <target>Hello_TRANSLATED i18n!_TRANSLATED</target>"
    ));
    Ok(())
}

/// Ignored units keep their shape, every other unit is translated
#[tokio::test]
async fn test_translate_withIgnoreList_shouldSkipListedUnits() -> Result<()> {
    let translator = RecordingTranslator::default();
    let ignore = vec!["brand".to_string()];

    let output = xliff::translate(&translator, common::SAMPLE_XLIFF, "en", "de", &ignore, &TranslateOptions::default()).await?;

    let mut texts = translator.texts();
    texts.sort();
    assert_eq!(texts, vec!["Goodbye".to_string(), "Hello world".to_string()]);
    assert!(translator.requests().iter().all(|(_, src, tgt)| src == "en" && tgt == "de"));

    assert!(output.contains("<target>HELLO WORLD</target>"));
    assert!(output.contains("<target>GOODBYE</target>"));
    assert!(!output.contains("<target>ACME</target>"));
    Ok(())
}

/// An ignored unit that is already translated comes out byte for byte as it went in
#[tokio::test]
async fn test_translate_withIgnoredUnitHoldingTarget_shouldKeepExistingTarget() -> Result<()> {
    let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2">
  <file source-language="en" target-language="fr">
    <body>
      <trans-unit id="legal">
        <source>Terms of use</source>
        <target state="final">Conditions d'utilisation</target>
        <note>Reviewed by legal</note>
      </trans-unit>
      <trans-unit id="title">
        <source>Welcome</source>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;
    let translator = RecordingTranslator::default();
    let ignore = vec!["legal".to_string()];

    let output = xliff::translate(&translator, input, "en", "fr", &ignore, &TranslateOptions::default()).await?;

    assert!(output.contains(
        "<trans-unit id=\"legal\">\n        <source>Terms of use</source>\n        <target state=\"final\">Conditions d'utilisation</target>\n        <note>Reviewed by legal</note>\n      </trans-unit>"
    ));
    assert!(output.contains("<source>Welcome</source>\n        <target>WELCOME</target>"));
    assert_eq!(translator.texts(), vec!["Welcome".to_string()]);
    Ok(())
}

/// Units sharing a source cost one request between them
#[tokio::test]
async fn test_translate_withRepeatedSources_shouldSendOneRequestPerText() -> Result<()> {
    let input = r#"<xliff version="1.2"><file><body>
  <trans-unit id="save.toolbar"><source>Save</source></trans-unit>
  <trans-unit id="save.menu"><source>Save</source></trans-unit>
  <trans-unit id="save.dialog"><source>Save</source></trans-unit>
  <trans-unit id="cancel"><source>Cancel <g id="1">Save</g></source></trans-unit>
</body></file></xliff>"#;
    let translator = MockProvider::working();
    let options = TranslateOptions { max_concurrent_requests: 4, ..TranslateOptions::default() };

    let output = xliff::translate(&translator, input, "en", "fr", &[], &options).await?;

    assert_eq!(translator.request_count(), 2);
    assert_eq!(output.matches("<target>[fr] Save</target>").count(), 3);
    assert!(output.contains(r#"<target>[fr] Cancel <g id="1">[fr] Save</g></target>"#));
    Ok(())
}

/// Running twice replaces targets instead of stacking them
#[tokio::test]
async fn test_translate_runTwice_shouldKeepOneTargetPerUnit() -> Result<()> {
    let options = TranslateOptions::default();
    let once = xliff::translate(&WordSuffixTranslator, common::SAMPLE_XLIFF, "en", "fr", &[], &options).await?;
    let twice = xliff::translate(&WordSuffixTranslator, &once, "en", "fr", &[], &options).await?;

    assert_eq!(once, twice);
    assert_eq!(twice.matches("<target>").count(), 3);
    Ok(())
}

/// A failing unit fails the whole document and names the unit
#[tokio::test]
async fn test_translate_withFailingUnit_shouldReportUnitId() {
    let translator = FailOnTextTranslator::new("Goodbye");

    let result = xliff::translate(&translator, common::SAMPLE_XLIFF, "en", "fr", &[], &TranslateOptions::default()).await;

    match result {
        Err(XliffError::Translation(TranslationError::UnitFailed { unit_id, message })) => {
            assert_eq!(unit_id, "farewell");
            assert!(message.contains("Goodbye"));
        }
        other => panic!("expected UnitFailed, got {:?}", other),
    }
}

/// Both segments of an XLIFF 2.0 unit receive a target
#[tokio::test]
async fn test_translate_withXliff2Segments_shouldTranslateEachSegment() -> Result<()> {
    let output = xliff::translate(
        &MockProvider::working(),
        common::SAMPLE_XLIFF_2,
        "en",
        "fr",
        &[],
        &TranslateOptions::default(),
    )
    .await?;

    assert!(output.contains("<target>[fr] Welcome back</target>"));
    assert!(output.contains("<target>[fr] See you soon</target>"));
    Ok(())
}

/// Progress goes from 1 to the number of requests
#[tokio::test]
async fn test_translateWithProgress_shouldReportEveryCompletion() -> Result<()> {
    let seen = std::sync::Mutex::new(Vec::new());

    xliff::translate_with_progress(
        &MockProvider::slow(2),
        common::SAMPLE_XLIFF,
        "en",
        "fr",
        &[],
        &TranslateOptions { max_concurrent_requests: 2, ..TranslateOptions::default() },
        |done, total| seen.lock().unwrap().push((done, total)),
    )
    .await?;

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    Ok(())
}

/// A document whose units are all skipped produces no requests and no change
#[tokio::test]
async fn test_translateDocument_withEverythingIgnored_shouldLeaveDocumentAlone() -> Result<()> {
    let translator = MockProvider::working();
    let mut document = Document::parse(common::SAMPLE_XLIFF)?;
    let ignore = vec!["greeting".to_string(), "farewell".to_string(), "brand".to_string()];

    let report = xliff::translate_document(
        &mut document,
        &translator,
        "en",
        "fr",
        &ignore,
        &TranslateOptions::default(),
        &|_: usize, _: usize| {},
    )
    .await?;

    assert_eq!(report.ignored, 3);
    assert_eq!(report.translated, 0);
    assert_eq!(translator.request_count(), 0);
    assert_eq!(document.serialize(), common::SAMPLE_XLIFF);
    Ok(())
}
