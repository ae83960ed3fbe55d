/*!
 * Merging translations into XLIFF documents.
 *
 * Every translatable unit (`trans-unit` in XLIFF 1.2, `segment` inside a
 * `unit` in XLIFF 2.x) gets its `source` text translated and written to a
 * `target` sibling. Everything else in the tree is left untouched.
 */

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};

use crate::errors::{TranslationError, XliffError};
use crate::translation::Translator;

use super::document::{Document, Element, Node};

const TRANS_UNIT: &str = "trans-unit";
const UNIT: &str = "unit";
const SEGMENT: &str = "segment";
const SOURCE: &str = "source";
const TARGET: &str = "target";

/// Inline elements that wrap translatable content (XLIFF 1.2 `g`/`mrk`/`sub`, XLIFF 2 `pc`/`mrk`/`sub`)
const PAIRED_INLINE: &[&str] = &["g", "mrk", "pc", "sub"];

/// Tuning for a merge run
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Upper bound on translation requests in flight at once
    pub max_concurrent_requests: usize,

    /// Leave units that already carry a non-empty `target` alone
    pub keep_existing_targets: bool,

    /// Do not request translations for blank sources (no `target` is written).
    /// When off, blank sources are handed to the translator as they are.
    pub skip_empty_sources: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            keep_existing_targets: false,
            skip_empty_sources: true,
        }
    }
}

/// Counts of what happened to the units of one document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Units that received a translated `target`
    pub translated: usize,
    /// Units skipped via the ignore list or `translate="no"`
    pub ignored: usize,
    /// Units without a `source` child
    pub missing_source: usize,
    /// Units whose `source` is blank
    pub empty_source: usize,
    /// Units whose existing `target` was kept
    pub kept_existing: usize,
}

impl MergeReport {
    /// Total number of units seen
    pub fn total(&self) -> usize {
        self.translated + self.ignored + self.missing_source + self.empty_source + self.kept_existing
    }
}

/// Translate an XLIFF document given as text and return the merged document as text
pub async fn translate<T>(
    translator: &T,
    xml: &str,
    source_language: &str,
    target_language: &str,
    ignore_list: &[String],
    options: &TranslateOptions,
) -> Result<String, XliffError>
where
    T: Translator + ?Sized,
{
    translate_with_progress(
        translator,
        xml,
        source_language,
        target_language,
        ignore_list,
        options,
        |_, _| {},
    )
    .await
}

/// Same as [`translate`], reporting `(completed, total)` after each finished request.
///
/// `total` counts distinct texts, which can be fewer than the units.
pub async fn translate_with_progress<T, F>(
    translator: &T,
    xml: &str,
    source_language: &str,
    target_language: &str,
    ignore_list: &[String],
    options: &TranslateOptions,
    progress: F,
) -> Result<String, XliffError>
where
    T: Translator + ?Sized,
    F: Fn(usize, usize) + Send + Sync,
{
    let mut document = Document::parse(xml)?;
    translate_document(
        &mut document,
        translator,
        source_language,
        target_language,
        ignore_list,
        options,
        &progress,
    )
    .await?;
    Ok(document.serialize())
}

/// Translate the units of a parsed document in place.
///
/// Each distinct text is requested once, however many units share it.
/// Requests run concurrently up to `options.max_concurrent_requests` and the
/// results are then spliced into every unit that needs them. The first failed
/// request aborts the run; the document must then be discarded by the caller.
pub async fn translate_document<T, F>(
    document: &mut Document,
    translator: &T,
    source_language: &str,
    target_language: &str,
    ignore_list: &[String],
    options: &TranslateOptions,
    progress: &F,
) -> Result<MergeReport, XliffError>
where
    T: Translator + ?Sized,
    F: Fn(usize, usize) + Send + Sync,
{
    let mut units = Vec::new();
    gather_units(document.root_mut(), &UnitScope::default(), &mut units);

    let mut report = MergeReport::default();
    let mut jobs = Vec::new();

    for (index, unit) in units.iter().enumerate() {
        match plan_unit(unit, ignore_list, options) {
            Plan::Translate(pieces) => jobs.push(Job {
                index,
                unit_id: unit.id.clone(),
                pieces,
            }),
            Plan::Ignored => {
                debug!("Unit '{}' ignored", unit.id);
                report.ignored += 1;
            }
            Plan::MissingSource => {
                debug!("Unit '{}' has no source, skipping", unit.id);
                report.missing_source += 1;
            }
            Plan::EmptySource => {
                debug!("Unit '{}' has an empty source, skipping", unit.id);
                report.empty_source += 1;
            }
            Plan::KeepExisting => {
                debug!("Unit '{}' already translated, keeping target", unit.id);
                report.kept_existing += 1;
            }
        }
    }

    // One request per distinct text, attributed to the first unit that needs it
    let mut seen = HashSet::new();
    let mut requests = Vec::new();
    for job in &jobs {
        let mut texts = Vec::new();
        request_texts(&job.pieces, &mut texts);
        for text in texts {
            if seen.insert(text) {
                requests.push((text.to_string(), job.unit_id.clone()));
            }
        }
    }

    let total = requests.len();
    let completed = AtomicUsize::new(0);
    debug!("{} units need {} distinct translations", jobs.len(), total);

    let translations: HashMap<String, String> = stream::iter(requests)
        .map(|(text, unit_id)| {
            let completed = &completed;
            async move {
                let translated = translator
                    .translate(&text, source_language, target_language)
                    .await
                    .map_err(|e| TranslationError::UnitFailed {
                        unit_id,
                        message: format!("{:#}", e),
                    })?;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress(done, total);

                Ok::<_, TranslationError>((text, translated))
            }
        })
        .buffer_unordered(options.max_concurrent_requests.max(1))
        .try_collect()
        .await?;

    for job in &jobs {
        let content = render_pieces(&job.pieces, &translations);
        splice_target(units[job.index].element, content);
        report.translated += 1;
    }

    info!(
        "Merged {} of {} units ({} ignored, {} without source, {} empty, {} kept)",
        report.translated,
        report.total(),
        report.ignored,
        report.missing_source,
        report.empty_source,
        report.kept_existing
    );

    Ok(report)
}

/// Inherited context while walking towards units
#[derive(Debug, Clone)]
struct UnitScope {
    /// Inside an XLIFF 2.x `unit`
    in_unit: bool,
    /// `id` of the enclosing XLIFF 2.x `unit`
    unit_id: Option<String>,
    /// No ancestor carries `translate="no"`
    translatable: bool,
}

impl Default for UnitScope {
    fn default() -> Self {
        Self {
            in_unit: false,
            unit_id: None,
            translatable: true,
        }
    }
}

/// A translatable unit located in the tree
struct UnitRef<'a> {
    id: String,
    unit_id: Option<String>,
    translatable: bool,
    element: &'a mut Element,
}

/// Owned work item for one unit, independent of the tree borrow
struct Job {
    index: usize,
    unit_id: String,
    pieces: Vec<SourcePiece>,
}

enum Plan {
    Translate(Vec<SourcePiece>),
    Ignored,
    MissingSource,
    EmptySource,
    KeepExisting,
}

/// Part of a `source`
#[derive(Debug, Clone, PartialEq)]
enum SourcePiece {
    /// Text whose trimmed content is translated, surrounding whitespace kept
    Text(String),
    /// Whole blank source sent to the translator unchanged
    Blank(String),
    /// Paired inline element: wrapper kept, content translated
    Paired { element: Element, pieces: Vec<SourcePiece> },
    /// Placeholder or other node copied as-is
    Verbatim(Node),
}

fn gather_units<'a>(element: &'a mut Element, scope: &UnitScope, out: &mut Vec<UnitRef<'a>>) {
    let translatable = scope.translatable && element.attribute("translate") != Some("no");
    let local_name = element.local_name();

    if local_name == TRANS_UNIT || (local_name == SEGMENT && scope.in_unit) {
        let id = element
            .attribute("id")
            .map(str::to_owned)
            .or_else(|| scope.unit_id.clone())
            .unwrap_or_else(|| format!("#{}", out.len() + 1));

        out.push(UnitRef {
            id,
            unit_id: scope.unit_id.clone(),
            translatable,
            element,
        });
        return;
    }

    let child_scope = if local_name == UNIT {
        UnitScope {
            in_unit: true,
            unit_id: element.attribute("id").map(str::to_owned),
            translatable,
        }
    } else {
        UnitScope {
            translatable,
            ..scope.clone()
        }
    };

    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            gather_units(child, &child_scope, out);
        }
    }
}

fn plan_unit(unit: &UnitRef<'_>, ignore_list: &[String], options: &TranslateOptions) -> Plan {
    let listed = ignore_list
        .iter()
        .any(|ignored| *ignored == unit.id || unit.unit_id.as_deref() == Some(ignored.as_str()));
    if listed || !unit.translatable {
        return Plan::Ignored;
    }

    let Some(source) = unit.element.find_child(SOURCE) else {
        return Plan::MissingSource;
    };

    let blank = !source.has_element_children() && source.text_content().trim().is_empty();
    if blank && options.skip_empty_sources {
        return Plan::EmptySource;
    }

    if options.keep_existing_targets {
        let has_target = unit.element.find_child(TARGET).is_some_and(|target| {
            target.has_element_children() || !target.text_content().trim().is_empty()
        });
        if has_target {
            return Plan::KeepExisting;
        }
    }

    if blank {
        return Plan::Translate(vec![SourcePiece::Blank(source.text_content())]);
    }

    Plan::Translate(source_pieces(source))
}

fn source_pieces(source: &Element) -> Vec<SourcePiece> {
    if !source.has_element_children() {
        return vec![SourcePiece::Text(source.text_content())];
    }
    inline_pieces(&source.children)
}

fn inline_pieces(children: &[Node]) -> Vec<SourcePiece> {
    children
        .iter()
        .filter_map(|child| match child {
            Node::Text(text) | Node::CData(text) => Some(SourcePiece::Text(text.clone())),
            Node::Comment(_) | Node::ProcessingInstruction(_) => None,
            Node::Element(element) if PAIRED_INLINE.contains(&element.local_name()) => {
                let wrapper = Element {
                    name: element.name.clone(),
                    attributes: element.attributes.clone(),
                    children: Vec::new(),
                };
                Some(SourcePiece::Paired {
                    element: wrapper,
                    pieces: inline_pieces(&element.children),
                })
            }
            other => Some(SourcePiece::Verbatim(other.clone())),
        })
        .collect()
}

/// Texts the translator has to see for these pieces, in document order
fn request_texts<'a>(pieces: &'a [SourcePiece], out: &mut Vec<&'a str>) {
    for piece in pieces {
        match piece {
            SourcePiece::Text(text) => {
                let (_, core, _) = split_text_bounds(text);
                if !core.is_empty() {
                    out.push(core);
                }
            }
            SourcePiece::Blank(text) => out.push(text),
            SourcePiece::Paired { pieces, .. } => request_texts(pieces, out),
            SourcePiece::Verbatim(_) => {}
        }
    }
}

/// Build target content from the pieces and the finished translations
fn render_pieces(pieces: &[SourcePiece], translations: &HashMap<String, String>) -> Vec<Node> {
    pieces
        .iter()
        .map(|piece| match piece {
            SourcePiece::Text(text) => {
                let (leading, core, trailing) = split_text_bounds(text);
                match translations.get(core) {
                    Some(translated) if !core.is_empty() => {
                        Node::Text(format!("{}{}{}", leading, translated.trim(), trailing))
                    }
                    _ => Node::Text(text.clone()),
                }
            }
            SourcePiece::Blank(text) => Node::Text(translations.get(text).cloned().unwrap_or_else(|| text.clone())),
            SourcePiece::Paired { element, pieces } => {
                let mut element = element.clone();
                element.children = render_pieces(pieces, translations);
                Node::Element(element)
            }
            SourcePiece::Verbatim(node) => node.clone(),
        })
        .collect()
}

/// Split text into leading whitespace, content, trailing whitespace
fn split_text_bounds(text: &str) -> (&str, &str, &str) {
    let trimmed_start = text.trim_start();
    let leading = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trailing = &trimmed_start[core.len()..];
    (leading, core, trailing)
}

/// Write translated content into the unit's `target`, creating it right after `source` if needed
fn splice_target(unit: &mut Element, content: Vec<Node>) {
    if let Some(index) = unit.child_index(TARGET) {
        if let Some(target) = unit.children[index].as_element_mut() {
            target.children = content;
        }
        return;
    }

    let Some(source_index) = unit.child_index(SOURCE) else {
        return;
    };

    let name = match unit.children[source_index].as_element().and_then(Element::prefix) {
        Some(prefix) => format!("{}:{}", prefix, TARGET),
        None => TARGET.to_string(),
    };
    let mut target = Element::new(name);
    target.children = content;

    // Reuse the indentation in front of <source> so the new line lines up
    let indent = source_index
        .checked_sub(1)
        .map(|previous| &unit.children[previous])
        .filter(|node| node.is_blank_text())
        .cloned();

    let mut insert_at = source_index + 1;
    if let Some(indent) = indent {
        unit.children.insert(insert_at, indent);
        insert_at += 1;
    }
    unit.children.insert(insert_at, Node::Element(target));
}
