/*!
 * XLIFF document handling.
 *
 * - `document`: owned XML tree with parse/serialize and structural comparison
 * - `merge`: locating translatable units and splicing translated targets back in
 */

pub use self::document::{Declaration, Document, Element, Node};
pub use self::merge::{
    translate, translate_document, translate_with_progress, MergeReport, TranslateOptions,
};

pub mod document;
pub mod merge;
