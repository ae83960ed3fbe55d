/*!
 * Tests for the XLIFF document model through the public API
 */

use anyhow::Result;
use xliffwai::errors::XliffError;
use xliffwai::xliff::{Document, Element, Node};
use crate::common;

fn find_descendant<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    if element.local_name() == local_name {
        return Some(element);
    }
    element.child_elements().find_map(|child| find_descendant(child, local_name))
}

#[test]
fn test_parse_withSampleXliff_shouldExposeUnits() -> Result<()> {
    let document = Document::parse(common::SAMPLE_XLIFF)?;
    let root = document.root();

    assert_eq!(root.local_name(), "xliff");
    assert_eq!(root.attribute("version"), Some("1.2"));

    let unit = find_descendant(root, "trans-unit").expect("trans-unit");
    assert_eq!(unit.attribute("id"), Some("greeting"));
    assert_eq!(unit.find_child("source").map(Element::text_content).as_deref(), Some("Hello world"));
    assert!(matches!(document.nodes()[0], Node::Declaration(_)));
    Ok(())
}

#[test]
fn test_serialize_withUntouchedDocument_shouldRoundTripExactly() -> Result<()> {
    let document = Document::parse(common::SAMPLE_XLIFF_2)?;

    assert_eq!(document.serialize(), common::SAMPLE_XLIFF_2);
    Ok(())
}

#[test]
fn test_structurallyEq_shouldIgnoreIndentation() -> Result<()> {
    let compact = Document::parse(
        r#"<xliff version="1.2"><file><body><trans-unit id="a"><source>Hi</source></trans-unit></body></file></xliff>"#,
    )?;
    let pretty = Document::parse(common::SAMPLE_XLIFF)?;
    let reindented = Document::parse(
        r#"<xliff version="1.2">
             <file>
               <body>
                 <trans-unit id="a">
                   <source>Hi</source>
                 </trans-unit>
               </body>
             </file>
           </xliff>"#,
    )?;

    assert!(compact.structurally_eq(&reindented));
    assert!(!compact.structurally_eq(&pretty));
    Ok(())
}

#[test]
fn test_parse_withMalformedInput_shouldReturnParseError() {
    let inputs = [
        "",
        "just text",
        "<xliff><file></xliff>",
        "<xliff>",
        "<a/><b/>",
    ];

    for input in inputs {
        let result = Document::parse(input);
        assert!(matches!(result, Err(XliffError::Parse { .. })), "input {:?} should fail", input);
    }
}
