/*!
 * Owned XML tree for XLIFF documents.
 *
 * Parsing folds the `quick-xml` pull events into a small owned tree that the
 * merge engine can walk and mutate. Serialization writes the tree back out,
 * keeping attribute order, qualified names and all whitespace text nodes, so
 * an untouched document comes back structurally identical.
 */

use std::fmt;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::XliffError;

/// XML declaration (`<?xml version="1.0" ...?>`)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A single node of the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    /// Raw processing instruction content (target and data)
    ProcessingInstruction(String),
    DocType(String),
    Declaration(Declaration),
}

impl Node {
    /// Whether this is a text node holding only whitespace
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its attributes in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written, including any prefix
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace prefix of the element name, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of the attribute with the given qualified name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Concatenated text and CDATA of all descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }

    /// Whether any child is an element
    pub fn has_element_children(&self) -> bool {
        self.children.iter().any(|child| matches!(child, Node::Element(_)))
    }

    /// Child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.local_name() == local_name)
    }

    /// Position in `children` of the first child element with the given local name
    pub fn child_index(&self, local_name: &str) -> Option<usize> {
        self.children.iter().position(|child| {
            child
                .as_element()
                .is_some_and(|element| element.local_name() == local_name)
        })
    }

    /// Tree-shape equality ignoring whitespace-only text, comments and processing instructions.
    ///
    /// Attributes are compared as a set, text is compared trimmed and CDATA
    /// counts as text.
    pub fn structurally_eq(&self, other: &Element) -> bool {
        if self.name != other.name {
            return false;
        }

        let mut left_attributes = self.attributes.clone();
        let mut right_attributes = other.attributes.clone();
        left_attributes.sort();
        right_attributes.sort();
        if left_attributes != right_attributes {
            return false;
        }

        let left: Vec<&Node> = significant_children(self).collect();
        let right: Vec<&Node> = significant_children(other).collect();
        if left.len() != right.len() {
            return false;
        }

        left.iter().zip(right.iter()).all(|(a, b)| match (a, b) {
            (Node::Element(a), Node::Element(b)) => a.structurally_eq(b),
            (a, b) => match (text_of(a), text_of(b)) {
                (Some(a), Some(b)) => a.trim() == b.trim(),
                _ => false,
            },
        })
    }
}

/// A parsed XML document: prolog, exactly one root element, and any trailing misc nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Top-level nodes in order; exactly one of them is an element
    nodes: Vec<Node>,
}

impl Document {
    /// Parse XML text into a document.
    ///
    /// Whitespace before the XML declaration is tolerated, anything else that
    /// is not well-formed fails with [`XliffError::Parse`].
    pub fn parse(xml: &str) -> Result<Self, XliffError> {
        let leading = xml.len() - xml.trim_start().len();
        let mut reader = Reader::from_str(xml.trim_start());
        reader.trim_text(false);
        reader.check_end_names(true);
        reader.check_comments(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let position = leading + reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|e| XliffError::parse(leading + reader.buffer_position(), e.to_string()))?;

            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start, position)?);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XliffError::parse(position, "closing tag without matching start tag"))?;
                    attach(&mut stack, &mut nodes, Node::Element(element), position)?;
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut stack, &mut nodes, Node::Element(element), position)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| XliffError::parse(position, e.to_string()))?;
                    attach(&mut stack, &mut nodes, Node::Text(text.into_owned()), position)?;
                }
                Event::CData(data) => {
                    let data = utf8(&data, position)?;
                    attach(&mut stack, &mut nodes, Node::CData(data), position)?;
                }
                Event::Comment(comment) => {
                    let comment = utf8(&comment, position)?;
                    attach(&mut stack, &mut nodes, Node::Comment(comment), position)?;
                }
                Event::PI(instruction) => {
                    let instruction = utf8(&instruction, position)?;
                    attach(&mut stack, &mut nodes, Node::ProcessingInstruction(instruction), position)?;
                }
                Event::DocType(doctype) => {
                    let doctype = utf8(&doctype, position)?;
                    attach(&mut stack, &mut nodes, Node::DocType(doctype), position)?;
                }
                Event::Decl(decl) => {
                    let error = |e: quick_xml::Error| XliffError::parse(position, e.to_string());
                    let version = utf8(&decl.version().map_err(error)?, position)?;
                    let encoding = match decl.encoding() {
                        Some(encoding) => Some(utf8(&encoding.map_err(error)?, position)?),
                        None => None,
                    };
                    let standalone = match decl.standalone() {
                        Some(standalone) => Some(utf8(&standalone.map_err(error)?, position)?),
                        None => None,
                    };
                    let declaration = Declaration { version, encoding, standalone };
                    attach(&mut stack, &mut nodes, Node::Declaration(declaration), position)?;
                }
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(XliffError::parse(xml.len(), format!("unclosed element <{}>", open.name)));
        }

        if !nodes.iter().any(|node| matches!(node, Node::Element(_))) {
            return Err(XliffError::parse(xml.len(), "document has no root element"));
        }

        Ok(Self { nodes })
    }

    /// Write the document back to XML text
    pub fn serialize(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)
                .unwrap_or_else(|e| unreachable!("writing XML to memory failed: {}", e));
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Top-level nodes: declaration, prolog misc, the root element, trailing misc
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The root element
    pub fn root(&self) -> &Element {
        self.nodes
            .iter()
            .find_map(Node::as_element)
            .unwrap_or_else(|| unreachable!("a parsed document always has a root element"))
    }

    /// The root element, mutably
    pub fn root_mut(&mut self) -> &mut Element {
        self.nodes
            .iter_mut()
            .find_map(Node::as_element_mut)
            .unwrap_or_else(|| unreachable!("a parsed document always has a root element"))
    }

    /// Structural equality of the two root elements
    pub fn structurally_eq(&self, other: &Document) -> bool {
        self.root().structurally_eq(other.root())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> quick_xml::Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element),
        // `<` and `&` must be escaped in text, quotes need not be
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.as_str())))),
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str()))),
        Node::Comment(comment) => writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str()))),
        Node::ProcessingInstruction(instruction) => {
            writer.write_event(Event::PI(BytesText::from_escaped(instruction.as_str())))
        }
        Node::DocType(doctype) => writer.write_event(Event::DocType(BytesText::from_escaped(doctype.trim_start()))),
        Node::Declaration(declaration) => writer.write_event(Event::Decl(BytesDecl::new(
            &declaration.version,
            declaration.encoding.as_deref(),
            declaration.standalone.as_deref(),
        ))),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) | Node::CData(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out),
            _ => {}
        }
    }
}

fn text_of(node: &Node) -> Option<&str> {
    match node {
        Node::Text(text) | Node::CData(text) => Some(text),
        _ => None,
    }
}

fn significant_children(element: &Element) -> impl Iterator<Item = &Node> {
    element.children.iter().filter(|child| match child {
        Node::Element(_) | Node::CData(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    })
}

fn utf8(bytes: &[u8], position: usize) -> Result<String, XliffError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| XliffError::parse(position, format!("invalid UTF-8: {}", e)))
}

fn element_from_start(start: &BytesStart<'_>, position: usize) -> Result<Element, XliffError> {
    let mut element = Element::new(utf8(start.name().as_ref(), position)?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XliffError::parse(position, e.to_string()))?;
        let key = utf8(attribute.key.as_ref(), position)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| XliffError::parse(position, e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Append a finished node to the open element, or to the top level
fn attach(
    stack: &mut [Element],
    nodes: &mut Vec<Node>,
    node: Node,
    position: usize,
) -> Result<(), XliffError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }

    match &node {
        Node::Element(element) => {
            if nodes.iter().any(|existing| matches!(existing, Node::Element(_))) {
                return Err(XliffError::parse(
                    position,
                    format!("second root element <{}>", element.name),
                ));
            }
        }
        Node::Text(text) if !text.trim().is_empty() => {
            return Err(XliffError::parse(position, "text outside the root element"));
        }
        Node::CData(_) => {
            return Err(XliffError::parse(position, "CDATA outside the root element"));
        }
        _ => {}
    }

    nodes.push(node);
    Ok(())
}
