//! Owned XML element tree for TEI documents.
//!
//! Authority lists, templates, and outputs are small enough to hold in
//! memory, so documents are parsed with `quick-xml` into a plain
//! [`Element`] tree, mutated in place by the enrichment passes, and
//! serialized once at the end of a run.
//!
//! Lookups match on the local name (`persName`, not `tei:persName`), so
//! both default-namespace and prefixed documents work.
//!
//! Whitespace is handled so that mixed content survives a round trip:
//!
//! - An element with any non-whitespace text of its own keeps all of its
//!   text nodes verbatim and is written back without added indentation.
//! - Otherwise whitespace-only text spanning a line break is layout and is
//!   dropped; a bare separator such as the space in
//!   `<forename>Hedwig</forename> <surname>Kohn</surname>` is kept.
//! - Elements holding only elements are re-indented with two spaces.
//!
//! Output carries a UTF-8 XML declaration.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::path::Path;

pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with its qualified name, attributes in document order, and
/// children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute, keeping its original position.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    /// All text below this element, concatenated in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    /// Text content with runs of whitespace collapsed to single spaces, so
    /// `<forename>Hedwig</forename> <surname>Kohn</surname>` reads as it is
    /// displayed.
    pub fn normalized_text(&self) -> String {
        self.text_content()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Whether any direct child is text.
    pub fn has_text(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Text(_)))
    }

    /// Drop layout whitespace from an element without text content of its
    /// own.
    fn drop_layout_whitespace(&mut self) {
        let mixed = self
            .children
            .iter()
            .any(|c| matches!(c, Node::Text(t) if !t.trim().is_empty()));
        if !mixed {
            self.children
                .retain(|c| !matches!(c, Node::Text(t) if t.contains('\n')));
        }
    }

    /// Replace the direct text of this element.
    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|c| !matches!(c, Node::Text(_)));
        self.children.insert(0, Node::Text(text.to_string()));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn first_child(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.local_name() == local)
    }

    pub fn first_child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|c| match c {
            Node::Element(el) if el.local_name() == local => Some(el),
            _ => None,
        })
    }

    /// Index into `children` of the first child element named `local`.
    pub fn child_position(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| matches!(c, Node::Element(el) if el.local_name() == local))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Depth-first search for the first element named `local`, including
    /// this one.
    pub fn find_mut(&mut self, local: &str) -> Option<&mut Element> {
        if self.local_name() == local {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                if let Some(found) = el.find_mut(local) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All descendant elements named `local`, in document order.
    pub fn descendants(&self, local: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(local, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, local: &str, out: &mut Vec<&'a Element>) {
        for el in self.child_elements() {
            if el.local_name() == local {
                out.push(el);
            }
            el.collect_descendants(local, out);
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// A bare TEI document whose body holds one empty list element
    /// (`listPerson`, `listPlace`, `listOrg`).
    pub fn tei_skeleton(list: &str) -> Self {
        let root = Element::new("TEI").with_attr("xmlns", TEI_NS).with_child(
            Element::new("text").with_child(Element::new("body").with_child(Element::new(list))),
        );
        Self { root }
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let el = element_from_start(&e)?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::End(_) => {
                    let mut el = stack
                        .pop()
                        .ok_or_else(|| anyhow::anyhow!("Unbalanced end tag in document"))?;
                    el.drop_layout_whitespace();
                    attach(&mut stack, &mut root, el)?;
                }
                Event::Text(t) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(t.unescape()?.into_owned()));
                    }
                }
                Event::CData(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Text(String::from_utf8_lossy(&c).into_owned()));
                    }
                }
                Event::Comment(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            bail!("Document ended with {} unclosed element(s)", stack.len());
        }
        let root = root.ok_or_else(|| anyhow::anyhow!("Document has no root element"))?;
        Ok(Self { root })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read XML document: {}", path.display()))?;
        Self::parse(&xml).with_context(|| format!("Failed to parse XML document: {}", path.display()))
    }

    /// Serialize with an XML declaration and two-space indentation outside
    /// mixed content.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root, Some(0))?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the document, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let xml = self.to_xml()?;
        std::fs::write(path, xml)
            .with_context(|| format!("Failed to write XML document: {}", path.display()))
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<Element> {
    let mut el = Element::new(&String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None => {
            if root.is_some() {
                bail!("Document has more than one root element");
            }
            *root = Some(el);
        }
    }
    Ok(())
}

fn indent<W: Write>(writer: &mut Writer<W>, depth: usize) -> Result<()> {
    let out = writer.get_mut();
    out.write_all(b"\n")?;
    for _ in 0..depth {
        out.write_all(b"  ")?;
    }
    Ok(())
}

/// Write `el` at `depth`, or inline when `depth` is `None`.
fn write_element<W: Write>(
    writer: &mut Writer<W>,
    el: &Element,
    depth: Option<usize>,
) -> Result<()> {
    if let Some(depth) = depth {
        indent(writer, depth)?;
    }

    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    let child_depth = match depth {
        Some(d) if !el.has_text() => Some(d + 1),
        _ => None,
    };

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(c) => write_element(writer, c, child_depth)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Node::Comment(c) => {
                if let Some(d) = child_depth {
                    indent(writer, d)?;
                }
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?
            }
        }
    }
    if let (Some(d), Some(_)) = (depth, child_depth) {
        indent(writer, d)?;
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}
