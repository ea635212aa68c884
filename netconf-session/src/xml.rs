//! Minimal XML document tree used for NETCONF envelopes.
//!
//! Decoding and encoding go through `quick-xml`. Namespace declarations are
//! kept apart from ordinary attributes and element names keep their prefix
//! as written on the wire; use [`local_name`] to strip it.

use crate::error::{NetconfClientError, NetconfClientResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// `(prefix, namespace)`; `None` is the default namespace.
    pub namespaces: Vec<(Option<String>, String)>,
    pub text: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Element {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Element {
        self.namespaces.push((None, namespace.into()));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Element {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Element {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Element {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Element {
        self.children.extend(children);
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute value matched on the local part of its name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child whose local name is `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    fn from_start(start: &BytesStart) -> NetconfClientResult<Element> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            if key == "xmlns" {
                element.namespaces.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                element.namespaces.push((Some(prefix.to_string()), value));
            } else {
                element.attributes.push((key, value));
            }
        }
        Ok(element)
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> NetconfClientResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (prefix, namespace) in &self.namespaces {
            match prefix {
                Some(prefix) => {
                    let key = format!("xmlns:{}", prefix);
                    start.push_attribute((key.as_str(), namespace.as_str()));
                }
                None => start.push_attribute(("xmlns", namespace.as_str())),
            }
        }
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match encode_pretty(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Part of a qualified name after the namespace prefix separator.
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

pub fn decode(text: &str) -> NetconfClientResult<Element> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    NetconfClientError::MalformedXml("unbalanced end tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(element) = stack.last_mut() {
                    element.push_text(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(element) = stack.last_mut() {
                    element.push_text(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(NetconfClientError::MalformedXml(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| NetconfClientError::MalformedXml("no root element".to_string()))
}

/// Parses a fragment that may hold several sibling elements, returning them
/// in document order.
pub fn decode_fragment(text: &str) -> NetconfClientResult<Vec<Element>> {
    let wrapped = decode(&format!("<fragment>{}</fragment>", text))?;
    Ok(wrapped.children)
}

pub fn encode(element: &Element) -> NetconfClientResult<String> {
    let mut writer = Writer::new(Vec::new());
    element.write(&mut writer)?;
    into_string(writer)
}

pub fn encode_pretty(element: &Element) -> NetconfClientResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    element.write(&mut writer)?;
    into_string(writer)
}

fn into_string(writer: Writer<Vec<u8>>) -> NetconfClientResult<String> {
    String::from_utf8(writer.into_inner()).map_err(|err| NetconfClientError::Utf8(err.utf8_error()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> NetconfClientResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(NetconfClientError::MalformedXml(format!(
            "multiple root elements, second is <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}
