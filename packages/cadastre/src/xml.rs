//! Minimal XML element tree.
//!
//! Cadastre responses are small documents navigated by element path, so
//! they are read into a tree of [`XmlNode`]s (local names only, namespace
//! prefixes dropped) rather than bound to a fixed schema.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::CadastreError;

/// One XML element with its attributes, text content, and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<Self>,
}

impl XmlNode {
    /// First child element named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Follows a chain of child names from this node.
    #[must_use]
    pub fn path(&self, names: &[&str]) -> Option<&Self> {
        names.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Attribute value, `None` when absent or blank.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text content, `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|t| !t.is_empty())
    }

    /// Text of the first child named `name`.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Self::text)
    }
}

/// Parses a document and returns its root element.
///
/// # Errors
///
/// Returns [`CadastreError::Malformed`] for anything that is not a single
/// well-formed element tree.
pub fn parse_document(xml: &str) -> Result<XmlNode, CadastreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Bottom of the stack is a synthetic document node.
    let mut stack: Vec<XmlNode> = vec![XmlNode::default()];

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => stack.push(element(&e)?),
            Event::Empty(e) => {
                let node = element(&e)?;
                attach(&mut stack, node)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(malformed("closing tag without an open element"));
                }
                let node = stack.pop().ok_or_else(|| malformed("empty element stack"))?;
                attach(&mut stack, node)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let bytes = c.into_inner();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unclosed element at end of document"));
    }

    stack
        .pop()
        .and_then(|doc| doc.children.into_iter().next())
        .ok_or_else(|| malformed("document has no root element"))
}

fn element(start: &BytesStart<'_>) -> Result<XmlNode, CadastreError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();

    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        attributes.insert(key, value);
    }

    Ok(XmlNode {
        name,
        attributes,
        ..XmlNode::default()
    })
}

fn attach(stack: &mut [XmlNode], node: XmlNode) -> Result<(), CadastreError> {
    stack
        .last_mut()
        .ok_or_else(|| malformed("element outside of document"))?
        .children
        .push(node);
    Ok(())
}

fn malformed(e: impl std::fmt::Display) -> CadastreError {
    CadastreError::Malformed {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree_with_attributes() {
        let doc = parse_document(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <consulta xmlns="http://www.catastro.meh.es/">
              <coord><pc><pc1 rc="123" sfc="85"/></pc><ldt>CL MAYOR &amp; 1</ldt></coord>
            </consulta>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "consulta");
        let pc1 = doc.path(&["coord", "pc", "pc1"]).unwrap();
        assert_eq!(pc1.attr("rc"), Some("123"));
        assert_eq!(pc1.attr("sfc"), Some("85"));
        assert_eq!(
            doc.child("coord").unwrap().child_text("ldt"),
            Some("CL MAYOR & 1")
        );
        assert!(doc.path(&["coord", "geo"]).is_none());
    }

    #[test]
    fn blank_values_are_absent() {
        let doc = parse_document(r#"<a x="  "><b>   </b></a>"#).unwrap();
        assert!(doc.attr("x").is_none());
        assert!(doc.child_text("b").is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_document("").is_err());
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a>").is_err());
    }
}
