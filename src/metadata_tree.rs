//! # Metadata Tree
//!
//! This module turns a federation metadata XML document into a heterogeneous
//! tree of mapping, sequence and scalar nodes. The shape mirrors the common
//! "XML as dictionary" convention:
//!
//! - every element becomes an entry keyed by its qualified name (`md:KeyDescriptor`)
//! - attributes become entries keyed by `@name`
//! - repeated sibling elements collapse into a single sequence entry
//! - text of an element with attributes or children is kept under `#text`
//! - an element with neither attributes nor children is a plain scalar
//!
//! ## Usage
//!
//! ```
//! use saml_cert_expiry::metadata_tree::MetadataNode;
//!
//! let tree = MetadataNode::parse(r#"<a use="x"><b>1</b><b>2</b></a>"#).unwrap();
//! let a = tree.get("a").unwrap();
//! assert_eq!(a.get("@use").and_then(MetadataNode::text), Some("x"));
//! ```

use roxmltree::{Document, Node, ParsingOptions};

use crate::common::{MetadataResult, TEXT_KEY};

/// A node of a parsed metadata document.
///
/// Mapping entries are kept in document order. Keys are not required to be
/// unique by the type, but trees built by [`MetadataNode::parse`] never
/// repeat a key within one mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataNode {
    Mapping(Vec<(String, MetadataNode)>),
    Sequence(Vec<MetadataNode>),
    Scalar(String),
}

impl MetadataNode {
    /// Parses an XML document into a tree.
    ///
    /// The result is a mapping with a single entry: the root element's
    /// qualified name bound to the root element's value.
    ///
    /// # Errors
    ///
    /// * `MetadataError::Parse` - If the document is not well-formed XML
    pub fn parse(xml: &str) -> MetadataResult<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(xml, options)?;
        let root = document.root_element();
        let (name, value) = element_entry(xml, root);
        log::debug!("Parsed metadata document rooted at {name}");
        Ok(MetadataNode::Mapping(vec![(name, value)]))
    }

    /// Returns the value stored under exactly `key`, if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&MetadataNode> {
        match self {
            MetadataNode::Mapping(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Returns the child element whose local name is `local_name`, ignoring
    /// any namespace prefix on the key.
    pub fn child(&self, local_name: &str) -> Option<&MetadataNode> {
        match self {
            MetadataNode::Mapping(entries) => entries
                .iter()
                .find(|(name, _)| local_part(name) == local_name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Text content of the node.
    ///
    /// Scalars yield themselves, mappings yield their `#text` entry and
    /// sequences yield the text of their first element.
    pub fn text(&self) -> Option<&str> {
        match self {
            MetadataNode::Scalar(value) => Some(value.as_str()),
            MetadataNode::Mapping(_) => self.get(TEXT_KEY).and_then(MetadataNode::text),
            MetadataNode::Sequence(items) => items.first().and_then(MetadataNode::text),
        }
    }
}

fn local_part(name: &str) -> &str {
    if name.starts_with('@') || name == TEXT_KEY {
        return name;
    }
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Rebuilds a prefix from the namespace URI. Only used when the source text
/// of an element is not available, as for content expanded from entities.
fn qualify(node: Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn is_name_end(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '>' | '=')
}

/// Qualified names of a start tag exactly as written: the element name and
/// its attribute names in order, namespace declarations left out.
fn written_names(start_tag: &str) -> Option<(&str, Vec<&str>)> {
    let rest = start_tag.strip_prefix('<')?;
    let (element, mut rest) = rest.split_at(rest.find(is_name_end)?);
    let mut attributes = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('>') {
            break;
        }
        let (name, after_name) = rest.split_at(rest.find(is_name_end)?);
        let value = after_name.trim_start().strip_prefix('=')?.trim_start();
        let quote = value.chars().next().filter(|c| matches!(c, '"' | '\''))?;
        let close = value[1..].find(quote)?;
        rest = &value[close + 2..];
        if name != "xmlns" && !name.starts_with("xmlns:") {
            attributes.push(name);
        }
    }
    Some((element, attributes))
}

/// Key and value of an element, naming it and its attributes with the
/// prefixes used in `source`.
fn element_entry(source: &str, node: Node) -> (String, MetadataNode) {
    let tag = node.tag_name();
    let written = source.get(node.range()).and_then(written_names);
    let name = match &written {
        Some((name, _)) if local_part(name) == tag.name() => name.to_string(),
        _ => qualify(node, tag.namespace(), tag.name()),
    };
    let written_attributes = written.map(|(_, attributes)| attributes).unwrap_or_default();
    (name, element_value(source, node, &written_attributes))
}

fn element_value(source: &str, node: Node, written_attributes: &[&str]) -> MetadataNode {
    let mut entries: Vec<(String, MetadataNode)> = node
        .attributes()
        .enumerate()
        .map(|(index, attribute)| {
            let name = written_attributes
                .get(index)
                .filter(|written| local_part(written) == attribute.name())
                .map_or_else(
                    || qualify(node, attribute.namespace(), attribute.name()),
                    |written| written.to_string(),
                );
            (
                format!("@{name}"),
                MetadataNode::Scalar(attribute.value().to_string()),
            )
        })
        .collect();
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let (name, value) = element_entry(source, child);
            insert_child(&mut entries, name, value);
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if entries.is_empty() {
        return MetadataNode::Scalar(text.to_string());
    }
    if !text.is_empty() {
        entries.push((TEXT_KEY.to_string(), MetadataNode::Scalar(text.to_string())));
    }
    MetadataNode::Mapping(entries)
}

/// Element values are never sequences, so an existing sequence under `name`
/// always comes from an earlier repetition.
fn insert_child(entries: &mut Vec<(String, MetadataNode)>, name: String, value: MetadataNode) {
    match entries.iter_mut().find(|(key, _)| *key == name) {
        Some((_, MetadataNode::Sequence(items))) => items.push(value),
        Some((_, existing)) => {
            let first = std::mem::replace(existing, MetadataNode::Sequence(Vec::new()));
            *existing = MetadataNode::Sequence(vec![first, value]);
        }
        None => entries.push((name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_part_strips_prefixes_of_elements_only() {
        assert_eq!(local_part("ds:KeyInfo"), "KeyInfo");
        assert_eq!(local_part("KeyInfo"), "KeyInfo");
        assert_eq!(local_part("@xml:lang"), "@xml:lang");
        assert_eq!(local_part("#text"), "#text");
    }

    #[test]
    fn written_names_skip_namespace_declarations_and_values() {
        let tag = r#"<b:KeyDescriptor xmlns:b="urn:x" use='a > b' xml:lang = "en"/>"#;
        assert_eq!(
            written_names(tag),
            Some(("b:KeyDescriptor", vec!["use", "xml:lang"]))
        );
        assert_eq!(written_names("<Root>text</Root>"), Some(("Root", vec![])));
        assert_eq!(written_names("text"), None);
    }

    #[test]
    fn repeated_children_collapse_into_a_sequence() {
        let mut entries = Vec::new();
        insert_child(&mut entries, "b".into(), MetadataNode::Scalar("1".into()));
        insert_child(&mut entries, "c".into(), MetadataNode::Scalar("x".into()));
        insert_child(&mut entries, "b".into(), MetadataNode::Scalar("2".into()));
        insert_child(&mut entries, "b".into(), MetadataNode::Scalar("3".into()));
        assert_eq!(
            entries,
            vec![
                (
                    "b".to_string(),
                    MetadataNode::Sequence(vec![
                        MetadataNode::Scalar("1".into()),
                        MetadataNode::Scalar("2".into()),
                        MetadataNode::Scalar("3".into()),
                    ])
                ),
                ("c".to_string(), MetadataNode::Scalar("x".into())),
            ]
        );
    }
}
