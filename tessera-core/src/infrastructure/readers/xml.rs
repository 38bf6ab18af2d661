// tessera-core/src/infrastructure/readers/xml.rs

use crate::domain::settings::SettingsStore;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::reader::SourceRecord;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

/// One element of an owned XML tree. Source documents are parsed fully into
/// this shape so they can move across worker tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Text directly inside this element, children excluded.
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All text under this element, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.collect_descendants(name, out);
        }
    }
}

/// An owned, opaque-to-the-core XML source item with a small path query
/// language for extraction rules: `//name` (any depth), `/root/a/b`
/// (absolute), with an optional `/@attr` leaf for attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlNode,
}

impl XmlDocument {
    pub fn parse(xml: &str, strip_namespaces: bool) -> Result<Self, InfrastructureError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(node_from_start(&start, strip_namespaces)?);
                }
                Event::Empty(start) => {
                    let node = node_from_start(&start, strip_namespaces)?;
                    attach(node, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::End(_) => {
                    if let Some(node) = stack.pop() {
                        attach(node, &mut stack, &mut root);
                    }
                }
                Event::Eof => break,
                // Declarations, comments and processing instructions carry
                // nothing the extraction rules look at.
                _ => {}
            }
        }

        match root {
            Some(root) => Ok(Self { root }),
            None => Err(InfrastructureError::Config(
                "XML document has no root element".into(),
            )),
        }
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// Evaluate a path query and return the matched string values: attribute
    /// values for an `/@attr` leaf, trimmed text content otherwise.
    pub fn select(&self, path: &str) -> Vec<String> {
        let (node_path, attribute) = match path.rsplit_once("/@") {
            Some((node_path, attribute)) => (node_path, Some(attribute)),
            None => (path, None),
        };

        let nodes = self.select_nodes(node_path);
        nodes
            .into_iter()
            .filter_map(|node| match attribute {
                Some(attribute) => node.attribute(attribute).map(str::to_string),
                None => Some(node.text_content().trim().to_string()),
            })
            .collect()
    }

    fn select_nodes(&self, path: &str) -> Vec<&XmlNode> {
        let (first, rest) = if let Some(stripped) = path.strip_prefix("//") {
            let mut segments = stripped.split('/');
            let Some(first) = segments.next() else {
                return Vec::new();
            };
            let mut seeds = Vec::new();
            self.root.collect_descendants(first, &mut seeds);
            (seeds, segments)
        } else if let Some(stripped) = path.strip_prefix('/') {
            let mut segments = stripped.split('/');
            let Some(first) = segments.next() else {
                return Vec::new();
            };
            let seeds = if self.root.name == first {
                vec![&self.root]
            } else {
                Vec::new()
            };
            (seeds, segments)
        } else {
            return Vec::new();
        };

        let mut current = first;
        for segment in rest {
            if segment.is_empty() {
                continue;
            }
            current = current
                .iter()
                .flat_map(|node| node.children.iter().filter(|child| child.name == segment))
                .collect();
        }
        current
    }
}

fn node_from_start(
    start: &BytesStart<'_>,
    strip_namespaces: bool,
) -> Result<XmlNode, InfrastructureError> {
    let name = local_name(
        &String::from_utf8_lossy(start.name().as_ref()),
        strip_namespaces,
    );
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
        if strip_namespaces && (key == "xmlns" || key.starts_with("xmlns:")) {
            continue;
        }
        let value = attribute.unescape_value()?.to_string();
        attributes.push((local_name(&key, strip_namespaces), value));
    }
    Ok(XmlNode::new(name, attributes))
}

fn local_name(name: &str, strip_namespaces: bool) -> String {
    if strip_namespaces {
        name.rsplit(':').next().unwrap_or(name).to_string()
    } else {
        name.to_string()
    }
}

fn attach(node: XmlNode, stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            // Keep the first root element; anything after it is malformed
            // trailing content and ignored.
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

/// Reads source items from XML files. Directories are expanded recursively to
/// their `.xml` files. A file that fails to read or parse is logged and
/// skipped; the reader never aborts the run. The external id of each record
/// is the file stem.
pub struct XmlReader {
    files: VecDeque<PathBuf>,
    strip_namespaces: bool,
}

impl XmlReader {
    pub fn new(settings: &SettingsStore, paths: &[PathBuf]) -> Self {
        let mut files = VecDeque::new();
        for path in paths {
            if path.is_dir() {
                for entry in WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                {
                    if entry.path().is_file()
                        && entry.path().extension().and_then(|e| e.to_str()) == Some("xml")
                    {
                        files.push_back(entry.path().to_path_buf());
                    }
                }
            } else {
                files.push_back(path.clone());
            }
        }
        Self {
            files,
            strip_namespaces: settings.get_flag("remove_xml_namespaces"),
        }
    }

    fn read_one(&self, path: &Path) -> Result<XmlDocument, InfrastructureError> {
        let content = fs::read_to_string(path)?;
        XmlDocument::parse(&content, self.strip_namespaces)
    }
}

impl Iterator for XmlReader {
    type Item = SourceRecord<XmlDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.files.pop_front() {
            match self.read_one(&path) {
                Ok(document) => {
                    let item_id = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.to_string_lossy().to_string());
                    return Some(SourceRecord::new(document, item_id));
                }
                Err(err) => {
                    error!(file = %path.display(), error = %err, "problem processing file");
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const PERSON: &str = r#"<?xml version="1.0"?>
<person id="p42">
  <name>Ada</name>
  <dates><birth>1823</birth><death>1899</death></dates>
  <note>first <b>annotated</b> note</note>
</person>"#;

    #[test]
    fn test_descendant_and_absolute_paths() {
        let doc = XmlDocument::parse(PERSON, false).unwrap();
        assert_eq!(doc.select("//birth"), vec!["1823"]);
        assert_eq!(doc.select("/person/dates/death"), vec!["1899"]);
        assert_eq!(doc.select("//dates/birth"), vec!["1823"]);
        assert!(doc.select("/wrong/dates").is_empty());
        assert!(doc.select("//no_such").is_empty());
    }

    #[test]
    fn test_attribute_leaf() {
        let doc = XmlDocument::parse(PERSON, false).unwrap();
        assert_eq!(doc.select("/person/@id"), vec!["p42"]);
        assert!(doc.select("/person/@missing").is_empty());
    }

    #[test]
    fn test_text_content_spans_children() {
        let doc = XmlDocument::parse(PERSON, false).unwrap();
        assert_eq!(doc.select("//note"), vec!["first annotated note"]);
    }

    #[test]
    fn test_namespace_stripping() {
        let xml = r#"<dc:record xmlns:dc="http://purl.org/dc/"><dc:title>Letters</dc:title></dc:record>"#;
        let stripped = XmlDocument::parse(xml, true).unwrap();
        assert_eq!(stripped.select("//title"), vec!["Letters"]);
        let kept = XmlDocument::parse(xml, false).unwrap();
        assert!(kept.select("//title").is_empty());
        assert_eq!(kept.select("//dc:title"), vec!["Letters"]);
    }

    #[test]
    fn test_reader_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("person_good.xml");
        std::fs::File::create(&good)
            .unwrap()
            .write_all(PERSON.as_bytes())
            .unwrap();
        let bad = dir.path().join("person_bad.xml");
        std::fs::File::create(&bad)
            .unwrap()
            .write_all(b"<broken><unclosed>")
            .unwrap();

        let reader = XmlReader::new(&SettingsStore::new(), &[dir.path().to_path_buf()]);
        let records: Vec<_> = reader.collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_id, "person_good");
    }
}
