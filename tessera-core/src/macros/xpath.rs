// tessera-core/src/macros/xpath.rs

use crate::domain::rules::extract::Extract;
use crate::infrastructure::readers::xml::XmlDocument;
use serde_json::Value;

/// Extraction step that evaluates a path query against the source document
/// and appends every matched value as a string.
///
/// This is the workhorse of XML mapping declarations:
///
/// ```ignore
/// scope.to_field("identifier", Some(extract_xpath("//person/@id")), None)?;
/// ```
pub fn extract_xpath(path: impl Into<String>) -> Extract<XmlDocument> {
    let path = path.into();
    Extract::with_item(move |document: &XmlDocument, accumulator| {
        for value in document.select(&path) {
            accumulator.push(Value::String(value));
        }
        Ok(())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::context::Context;

    const RECORD: &str = r#"<person id="p42">
  <name>Ada</name>
  <tag>math</tag>
  <tag>letters</tag>
</person>"#;

    #[test]
    fn test_extracts_every_match() {
        let doc = XmlDocument::parse(RECORD, false).unwrap();
        let mut ctx = Context::for_tests(doc.clone());
        let mut acc = Vec::new();
        extract_xpath("//tag").run(&doc, &mut acc, &mut ctx).unwrap();
        assert_eq!(acc, vec!["math", "letters"]);
    }

    #[test]
    fn test_attribute_query_and_empty_result() {
        let doc = XmlDocument::parse(RECORD, false).unwrap();
        let mut ctx = Context::for_tests(doc.clone());

        let mut acc = Vec::new();
        extract_xpath("/person/@id")
            .run(&doc, &mut acc, &mut ctx)
            .unwrap();
        assert_eq!(acc, vec!["p42"]);

        let mut acc = Vec::new();
        extract_xpath("//nothing")
            .run(&doc, &mut acc, &mut ctx)
            .unwrap();
        assert!(acc.is_empty());
    }
}
