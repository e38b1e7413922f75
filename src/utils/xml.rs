//! Attribute access for quick-xml start tags.

use std::collections::BTreeMap;

use quick_xml::events::BytesStart;

use crate::parsing::ParseError;

/// Collect all attributes of a start tag into a name -> value map.
///
/// # Errors
///
/// Returns `ParseError::Xml` if an attribute is malformed or its value
/// cannot be unescaped.
pub fn attribute_map(tag: &BytesStart<'_>) -> Result<BTreeMap<String, String>, ParseError> {
    let mut attrs = BTreeMap::new();
    for attr in tag.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Local name of a tag as an owned string.
#[must_use]
pub fn tag_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).into_owned()
}
