//! Parser for Illumina `RunInfo.xml` run descriptors.
//!
//! ```xml
//! <RunInfo Version="2">
//!   <Run Id="120829_SN0001_0123_AC0UUUACXX" Number="123">
//!     <Flowcell>C0UUUACXX</Flowcell>
//!     <Instrument>SN0001</Instrument>
//!     <Date>120829</Date>
//!     <Reads>
//!       <Read Number="1" NumCycles="101" IsIndexedRead="N" />
//!       <Read Number="2" NumCycles="7" IsIndexedRead="Y" />
//!     </Reads>
//!     <FlowcellLayout LaneCount="8" SurfaceCount="2" SwathCount="3" TileCount="16" />
//!   </Run>
//! </RunInfo>
//! ```
//!
//! The file is read in a single pass of XML events. Attributes are kept as
//! strings; nothing is interpreted beyond locating the values.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::parsing::ParseError;
use crate::utils::xml::{attribute_map, tag_name};

/// Run identity, instrument and read layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowcell: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Attributes of the `FlowcellLayout` element
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flowcell_layout: BTreeMap<String, String>,

    /// Attributes of each `Read` element, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reads: Vec<BTreeMap<String, String>>,
}

impl RunInfo {
    /// Placeholder identity used until a run descriptor has been read
    #[must_use]
    pub fn placeholder(id: &str, flowcell: &str, date: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            flowcell: Some(flowcell.to_string()),
            date: Some(date.to_string()),
            instrument: Some("NA".to_string()),
            ..Self::default()
        }
    }
}

/// Elements whose character data is captured
#[derive(Clone, Copy)]
enum TextField {
    Flowcell,
    Instrument,
    Date,
}

impl TextField {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "Flowcell" => Some(Self::Flowcell),
            "Instrument" => Some(Self::Instrument),
            "Date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// Parse a `RunInfo.xml` file.
///
/// A missing file yields an empty [`RunInfo`] rather than an error.
///
/// # Errors
///
/// Returns `ParseError::Io` if an existing file cannot be read, or
/// `ParseError::Xml` if the document is not well formed.
pub fn parse_run_info_file(path: &Path) -> Result<RunInfo, ParseError> {
    if !path.exists() {
        return Ok(RunInfo::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_run_info_text(&content)
}

/// Parse a run descriptor from XML text
///
/// # Errors
///
/// Returns `ParseError::Xml` if the document is not well formed.
pub fn parse_run_info_text(text: &str) -> Result<RunInfo, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut info = RunInfo::default();
    let mut current: Option<TextField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(tag) => {
                let name = tag_name(&tag);
                current = TextField::from_tag(&name);
                apply_element(&mut info, &name, &tag)?;
            }
            Event::Empty(tag) => {
                current = None;
                apply_element(&mut info, &tag_name(&tag), &tag)?;
            }
            Event::Text(text) => {
                if let Some(field) = current {
                    let value = Some(text.unescape()?.into_owned());
                    match field {
                        TextField::Flowcell => info.flowcell = value,
                        TextField::Instrument => info.instrument = value,
                        TextField::Date => info.date = value,
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(info)
}

fn apply_element(
    info: &mut RunInfo,
    name: &str,
    tag: &quick_xml::events::BytesStart<'_>,
) -> Result<(), ParseError> {
    match name {
        "Run" => {
            let mut attrs = attribute_map(tag)?;
            info.id = attrs.remove("Id");
            info.number = attrs.remove("Number");
        }
        "FlowcellLayout" => info.flowcell_layout = attribute_map(tag)?,
        "Read" => info.reads.push(attribute_map(tag)?),
        _ => {}
    }
    Ok(())
}
