//! NZB document model and XML round trip.
//!
//! An NZB document is an XML description of a multi-part Usenet download: a
//! `<head>` block with string metadata (`<meta type="password">...`), followed
//! by `<file>` entries carrying newsgroups and article segments. The cleaner
//! only manipulates the metadata mapping; everything else is carried through
//! the parse/serialize round trip untouched and unvalidated.
//!
//! Metadata values are preserved verbatim, including surrounding whitespace.
//! Group names and segment ids are structural tokens and get whitespace
//! trimmed so pretty-printed input round-trips cleanly.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::NzbError;

/// DOCTYPE emitted on serialization, matching the NZB 1.1 DTD.
const NZB_DOCTYPE: &str =
    r#"nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd""#;

/// Namespace declared on the `<nzb>` root element.
const NZB_XMLNS: &str = "http://www.newzbin.com/DTD/2003/nzb";

/// A parsed NZB document.
///
/// The metadata mapping has unique string keys; insertion order is not
/// significant. File entries are opaque payload carried for the round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    meta: BTreeMap<String, String>,
    files: Vec<FileEntry>,
}

/// One `<file>` entry of an NZB document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileEntry {
    pub poster: String,
    pub date: String,
    pub subject: String,
    pub groups: Vec<String>,
    pub segments: Vec<Segment>,
}

/// One `<segment>` of a file entry. Values are kept as raw strings since the
/// payload is never validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub bytes: String,
    pub number: String,
    pub id: String,
}

impl Document {
    /// Returns the metadata value for `key`, if present.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Returns the metadata value for `key` when it is present and non-empty.
    pub fn non_empty_meta(&self, key: &str) -> Option<&str> {
        self.meta_value(key).filter(|value| !value.is_empty())
    }

    /// Sets (or replaces) a metadata entry.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Removes a metadata entry. Removing an absent key is a no-op.
    pub fn remove_meta(&mut self, key: &str) {
        self.meta.remove(key);
    }

    /// Number of metadata entries.
    pub fn meta_len(&self) -> usize {
        self.meta.len()
    }

    /// The file entries of the document.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Appends a file entry. Used by the parser and by tests building
    /// documents by hand.
    pub fn push_file(&mut self, file: FileEntry) {
        self.files.push(file);
    }
}

/// Parses an NZB document from its XML text.
///
/// Parsing is namespace-agnostic (element local names are matched) and
/// lenient about unknown elements, which are skipped. Self-closing forms of
/// the known elements are honored, and CDATA sections count as character
/// data. A document without an `<nzb>` root element is rejected as malformed.
pub fn parse(input: &str) -> Result<Document, NzbError> {
    let mut reader = Reader::from_str(input);

    let mut doc = Document::default();
    let mut saw_root = false;
    let mut current_meta_key: Option<String> = None;
    let mut current_file: Option<FileEntry> = None;
    let mut current_segment: Option<Segment> = None;
    let mut in_group = false;
    // Accumulates character data of the innermost value-bearing element, so
    // mixed text and CDATA runs concatenate.
    let mut text_buffer = String::new();

    loop {
        match reader.read_event().map_err(NzbError::Xml)? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"nzb" => saw_root = true,
                b"meta" => {
                    current_meta_key = attribute_value(&element, "type")?;
                    text_buffer.clear();
                }
                b"file" => current_file = Some(file_entry(&element)?),
                b"group" => {
                    in_group = true;
                    text_buffer.clear();
                }
                b"segment" => {
                    current_segment = Some(segment_entry(&element)?);
                    text_buffer.clear();
                }
                _ => {}
            },
            // Self-closing variants carry their attributes but no text.
            Event::Empty(element) => match element.local_name().as_ref() {
                b"nzb" => saw_root = true,
                b"meta" => {
                    if let Some(key) = attribute_value(&element, "type")? {
                        doc.meta.insert(key, String::new());
                    }
                }
                b"file" => doc.files.push(file_entry(&element)?),
                b"group" => {
                    if let Some(file) = current_file.as_mut() {
                        file.groups.push(String::new());
                    }
                }
                b"segment" => {
                    if let Some(file) = current_file.as_mut() {
                        file.segments.push(segment_entry(&element)?);
                    }
                }
                _ => {}
            },
            Event::Text(text) => {
                if collecting(&current_meta_key, current_segment.as_ref(), in_group) {
                    let text = text
                        .unescape()
                        .map_err(quick_xml::Error::from)
                        .map_err(NzbError::Xml)?;
                    text_buffer.push_str(&text);
                }
            }
            // CDATA is character data like any other; its content arrives
            // already unescaped.
            Event::CData(cdata) => {
                if collecting(&current_meta_key, current_segment.as_ref(), in_group) {
                    let bytes = cdata.into_inner();
                    let text = std::str::from_utf8(bytes.as_ref()).map_err(|err| {
                        NzbError::Malformed(format!("CDATA section is not UTF-8: {err}"))
                    })?;
                    text_buffer.push_str(text);
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"meta" => {
                    if let Some(key) = current_meta_key.take() {
                        doc.meta.insert(key, std::mem::take(&mut text_buffer));
                    }
                }
                b"group" => {
                    in_group = false;
                    let group = std::mem::take(&mut text_buffer);
                    if let Some(file) = current_file.as_mut() {
                        file.groups.push(group.trim().to_string());
                    }
                }
                b"segment" => {
                    let segment = current_segment.take();
                    if let (Some(file), Some(mut segment)) = (current_file.as_mut(), segment) {
                        segment.id = std::mem::take(&mut text_buffer).trim().to_string();
                        file.segments.push(segment);
                    }
                }
                b"file" => {
                    if let Some(file) = current_file.take() {
                        doc.files.push(file);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(NzbError::Malformed("missing <nzb> root element".to_string()));
    }

    Ok(doc)
}

/// True while the parser sits inside an element whose character data matters.
fn collecting(meta_key: &Option<String>, segment: Option<&Segment>, in_group: bool) -> bool {
    segment.is_some() || in_group || meta_key.is_some()
}

fn file_entry(element: &BytesStart<'_>) -> Result<FileEntry, NzbError> {
    Ok(FileEntry {
        poster: attribute_value(element, "poster")?.unwrap_or_default(),
        date: attribute_value(element, "date")?.unwrap_or_default(),
        subject: attribute_value(element, "subject")?.unwrap_or_default(),
        ..FileEntry::default()
    })
}

fn segment_entry(element: &BytesStart<'_>) -> Result<Segment, NzbError> {
    Ok(Segment {
        bytes: attribute_value(element, "bytes")?.unwrap_or_default(),
        number: attribute_value(element, "number")?.unwrap_or_default(),
        id: String::new(),
    })
}

/// Serializes a document back to XML text with declaration and DOCTYPE.
pub fn serialize(doc: &Document) -> Result<String, NzbError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(NZB_DOCTYPE)))?;

    let mut root = BytesStart::new("nzb");
    root.push_attribute(("xmlns", NZB_XMLNS));
    writer.write_event(Event::Start(root))?;

    if !doc.meta.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        for (key, value) in &doc.meta {
            let mut meta = BytesStart::new("meta");
            meta.push_attribute(("type", key.as_str()));
            writer.write_event(Event::Start(meta))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new("meta")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;
    }

    for file in &doc.files {
        let mut element = BytesStart::new("file");
        element.push_attribute(("poster", file.poster.as_str()));
        element.push_attribute(("date", file.date.as_str()));
        element.push_attribute(("subject", file.subject.as_str()));
        writer.write_event(Event::Start(element))?;

        writer.write_event(Event::Start(BytesStart::new("groups")))?;
        for group in &file.groups {
            writer.write_event(Event::Start(BytesStart::new("group")))?;
            writer.write_event(Event::Text(BytesText::new(group)))?;
            writer.write_event(Event::End(BytesEnd::new("group")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("groups")))?;

        writer.write_event(Event::Start(BytesStart::new("segments")))?;
        for segment in &file.segments {
            let mut element = BytesStart::new("segment");
            element.push_attribute(("bytes", segment.bytes.as_str()));
            element.push_attribute(("number", segment.number.as_str()));
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Text(BytesText::new(&segment.id)))?;
            writer.write_event(Event::End(BytesEnd::new("segment")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("segments")))?;

        writer.write_event(Event::End(BytesEnd::new("file")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("nzb")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|err| NzbError::Malformed(format!("serialized document is not UTF-8: {err}")))
}

/// Reads and unescapes one attribute of a start element.
fn attribute_value(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, NzbError> {
    match element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)
                .map_err(NzbError::Xml)?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}
