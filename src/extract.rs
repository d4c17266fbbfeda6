//! Event-driven field extraction
//!
//! The extractor walks a stream of pull-parser events and keeps, per requested
//! element name, the values seen at each closing tag in document order. When
//! the stream ends the per-field lists are zipped into records.
//!
//! Text capture is deliberately simple: the most recent text event before an
//! end tag is what that end tag captures. For leaf elements like
//! `<title>A</title>` this is exactly the element's content. For container
//! elements, or self-closing elements such as `<image/>`, the captured value is
//! whatever text came last before the close (often inter-element whitespace or
//! a preceding sibling's text). That limitation is kept on purpose, since
//! smarter association would change which values come out.
//!
//! # Example
//!
//! ```
//! use feedfields::extract::FieldExtractor;
//! use feedfields::FieldSpec;
//!
//! let xml = "<items><item><title>A</title><link>L1</link></item>\
//!            <item><title>B</title><link>L2</link></item></items>";
//! let extractor = FieldExtractor::new(FieldSpec::new(["title", "link"]).unwrap());
//! let records = extractor.extract_str(xml).unwrap();
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].get("link"), Some("L2"));
//! ```

use crate::error::{Error, Result};
use crate::types::{FieldSpec, Record, RecordSet};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// One pull-parser event, owned
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlEvent {
    /// An element opened (self-closing elements produce a start and an end)
    StartTag(String),
    /// Character data; adjacent text and CDATA runs arrive merged
    Text(String),
    /// An element closed
    EndTag(String),
    /// No more events
    EndDocument,
}

/// Source of pull-parser events
///
/// The extractor only needs "give me the next event"; any tokenizer can sit
/// behind this trait. After [`XmlEvent::EndDocument`] has been returned the
/// source is not polled again.
pub trait EventSource {
    /// Advance to the next event
    fn next_event(&mut self) -> Result<XmlEvent>;
}

/// [`EventSource`] over an in-memory document, backed by `quick_xml`
///
/// Names are reported as raw qualified names (`media:content`); no namespace
/// processing takes place. Well-formedness is enforced: malformed markup,
/// mismatched end tags, elements still open at end of input, text outside the
/// root element, a second root element and non-blank input without any
/// element are all [`Error::Xml`]. Input that is empty or only whitespace is an
/// empty document.
pub struct XmlEvents<'a> {
    reader: Reader<&'a [u8]>,
    queued: VecDeque<XmlEvent>,
    open: Vec<String>,
    blank: bool,
    root: RootState,
}

/// Where the tokenizer stands relative to the single root element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RootState {
    Before,
    Inside,
    After,
}

impl<'a> XmlEvents<'a> {
    /// Tokenize `xml`
    pub fn new(xml: &'a str) -> Self {
        Self::from_bytes(xml.as_bytes())
    }

    /// Tokenize UTF-8 bytes
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(bytes);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = true;
        config.expand_empty_elements = false;
        Self {
            reader,
            queued: VecDeque::new(),
            open: Vec::new(),
            blank: bytes.iter().all(u8::is_ascii_whitespace),
            root: RootState::Before,
        }
    }

    /// Error reported by the reader itself, at the offset it recorded
    fn reader_error(&self, message: impl Into<String>) -> Error {
        Error::Xml {
            message: message.into(),
            position: self.reader.error_position() as u64,
        }
    }

    /// Error detected here, at the reader's current offset
    fn xml_error(&self, message: impl Into<String>) -> Error {
        Error::Xml {
            message: message.into(),
            position: self.reader.buffer_position() as u64,
        }
    }

    fn check_text_placement(&self, chunk: &str) -> Result<()> {
        if self.open.is_empty() && !chunk.trim().is_empty() {
            return Err(self.xml_error("text not allowed outside root element"));
        }
        Ok(())
    }

    fn open_element(&mut self, name: &str) -> Result<()> {
        if self.root == RootState::After {
            return Err(self.xml_error(format!(
                "second root element <{name}> after the document element closed"
            )));
        }
        self.root = RootState::Inside;
        Ok(())
    }

    /// Queue `events` behind any pending text and hand back whichever comes first.
    fn emit(
        &mut self,
        text: Option<String>,
        events: impl IntoIterator<Item = XmlEvent>,
    ) -> XmlEvent {
        self.queued.extend(events);
        match text {
            Some(text) => XmlEvent::Text(text),
            // `events` always carries at least one item
            None => self.queued.pop_front().unwrap_or(XmlEvent::EndDocument),
        }
    }
}

fn element_name(raw: &[u8]) -> Result<String> {
    Ok(String::from_utf8(raw.to_vec())?)
}

impl EventSource for XmlEvents<'_> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Ok(event);
        }

        let mut text: Option<String> = None;
        loop {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => return Err(self.reader_error(e.to_string())),
            };

            match event {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| self.xml_error(e.to_string()))?;
                    self.check_text_placement(&unescaped)?;
                    text.get_or_insert_with(String::new).push_str(&unescaped);
                }
                Event::CData(c) => {
                    let chunk = String::from_utf8(c.into_inner().into_owned())?;
                    self.check_text_placement(&chunk)?;
                    text.get_or_insert_with(String::new).push_str(&chunk);
                }
                Event::Start(e) => {
                    let name = element_name(e.name().as_ref())?;
                    self.open_element(&name)?;
                    self.open.push(name.clone());
                    return Ok(self.emit(text, [XmlEvent::StartTag(name)]));
                }
                Event::Empty(e) => {
                    let name = element_name(e.name().as_ref())?;
                    self.open_element(&name)?;
                    if self.open.is_empty() {
                        self.root = RootState::After;
                    }
                    return Ok(self.emit(
                        text,
                        [XmlEvent::StartTag(name.clone()), XmlEvent::EndTag(name)],
                    ));
                }
                Event::End(e) => {
                    let name = element_name(e.name().as_ref())?;
                    self.open.pop();
                    if self.open.is_empty() {
                        self.root = RootState::After;
                    }
                    return Ok(self.emit(text, [XmlEvent::EndTag(name)]));
                }
                Event::Eof => {
                    if let Some(unclosed) = self.open.last() {
                        return Err(self.xml_error(format!(
                            "unexpected end of document: <{unclosed}> not closed"
                        )));
                    }
                    if self.root == RootState::Before && !self.blank {
                        return Err(self.xml_error("document has no root element"));
                    }
                    return Ok(self.emit(text, [XmlEvent::EndDocument]));
                }
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }
    }
}

/// Per-parse accumulator: field name to values in document order
///
/// Lists are keyed by name, not by position in the spec. A table is built
/// fresh for each parse and consumed when records are assembled.
#[derive(Clone, Debug)]
pub struct FieldValueTable {
    fields: FieldSpec,
    values: HashMap<String, Vec<String>>,
}

impl FieldValueTable {
    /// Empty lists for every name in `fields`
    pub fn new(fields: &FieldSpec) -> Self {
        let values = fields
            .names()
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        Self {
            fields: fields.clone(),
            values,
        }
    }

    /// Append `text` to `field`'s list. Returns false if `field` is not tracked.
    pub fn record(&mut self, field: &str, text: &str) -> bool {
        match self.values.get_mut(field) {
            Some(list) => {
                list.push(text.to_string());
                true
            }
            None => false,
        }
    }

    /// Values collected for `field` so far
    pub fn values(&self, field: &str) -> &[String] {
        self.values.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Zip the lists into records.
    ///
    /// The record count is the length of `anchor`'s list. Fields with fewer
    /// values are left out of the trailing records; values beyond the
    /// anchor's count are dropped.
    pub fn into_records(mut self, anchor: &str) -> RecordSet {
        let count = self.values(anchor).len();
        let mut records: Vec<Record> = (0..count).map(|_| Record::default()).collect();

        for field in self.fields.names() {
            let Some(list) = self.values.remove(field) else {
                continue;
            };
            for (record, value) in records.iter_mut().zip(list) {
                record.insert(field.clone(), value);
            }
        }

        RecordSet::from(records)
    }
}

/// Extracts records for one field spec
///
/// Holds no per-parse state: every call to [`extract`](Self::extract) builds
/// its own [`FieldValueTable`], so one extractor can serve any number of
/// sequential or concurrent parses.
#[derive(Clone, Debug)]
pub struct FieldExtractor {
    fields: FieldSpec,
    anchor: String,
}

impl FieldExtractor {
    /// Extractor for `fields`; an empty spec selects the defaults anchored on `title`
    pub fn new(fields: FieldSpec) -> Self {
        let (fields, anchor) = fields.resolve();
        Self { fields, anchor }
    }

    /// The names this extractor tracks after default expansion
    pub fn fields(&self) -> &FieldSpec {
        &self.fields
    }

    /// The field whose occurrence count decides the record count
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Drain `source` to end of document and assemble records.
    ///
    /// A tokenizer error aborts the parse; nothing collected before the error
    /// is returned.
    pub fn extract<S: EventSource + ?Sized>(&self, source: &mut S) -> Result<RecordSet> {
        let mut table = FieldValueTable::new(&self.fields);
        let mut pending = String::new();

        loop {
            match source.next_event()? {
                XmlEvent::StartTag(_) => {}
                XmlEvent::Text(text) => pending = text,
                XmlEvent::EndTag(name) => {
                    if table.record(&name, &pending) {
                        trace!(field = %name, "captured value");
                    }
                }
                XmlEvent::EndDocument => break,
            }
        }

        Ok(table.into_records(&self.anchor))
    }

    /// Tokenize `xml` and extract from it
    pub fn extract_str(&self, xml: &str) -> Result<RecordSet> {
        self.extract(&mut XmlEvents::new(xml))
    }
}
