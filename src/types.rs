//! Core types: field specs, records, and fetch requests

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Fields extracted when a request names none
pub const DEFAULT_FIELDS: [&str; 4] = ["title", "link", "description", "image"];

/// Anchor field for the default field set; its occurrence count is the record count
pub const DEFAULT_ANCHOR: &str = "title";

/// Ordered, duplicate-free list of element names to extract
///
/// An empty spec means "use [`DEFAULT_FIELDS`]". The order of names fixes the
/// key set of each record and, for explicit specs, which field anchors the
/// record count (the first one). It does not influence record order, which is
/// always document order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    names: Vec<String>,
}

impl FieldSpec {
    /// Build a spec from element names.
    ///
    /// Repeated names are dropped after their first occurrence. Blank names are
    /// rejected since no element can match them.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Vec::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(Error::config("field names must not be blank", "fields"));
            }
            if !spec.contains(&name) {
                spec.push(name);
            }
        }
        Ok(Self { names: spec })
    }

    /// The built-in `title, link, description, image` set
    pub fn defaults() -> Self {
        Self {
            names: DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True when no names were given and the defaults apply
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of names in the spec
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Names in declared order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns true if `name` is one of the requested fields
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Resolve the spec into the names to track and the anchor field.
    ///
    /// Explicit specs anchor on their first name; the empty spec expands to
    /// the defaults anchored on `title`.
    pub(crate) fn resolve(&self) -> (FieldSpec, String) {
        match self.names.first() {
            Some(first) => (self.clone(), first.clone()),
            None => (Self::defaults(), DEFAULT_ANCHOR.to_string()),
        }
    }
}

/// One zipped tuple: field name to the value found at the same occurrence index
///
/// A field whose value list is shorter than the anchor's is absent from the
/// record rather than mapped to a placeholder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    /// Value for `field`, if the field was present at this index
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Returns true if the record carries `field`
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(field, value)` pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume the record into its underlying map
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }

    pub(crate) fn insert(&mut self, field: String, value: String) {
        self.values.insert(field, value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Records in document order; an immutable snapshot once returned
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// An empty set, as produced for the "no results" sentinel
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Iterate records in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Borrow all records
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Consume into a plain vector
    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl std::ops::Index<usize> for RecordSet {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

/// Result of one fetch: the full record set, or the failure that stopped it
pub type FetchOutcome = Result<RecordSet>;

/// HTTP Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username sent before the colon
    pub username: String,
    /// Password sent after the colon
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything one fetch needs: where, as whom, and which fields
#[derive(Clone, Debug)]
pub struct FetchRequest {
    url: Url,
    credentials: Option<Credentials>,
    fields: FieldSpec,
}

impl FetchRequest {
    /// Request `url` anonymously with the default field set
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            credentials: None,
            fields: FieldSpec::default(),
        })
    }

    /// Attach HTTP Basic credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Replace the field spec
    pub fn with_fields(mut self, fields: FieldSpec) -> Self {
        self.fields = fields;
        self
    }

    /// Target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Credentials, if any
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Requested fields (empty means defaults)
    pub fn fields(&self) -> &FieldSpec {
        &self.fields
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_spec_drops_repeats_keeping_first_position() {
        let spec = FieldSpec::new(["link", "title", "link", "guid", "title"]).unwrap();
        assert_eq!(spec.names(), ["link", "title", "guid"]);
        assert!(spec.contains("guid"));
        assert!(!spec.contains("image"));
    }

    #[test]
    fn field_spec_rejects_blank_names() {
        let err = FieldSpec::new(["title", " "]).unwrap_err();
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn empty_spec_resolves_to_defaults_anchored_on_title() {
        let (fields, anchor) = FieldSpec::default().resolve();
        assert_eq!(fields.names(), DEFAULT_FIELDS);
        assert_eq!(anchor, "title");
    }

    #[test]
    fn explicit_spec_anchors_on_first_name() {
        let (fields, anchor) = FieldSpec::new(["guid", "title"]).unwrap().resolve();
        assert_eq!(fields.names(), ["guid", "title"]);
        assert_eq!(anchor, "guid");
    }

    #[test]
    fn record_serializes_as_plain_map() {
        let record: Record = [("title", "A"), ("link", "L1")].into_iter().collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"link":"L1","title":"A"}"#);

        let map = record.into_inner();
        assert_eq!(map.get("title").map(String::as_str), Some("A"));
    }

    #[test]
    fn record_set_exposes_records_in_order() {
        let records: RecordSet = vec![
            [("title", "A")].into_iter().collect::<Record>(),
            [("title", "B")].into_iter().collect::<Record>(),
        ]
        .into();

        let titles: Vec<_> = records.as_slice().iter().map(|r| r.get("title")).collect();
        assert_eq!(titles, [Some("A"), Some("B")]);

        let owned = records.into_vec();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[1].get("title"), Some("B"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("u", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("\"u\""));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn fetch_request_rejects_unparseable_url() {
        let err = FetchRequest::new("::not-a-url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn fetch_request_builder_keeps_parts() {
        let request = FetchRequest::new("https://feeds.test/rss")
            .unwrap()
            .with_credentials("u", "p")
            .with_fields(FieldSpec::new(["title"]).unwrap());

        assert_eq!(request.url().as_str(), "https://feeds.test/rss");
        assert_eq!(request.credentials().unwrap().username, "u");
        assert_eq!(request.fields().names(), ["title"]);
    }
}
