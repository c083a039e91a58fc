//! Sidecar document model.
//!
//! Field declaration order is the on-disk key order, so keep it stable.
//! Unknown keys on these envelope types are ignored when reading.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::attributes::AnnotationAttributes;
use super::{JsonMap, FORMAT_VERSION};
use crate::env::{IdGenerator, Provenance, UuidV4};

/// Root of a sidecar file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// What kind of asset the sidecar describes.
    #[serde(rename = "type")]
    pub kind: DocumentKind,

    pub meta: Meta,

    pub file: ImageFile,

    /// Annotations in insertion order. Absent means none.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Document {
    /// An empty image document.
    pub fn image(meta: Meta, file: ImageFile) -> Self {
        Self {
            kind: DocumentKind::Image,
            meta,
            file,
            annotations: Vec::new(),
        }
    }
}

/// The document `type` tag. Unknown tags are kept for forward compatibility.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Image,
    Other(String),
}

impl DocumentKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for DocumentKind {
    fn from(tag: &str) -> Self {
        match tag {
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from(tag.as_str()))
    }
}

/// Format and tool provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Sidecar format version.
    pub version: u32,
    pub tool: String,
    pub tool_version: String,
    #[serde(serialize_with = "serialize_utc", deserialize_with = "deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_utc", deserialize_with = "deserialize_utc")]
    pub updated_at: DateTime<Utc>,
}

impl Meta {
    /// Fresh metadata at the current format version, created and updated at `now`.
    pub fn new(provenance: &Provenance, now: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION,
            tool: provenance.tool.clone(),
            tool_version: provenance.tool_version.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Timestamps always carry an explicit `+00:00` offset.
fn serialize_utc<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

/// Any RFC 3339 offset is accepted and normalised to UTC. Timestamps
/// without an offset are rejected.
fn deserialize_utc<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| {
            de::Error::custom(format!(
                "invalid timestamp `{}`, expected RFC 3339 with offset ({})",
                text, err
            ))
        })
}

/// Dimensions of the image the sidecar belongs to. Both are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    #[serde(deserialize_with = "deserialize_dimension")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub height: u32,
}

fn deserialize_dimension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match u32::deserialize(deserializer)? {
        0 => Err(de::Error::invalid_value(
            de::Unexpected::Unsigned(0),
            &"a positive integer",
        )),
        n => Ok(n),
    }
}

impl ImageFile {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One annotated region or gesture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Empty when read from a file that had none; the codec fills it in.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub uuid: String,

    /// Unique within a document. Also used as an identifier in generated code.
    pub name: String,

    /// Label shown in the UI and in generated code comments.
    pub display_name: String,

    pub description: Option<String>,

    pub attributes: AnnotationAttributes,

    /// Caller-defined data, passed through untouched.
    pub extra: Option<JsonMap>,
}

/// `null` reads like an absent field.
fn deserialize_nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Annotation {
    /// Creates an annotation with a random UUID.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        attributes: AnnotationAttributes,
    ) -> Self {
        Self::with_ids(&UuidV4, name, display_name, attributes)
    }

    /// Creates an annotation whose UUID comes from `ids`.
    pub fn with_ids(
        ids: &dyn IdGenerator,
        name: impl Into<String>,
        display_name: impl Into<String>,
        attributes: AnnotationAttributes,
    ) -> Self {
        Self {
            uuid: ids.generate(),
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            attributes,
            extra: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds one key to `extra`, creating the map if needed.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra
            .get_or_insert_with(JsonMap::new)
            .insert(key.into(), value.into());
        self
    }
}
