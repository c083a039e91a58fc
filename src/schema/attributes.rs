//! The tagged union stored under an annotation's `attributes` key.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{self, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::geometry::{Point, Rect, Vec2};
use super::JsonMap;
use crate::error::ValidationError;

/// Type tags with a fixed geometry shape.
pub const BUILTIN_TYPES: [&str; 4] = ["slice", "box", "point", "swipe"];

const BUILTIN_FIELDS: &[&str] = &["type", "geometry"];

/// Per-type annotation payload, selected by the `type` tag.
///
/// Built-in variants encode as `{"type": ..., "geometry": {...}}`. Anything
/// else is [`AnnotationAttributes::Custom`], which keeps the whole object,
/// including its `type` key, exactly as it was read.
///
/// A `Custom` map must not carry one of [`BUILTIN_TYPES`] as its `type`,
/// since it would read back as the built-in variant. Encoding such a map
/// fails.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationAttributes {
    /// A nine-slice style region.
    Slice(Rect),
    Box(Rect),
    Point(Point),
    Swipe(Vec2),
    Custom(JsonMap),
}

impl AnnotationAttributes {
    /// Builds a custom payload tagged with `kind`.
    ///
    /// `fields` must not repeat the `type` key; if it does, `kind` wins.
    ///
    /// # Errors
    /// If `kind` is one of [`BUILTIN_TYPES`].
    pub fn custom(kind: impl Into<String>, fields: JsonMap) -> Result<Self, ValidationError> {
        let kind = kind.into();
        if is_builtin_tag(&kind) {
            return Err(builtin_tag_error(&kind));
        }

        let mut map = JsonMap::new();
        map.insert("type".to_string(), Value::String(kind));
        for (key, value) in fields {
            if key != "type" {
                map.insert(key, value);
            }
        }
        Ok(Self::Custom(map))
    }

    /// The type tag: a built-in literal or the custom payload's `type` string.
    ///
    /// Custom payloads without a string `type` report an empty tag.
    pub fn kind(&self) -> &str {
        match self {
            Self::Slice(_) => "slice",
            Self::Box(_) => "box",
            Self::Point(_) => "point",
            Self::Swipe(_) => "swipe",
            Self::Custom(map) => custom_tag(map).unwrap_or(""),
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

fn custom_tag(map: &JsonMap) -> Option<&str> {
    map.get("type").and_then(Value::as_str)
}

fn is_builtin_tag(tag: &str) -> bool {
    BUILTIN_TYPES.contains(&tag)
}

fn builtin_tag_error(tag: &str) -> ValidationError {
    ValidationError::new(
        "type",
        format!("custom attributes cannot use the built-in type `{}`", tag),
    )
}

impl Serialize for AnnotationAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Slice(rect) => tagged(serializer, "slice", rect),
            Self::Box(rect) => tagged(serializer, "box", rect),
            Self::Point(point) => tagged(serializer, "point", point),
            Self::Swipe(vec) => tagged(serializer, "swipe", vec),
            Self::Custom(map) => match custom_tag(map) {
                Some(tag) if is_builtin_tag(tag) => {
                    Err(ser::Error::custom(builtin_tag_error(tag)))
                }
                _ => map.serialize(serializer),
            },
        }
    }
}

fn tagged<S: Serializer, G: Serialize>(
    serializer: S,
    tag: &str,
    geometry: &G,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("type", tag)?;
    map.serialize_entry("geometry", geometry)?;
    map.end()
}

/// Geometry shape selected by a built-in tag.
#[derive(Clone, Copy, Debug)]
enum Shape {
    Slice,
    Box,
    Point,
    Swipe,
}

impl Shape {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "slice" => Some(Self::Slice),
            "box" => Some(Self::Box),
            "point" => Some(Self::Point),
            "swipe" => Some(Self::Swipe),
            _ => None,
        }
    }

    /// Reads the geometry straight from the map so errors keep their path.
    fn next_geometry<'de, A: MapAccess<'de>>(
        self,
        access: &mut A,
    ) -> Result<AnnotationAttributes, A::Error> {
        Ok(match self {
            Self::Slice => AnnotationAttributes::Slice(access.next_value()?),
            Self::Box => AnnotationAttributes::Box(access.next_value()?),
            Self::Point => AnnotationAttributes::Point(access.next_value()?),
            Self::Swipe => AnnotationAttributes::Swipe(access.next_value()?),
        })
    }

    /// For geometry that appeared before the `type` key.
    fn from_value(self, value: Value) -> Result<AnnotationAttributes, serde_json::Error> {
        Ok(match self {
            Self::Slice => AnnotationAttributes::Slice(Rect::deserialize(value)?),
            Self::Box => AnnotationAttributes::Box(Rect::deserialize(value)?),
            Self::Point => AnnotationAttributes::Point(Point::deserialize(value)?),
            Self::Swipe => AnnotationAttributes::Swipe(Vec2::deserialize(value)?),
        })
    }
}

/// Dispatches on the `type` tag only. A built-in tag with the wrong payload
/// is an error, never a fallback to [`AnnotationAttributes::Custom`].
impl<'de> Deserialize<'de> for AnnotationAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributesVisitor)
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = AnnotationAttributes;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an attributes object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut fields = JsonMap::new();
        let mut shape: Option<Shape> = None;
        let mut geometry: Option<AnnotationAttributes> = None;

        while let Some(key) = access.next_key::<String>()? {
            if let (Some(shape), "geometry") = (shape, key.as_str()) {
                geometry = Some(shape.next_geometry(&mut access)?);
                continue;
            }
            let value: Value = access.next_value()?;
            if key == "type" {
                shape = value.as_str().and_then(Shape::from_tag);
            }
            fields.insert(key, value);
        }

        let Some(shape) = shape else {
            return Ok(AnnotationAttributes::Custom(fields));
        };

        if let Some(key) = fields.keys().find(|key| !BUILTIN_FIELDS.contains(&key.as_str())) {
            return Err(de::Error::unknown_field(key, BUILTIN_FIELDS));
        }
        match (geometry, fields.remove("geometry")) {
            (Some(geometry), _) => Ok(geometry),
            (None, Some(value)) => shape.from_value(value).map_err(de::Error::custom),
            (None, None) => Err(de::Error::missing_field("geometry")),
        }
    }
}
