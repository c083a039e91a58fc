//! Typed model of an annota sidecar document.
//!
//! The types here only describe shape. Cross-annotation rules such as name
//! uniqueness are enforced by [`Asset`](crate::Asset), and the mapping
//! to and from JSON text lives in [`codec`].
//!
//! # Example
//!
//! ```
//! use annota::schema::{codec, AnnotationAttributes};
//!
//! let text = r#"{
//!     "type": "image",
//!     "meta": {
//!         "version": 1,
//!         "tool": "annota",
//!         "tool_version": "0.1.0",
//!         "created_at": "2024-05-01T12:00:00+00:00",
//!         "updated_at": "2024-05-01T12:00:00+00:00"
//!     },
//!     "file": {"width": 1920, "height": 1080},
//!     "annotations": [{
//!         "uuid": "b1c4",
//!         "name": "start_button",
//!         "display_name": "Start",
//!         "attributes": {"type": "box", "geometry": {"x": 0, "y": 0, "width": 10, "height": 5}}
//!     }]
//! }"#;
//!
//! let document = codec::decode_str(text, "<doc>").unwrap();
//! assert!(matches!(document.annotations[0].attributes, AnnotationAttributes::Box(_)));
//! ```

mod attributes;
pub mod codec;
mod geometry;
mod model;

pub use attributes::{AnnotationAttributes, BUILTIN_TYPES};
pub use geometry::{Point, Rect, Vec2};
pub use model::{Annotation, Document, DocumentKind, ImageFile, Meta};

/// Ordered string-keyed JSON object used for open payloads.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// The sidecar format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;
