#![allow(dead_code)]

use std::collections::BTreeMap;

use annota::schema::{
    Annotation, AnnotationAttributes, Document, DocumentKind, ImageFile, JsonMap, Meta, Point,
    Rect, Vec2, BUILTIN_TYPES, FORMAT_VERSION,
};
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::Value;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

fn coord() -> impl Strategy<Value = i64> {
    -10_000i64..=10_000
}

pub fn arb_rect() -> impl Strategy<Value = Rect> {
    (coord(), coord(), 0i64..=4096, 0i64..=4096).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

pub fn arb_point() -> impl Strategy<Value = Point> {
    (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
}

pub fn arb_vec2() -> impl Strategy<Value = Vec2> {
    (coord(), coord(), coord(), coord()).prop_map(|(x1, y1, x2, y2)| Vec2::new(x1, y1, x2, y2))
}

pub fn arb_json_value() -> BoxedStrategy<Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>().prop_filter_map("JSON has no NaN or infinity", |f| {
            serde_json::Number::from_f64(f).map(Value::Number)
        }),
        "[ -~]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map("[a-z_]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
    .boxed()
}

pub fn arb_json_map() -> BoxedStrategy<JsonMap> {
    proptest::collection::btree_map("[a-z_]{1,8}", arb_json_value(), 0..5)
        .prop_map(|map: BTreeMap<String, Value>| map.into_iter().collect())
        .boxed()
}

/// Any tag `AnnotationAttributes::custom` accepts.
fn custom_tag() -> impl Strategy<Value = String> {
    "[a-z_]{1,10}".prop_filter("built-in tags are rejected by custom()", |tag| {
        !BUILTIN_TYPES.contains(&tag.as_str())
    })
}

pub fn arb_attributes() -> BoxedStrategy<AnnotationAttributes> {
    prop_oneof![
        arb_rect().prop_map(AnnotationAttributes::Slice),
        arb_rect().prop_map(AnnotationAttributes::Box),
        arb_point().prop_map(AnnotationAttributes::Point),
        arb_vec2().prop_map(AnnotationAttributes::Swipe),
        (custom_tag(), arb_json_map())
            .prop_map(|(tag, fields)| {
                AnnotationAttributes::custom(tag, fields).expect("non built-in tag")
            }),
    ]
    .boxed()
}

pub fn arb_annotation(name: String) -> BoxedStrategy<Annotation> {
    (
        "[0-9a-f]{8}",
        "[A-Za-z ]{0,16}",
        proptest::option::of("[ -~]{0,24}"),
        arb_attributes(),
        proptest::option::of(arb_json_map()),
    )
        .prop_map(
            move |(uuid, display_name, description, attributes, extra)| Annotation {
                uuid,
                name: name.clone(),
                display_name,
                description,
                attributes,
                extra,
            },
        )
        .boxed()
}

pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=4_102_444_800, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        DateTime::from_timestamp(secs, nanos).expect("timestamp in range")
    })
}

pub fn arb_meta() -> impl Strategy<Value = Meta> {
    (
        "[a-z-]{1,12}",
        "[0-9]\\.[0-9]\\.[0-9]",
        arb_timestamp(),
        arb_timestamp(),
    )
        .prop_map(|(tool, tool_version, created_at, updated_at)| Meta {
            version: FORMAT_VERSION,
            tool,
            tool_version,
            created_at,
            updated_at,
        })
}

pub fn arb_kind() -> impl Strategy<Value = DocumentKind> {
    prop_oneof![
        3 => Just(DocumentKind::Image),
        1 => "[a-z]{3,8}".prop_map(|tag| DocumentKind::from(tag.as_str())),
    ]
}

/// Documents whose annotation names are unique.
pub fn arb_document(max_anns: usize) -> BoxedStrategy<Document> {
    (
        arb_kind(),
        arb_meta(),
        (1u32..=8192, 1u32..=8192),
        proptest::collection::btree_set("[a-z][a-z0-9_]{0,10}", 0..=max_anns),
    )
        .prop_flat_map(|(kind, meta, (width, height), names)| {
            let annotations: Vec<_> = names.into_iter().map(arb_annotation).collect();
            (
                Just(kind),
                Just(meta),
                Just(ImageFile::new(width, height)),
                annotations,
            )
        })
        .prop_map(|(kind, meta, file, annotations)| Document {
            kind,
            meta,
            file,
            annotations,
        })
        .boxed()
}
