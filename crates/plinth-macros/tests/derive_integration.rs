//! Integration tests for the derive macros.
//!
//! These tests verify that `#[derive(Input)]` and `#[derive(Walk)]` generate
//! code that compiles against the runtime crate and reports the expected
//! descriptors and locations.

use plinth_bind::{
    describe, BindContext, BindContextBuilder, ErrorDetail, ErrorSink, IntWidth, ParamKind,
    Resolve, ResolveScope, Source, Walk, Walker,
};
use plinth_macros::{Input, Walk};
use serde::Deserialize;
use serde_json::{json, Value};

/// Flags every value it is attached to.
#[derive(Debug, Default, Deserialize, Walk)]
#[walk(resolve)]
struct Marker {
    label: String,
}

impl Resolve for Marker {
    fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
        errors.add_error(ErrorDetail::new("marked", "", self.label.clone()));
    }
}

fn visit(value: &dyn Walk) -> Vec<String> {
    let ctx = BindContextBuilder::new().build();
    let mut sink = ErrorSink::new();
    let mut walker = Walker::new(&ctx, &mut sink, 16);
    walker.visit(value);
    walker.finish().unwrap();
    sink.errors().iter().map(|e| e.location.clone()).collect()
}

fn page_schema() -> Value {
    json!({"minimum": 1})
}

#[derive(Debug, Input)]
struct ListOrders {
    #[input(query = "page", schema = "page_schema")]
    page: u32,
    #[input(query = "status")]
    status: Vec<String>,
    #[input(header = "x-trace")]
    trace: Option<String>,
    #[input(path = "shop", time_format = "%Y")]
    shop: i16,
    #[input(skip)]
    cached: bool,
    #[input(body)]
    body: Option<Marker>,
}

#[test]
fn test_input_descriptor() {
    let descriptor = describe::<ListOrders>().unwrap();
    assert_eq!(descriptor.shape(), "ListOrders");

    let fields = descriptor.fields();
    assert_eq!(fields.len(), 5);

    assert_eq!(fields[0].name(), "page");
    assert_eq!(fields[0].source(), Source::Query);
    assert_eq!(fields[0].kind(), Some(&ParamKind::Int(IntWidth::U32)));
    assert_eq!(fields[0].constraints(), Some(&json!({"minimum": 1})));

    assert_eq!(
        fields[1].kind(),
        Some(&ParamKind::List(Box::new(ParamKind::String)))
    );
    assert_eq!(fields[2].source(), Source::Header);
    assert_eq!(fields[2].key(), "x-trace");
    assert_eq!(fields[3].source(), Source::Path);
    assert_eq!(fields[3].time_format(), Some("%Y"));

    assert_eq!(descriptor.body_field().map(|f| f.name()), Some("body"));
    assert!(descriptor.raw_body_field().is_none());
}

#[test]
fn test_describe_is_memoized() {
    let first = describe::<ListOrders>().unwrap();
    let second = describe::<ListOrders>().unwrap();
    assert!(std::ptr::eq(first, second));
}

#[derive(Debug, Input)]
struct ClashingKeys {
    #[input(query = "id")]
    a: u8,
    #[input(query = "id")]
    b: u8,
}

#[test]
fn test_duplicate_keys_rejected_at_describe() {
    assert!(describe::<ClashingKeys>().is_err());
}

#[derive(Debug, Deserialize, Walk)]
#[serde(rename_all = "camelCase")]
struct Order {
    line_item: Marker,
    #[serde(rename = "ship-to")]
    ship_to: Marker,
    #[walk(rename = "billing")]
    bill_to: Marker,
    #[walk(skip)]
    #[serde(default)]
    internal: Marker,
}

#[test]
fn test_walk_uses_wire_names() {
    let order = Order {
        line_item: Marker::default(),
        ship_to: Marker::default(),
        bill_to: Marker::default(),
        internal: Marker::default(),
    };

    assert_eq!(visit(&order), vec!["lineItem", "ship-to", "billing"]);
}

#[derive(Debug, Walk)]
struct OrderId(Marker);

#[derive(Debug, Walk)]
struct Pair(Marker, Marker);

#[test]
fn test_tuple_structs() {
    assert_eq!(visit(&OrderId(Marker::default())), vec![""]);
    assert_eq!(visit(&Pair(Marker::default(), Marker::default())), vec!["0", "1"]);
}

#[derive(Debug, Walk)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Walk)]
enum Status {
    #[allow(dead_code)]
    Open,
    Closed,
}

#[test]
fn test_generic_and_enum() {
    let page = Page {
        items: vec![Marker::default(), Marker::default()],
    };
    assert_eq!(visit(&page), vec!["items[0]", "items[1]"]);
    assert!(visit(&Status::Closed).is_empty());
}
