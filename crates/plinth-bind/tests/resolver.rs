//! Resolvers found anywhere in the bound input.

use std::collections::HashMap;

use http::StatusCode;
use plinth_bind::{BindContext, BindOptions, Binder, ErrorDetail, Resolve, ResolveScope};
use plinth_macros::{Input, Walk};
use plinth_test::{TestRequest, TestResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, Walk)]
#[walk(resolve)]
struct Dep1 {
    // Only one of these may be set.
    #[serde(default)]
    one: String,
    #[serde(default)]
    two: String,
}

impl Resolve for Dep1 {
    fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
        if !self.one.is_empty() && !self.two.is_empty() {
            errors.add_error(ErrorDetail::new(
                "Only one of ['one', 'two'] is allowed.",
                "one",
                self.one.clone(),
            ));
        }
    }
}

#[derive(Debug, Deserialize, Walk)]
struct Dep2 {
    foo: HashMap<String, Vec<Box<Dep1>>>,
}

#[derive(Debug, Input)]
struct Nested {
    #[input(body)]
    body: Dep2,
}

fn post(body: serde_json::Value) -> BindContext {
    TestRequest::post("/").host("example.com").json(&body).context()
}

#[test]
fn test_nested_resolver_passes() {
    let ctx = post(json!({
        "foo": {
            "a": [{"one": "1"}],
            "b": [{"two": "2"}]
        }
    }));

    let response = Binder::default().handle::<Nested, _>(&ctx, |input| {
        assert_eq!(input.body.foo.len(), 2);
        plinth_bind::response::NoContent.into_response()
    });
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_nested_resolver_error_location() {
    let ctx = post(json!({
        "foo": {
            "a": [{"one": "1", "two": "2"}]
        }
    }));

    TestResponse::from(Binder::default().handle::<Nested, _>(&ctx, |_| unreachable!()))
        .assert_json(&json!({
            "$schema": "https://example.com/schemas/ErrorModel.json",
            "status": 422,
            "title": "Unprocessable Entity",
            "detail": "Error while processing input parameters",
            "errors": [
                {
                    "message": "Only one of ['one', 'two'] is allowed.",
                    "location": "body.foo.a[0].one",
                    "value": "1"
                }
            ]
        }));
}

#[test]
fn test_map_keys_visited_in_sorted_order() {
    let ctx = post(json!({
        "foo": {
            "zeta": [{"one": "z", "two": "z"}],
            "alpha": [{"one": "x"}, {"one": "a", "two": "a"}],
            "mid": [{"one": "m", "two": "m"}]
        }
    }));

    let rejection = Binder::default().bind::<Nested>(&ctx).unwrap_err();
    let locations: Vec<&str> = rejection
        .error_model()
        .unwrap()
        .errors
        .iter()
        .map(|e| e.location.as_str())
        .collect();

    assert_eq!(
        locations,
        vec!["body.foo.alpha[1].one", "body.foo.mid[0].one", "body.foo.zeta[0].one"]
    );
}

fn positive() -> serde_json::Value {
    json!({"minimum": 1})
}

#[derive(Debug, Input)]
#[input(resolve)]
struct Range {
    #[input(query = "from", schema = "positive")]
    from: i64,
    #[input(query = "to")]
    to: i64,
    #[input(body)]
    body: Option<Dep1>,
}

impl Resolve for Range {
    fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
        if self.to < self.from {
            errors.add_error(ErrorDetail::new(
                "to must not be before from",
                "query.to",
                self.to.to_string(),
            ));
        }
    }
}

#[test]
fn test_resolver_runs_after_coercion_errors() {
    let ctx = TestRequest::get("/?from=0&to=-1")
        .json(&json!({"one": "1", "two": "2"}))
        .context();

    let rejection = Binder::default().bind::<Range>(&ctx).unwrap_err();
    let errors = &rejection.error_model().unwrap().errors;

    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].location, "query.from");
    assert_eq!(errors[0].value, json!("0"));
    // Top-level resolver first, then the body walk.
    assert_eq!(
        errors[1],
        ErrorDetail::new("to must not be before from", "query.to", "-1")
    );
    assert_eq!(errors[2].location, "body.one");
}

#[test]
fn test_absent_optional_body_is_skipped() {
    let ctx = TestRequest::get("/?from=2&to=3").context();
    let input = Binder::default().bind::<Range>(&ctx).unwrap();
    assert!(input.body.is_none());
    assert_eq!((input.from, input.to), (2, 3));
}

#[derive(Debug, Deserialize, Walk)]
struct Node {
    #[serde(default)]
    children: Vec<Node>,
}

#[derive(Debug, Input)]
struct Tree {
    #[input(body)]
    body: Node,
}

fn chain(depth: usize) -> serde_json::Value {
    (0..depth).fold(json!({}), |inner, _| json!({"children": [inner]}))
}

#[test]
fn test_walk_depth_fails_closed() {
    let ctx = TestRequest::post("/").json(&chain(10)).context();

    let shallow = Binder::new(BindOptions {
        max_walk_depth: 8,
        ..BindOptions::default()
    });
    let rejection = shallow.bind::<Tree>(&ctx).unwrap_err();
    assert_eq!(rejection.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    assert!(Binder::default().bind::<Tree>(&ctx).is_ok());
}

#[derive(Debug, Deserialize, Walk)]
struct Link {
    #[serde(default)]
    next: Option<Box<Link>>,
}

#[derive(Debug, Input)]
struct LinkedList {
    #[input(body)]
    body: Link,
}

#[test]
fn test_indirection_chain_binds_with_defaults() {
    let body = (0..25).fold(json!({}), |inner, _| json!({"next": inner}));
    let ctx = TestRequest::post("/").json(&body).context();

    let input = Binder::new(BindOptions::default())
        .bind::<LinkedList>(&ctx)
        .unwrap();

    let mut length = 0;
    let mut current = input.body.next.as_deref();
    while let Some(link) = current {
        length += 1;
        current = link.next.as_deref();
    }
    assert_eq!(length, 25);
}
