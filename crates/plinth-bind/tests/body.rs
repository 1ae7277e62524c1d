//! Body decoding, constraint checking and raw capture.

use bytes::Bytes;
use http::StatusCode;
use plinth_bind::response::{JsonResponse, NoContent};
use plinth_bind::{BindOptions, Binder, ErrorDetail, BODY_REQUIRED};
use plinth_macros::{Input, Walk};
use plinth_test::{TestRequest, TestResponse};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, Walk)]
struct Named {
    #[serde(default)]
    name: String,
}

fn named_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name"],
        "properties": {"name": {"type": "string", "minLength": 1}}
    })
}

#[derive(Debug, Input)]
struct Signed {
    #[input(body, schema = "named_schema")]
    body: Named,
    #[input(raw_body)]
    raw: Bytes,
}

#[test]
fn test_raw_body_is_byte_identical() {
    let payload = "{ \"name\" :\n  \"widget\" }";
    let ctx = TestRequest::post("/").body(payload).context();

    let input = Binder::default().bind::<Signed>(&ctx).unwrap();
    assert_eq!(input.body.name, "widget");
    assert_eq!(input.raw, Bytes::from(payload));
}

#[test]
fn test_missing_required_property() {
    let ctx = TestRequest::post("/").host("api.test").body("{}").context();

    let rejection = Binder::default().bind::<Signed>(&ctx).unwrap_err();
    let errors = &rejection.error_model().unwrap().errors;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, "body");
    assert_eq!(errors[0].value, json!({}));
    assert!(errors[0].message.contains("name"));
}

#[test]
fn test_violation_value_is_decoded_json() {
    let ctx = TestRequest::post("/").json(&json!({"name": ""})).context();

    let rejection = Binder::default().bind::<Signed>(&ctx).unwrap_err();
    let errors = &rejection.error_model().unwrap().errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, "body.name");
    assert_eq!(errors[0].value, json!(""));
}

#[test]
fn test_structural_mismatch_is_unprocessable() {
    let ctx = TestRequest::post("/").body(r#"{"name": 7}"#).context();

    // The schema already reports the wrong type; it is the only error.
    let rejection = Binder::default().bind::<Signed>(&ctx).unwrap_err();
    let errors = &rejection.error_model().unwrap().errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, "body.name");

    #[derive(Debug, Input)]
    struct Unchecked {
        #[input(body)]
        body: Named,
    }

    let rejection = Binder::default().bind::<Unchecked>(&ctx).unwrap_err();
    assert_eq!(
        rejection.error_model().unwrap().errors,
        vec![ErrorDetail::new(
            "invalid type: integer `7`, expected a string",
            "body.name",
            7
        )]
    );
}

#[derive(Debug, Deserialize, Walk)]
struct Tagged {
    name: String,
    tags: Vec<String>,
}

#[derive(Debug, Input)]
struct RawTagged {
    #[input(body)]
    body: Tagged,
    #[input(raw_body)]
    raw: Bytes,
}

#[test]
fn test_missing_fields_without_schema() {
    let ctx = TestRequest::post("/").host("api.test").body("{}").context();
    let response =
        TestResponse::from(Binder::default().handle::<RawTagged, _>(&ctx, |_| unreachable!()));

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    response.assert_errors(&[ErrorDetail::new("missing field `name`", "body", json!({}))]);
}

#[test]
fn test_nested_type_mismatch_location() {
    let ctx = TestRequest::post("/")
        .json(&json!({"name": "a", "tags": ["x", 5]}))
        .context();

    let rejection = Binder::default().bind::<RawTagged>(&ctx).unwrap_err();
    assert_eq!(
        rejection.error_model().unwrap().errors,
        vec![ErrorDetail::new(
            "invalid type: integer `5`, expected a string",
            "body.tags[1]",
            5
        )]
    );
}

#[test]
fn test_missing_body() {
    let ctx = TestRequest::post("/").context();
    let rejection = Binder::default().bind::<Signed>(&ctx).unwrap_err();

    assert_eq!(
        rejection.error_model().unwrap().errors,
        vec![ErrorDetail::new(BODY_REQUIRED, "body", Value::Null)]
    );
}

#[derive(Debug, Input)]
struct Upload {
    #[input(query = "name")]
    name: String,
    #[input(raw_body)]
    data: Vec<u8>,
}

#[test]
fn test_body_size_limit() {
    let binder = Binder::new(BindOptions {
        max_body_bytes: 4,
        ..BindOptions::default()
    });

    let ctx = TestRequest::put("/?name=a").body("[1,2]").context();
    let response = TestResponse::from(binder.handle::<Upload, _>(&ctx, |_| unreachable!()));
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let ctx = TestRequest::put("/?name=a").body("[1]").context();
    let input = binder.bind::<Upload>(&ctx).unwrap();
    assert_eq!(input.data, b"[1]".to_vec());
}

#[test]
fn test_raw_only_shape_still_requires_json() {
    let ctx = TestRequest::put("/?name=a").body("not json").context();
    let rejection = Binder::default().bind::<Upload>(&ctx).unwrap_err();
    assert_eq!(rejection.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_empty_raw_body() {
    let ctx = TestRequest::put("/?name=a").context();
    let input = Binder::default().bind::<Upload>(&ctx).unwrap();
    assert!(input.data.is_empty());
    assert_eq!(input.name, "a");
}

#[tokio::test]
async fn test_handle_async_runs_handler_once() {
    let ctx = TestRequest::post("/").json(&json!({"name": "gear"})).context();

    let response = Binder::default()
        .handle_async::<Signed, _, _>(&ctx, |input| async move {
            JsonResponse::new(json!({"name": input.body.name, "bytes": input.raw.len()}))
                .with_status(StatusCode::CREATED)
                .into_response()
        })
        .await;

    TestResponse::from(response)
        .assert_status(StatusCode::CREATED)
        .assert_json(&json!({"name": "gear", "bytes": 15}));
}

#[tokio::test]
async fn test_handle_async_rejection_skips_handler() {
    let ctx = TestRequest::post("/").body("{}").context();

    let response = Binder::default()
        .handle_async::<Signed, _, _>(&ctx, |_| async { NoContent.into_response() })
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
