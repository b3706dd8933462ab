//! Tests for the domain error payload and trace propagation.

use super::*;
use crate::domain::TraceId;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthenticated("login"), ErrorCode::Unauthenticated)]
#[case(Error::unauthorized("nope"), ErrorCode::Unauthorized)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::invalid_operation("self"), ErrorCode::InvalidOperation)]
#[case(Error::already_exists("done"), ErrorCode::AlreadyExists)]
#[case(Error::internal("boom"), ErrorCode::InternalFailure)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn blank_messages_fall_back_to_code_name() {
    let error = Error::already_exists("   ");
    assert_eq!(error.message(), "already_exists");
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::not_found("missing") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn serialises_camel_case_and_skips_empty_fields() {
    let error = Error::invalid_operation("you can't follow yourself");
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_operation",
            "message": "you can't follow yourself",
        })
    );
}

#[rstest]
fn serialises_details_and_trace_id(expected_trace_id: String) {
    let error = Error::already_exists("already liked")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "relation": "like" }));
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(value["code"], "already_exists");
    assert_eq!(value["traceId"], expected_trace_id);
    assert_eq!(value["details"]["relation"], "like");
}

#[rstest]
fn display_includes_code_and_message() {
    let error = Error::unauthorized("not the owner");
    assert_eq!(error.to_string(), "unauthorized: not the owner");
}
