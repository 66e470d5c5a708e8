// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "alice",
                "email": "not-an-email",
                "password": "secret1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "short"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_username() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "al",
                "email": "alice@example.com",
                "password": "secret1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_valid_shape_reaches_the_store() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "secret1"
            }),
        ))
        .await
        .unwrap();

    // Validation passes; the duplicate check then fails on the offline
    // mock database. Anything but 400 proves the payload was accepted.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_verify_otp_rejects_wrong_code_length() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/verify-otp",
            json!({
                "email": "alice@example.com",
                "otp": "1234"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_empty_identifier() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post(
            "/auth/login",
            json!({
                "identifier": "",
                "password": "secret1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_rejects_missing_token_field() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post("/auth/refresh-session", json!({})))
        .await
        .unwrap();

    // Missing required field fails at deserialization
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
