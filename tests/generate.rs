mod common;

use actix_web::{test, web, App};
use common::{completion, ctx};
use polycast::app_config::DEFAULT_LLM_MODEL;
use polycast::config;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_url(server: &MockServer) -> String {
    format!("{}/v1/chat/completions", server.uri())
}

#[actix_web::test]
async fn missing_style_is_rejected_before_calling_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("never")))
        .expect(0)
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    for body in [json!({ "topic": "gm" }), json!({ "style": "casual" }), json!({ "topic": "  ", "style": "casual" })] {
        let req = test::TestRequest::post().uri("/api/generate-original").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "body {body}");
        let v: Value = test::read_body_json(resp).await;
        assert_eq!(v["ok"], false);
    }
}

#[actix_web::test]
async fn unknown_style_is_a_client_error() {
    let ctx = ctx(common::UNUSED_LLM);
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;
    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .set_json(&json!({ "topic": "gm", "style": "sarcastic" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn preview_is_first_320_characters() {
    let server = MockServer::start().await;
    let long: String = "가".repeat(500);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("x-litellm-api-key", "test-key"))
        .and(body_partial_json(json!({ "model": DEFAULT_LLM_MODEL, "max_tokens": 200 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&long)))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .set_json(&json!({ "topic": "korean summer", "tone": "crypto-native" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["originalText"].as_str().unwrap().chars().count(), 500);
    assert_eq!(v["previewText"].as_str().unwrap(), "가".repeat(320));
}

#[actix_web::test]
async fn short_text_preview_equals_original() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("gm to everyone shipping on Base")))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .set_json(&json!({ "topic": "gm", "style": "casual" }))
        .to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["originalText"], v["previewText"]);
}

#[actix_web::test]
async fn upstream_failure_maps_to_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .set_json(&json!({ "topic": "gm", "style": "professional" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["ok"], false);
    // upstream detail stays in the logs
    assert!(!v["error"].as_str().unwrap().contains("overloaded"));
}

#[actix_web::test]
async fn missing_choices_yield_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .set_json(&json!({ "topic": "gm", "style": "casual" }))
        .to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["originalText"], "");
    assert_eq!(v["previewText"], "");
}

#[actix_web::test]
async fn malformed_json_body_uses_error_envelope() {
    let ctx = ctx(common::UNUSED_LLM);
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;
    let req = test::TestRequest::post()
        .uri("/api/generate-original")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["ok"], false);
}
