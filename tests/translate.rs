mod common;

use actix_web::{test, web, App};
use common::{completion, ctx};
use polycast::config;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_url(server: &MockServer) -> String {
    format!("{}/v1/chat/completions", server.uri())
}

#[actix_web::test]
async fn target_languages_must_be_a_list_of_known_codes() {
    let ctx = ctx(common::UNUSED_LLM);
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let cases = [
        json!({ "text": "gm", "targetLanguages": "ja" }),
        json!({ "text": "gm", "targetLanguages": [] }),
        json!({ "text": "gm" }),
        json!({ "text": "gm", "targetLanguages": ["ja", "xx"] }),
        json!({ "text": "gm", "targetLanguages": ["en", "ja", "ko", "zh", "es", "fr"] }),
        json!({ "text": " ", "targetLanguages": ["ja"] }),
    ];
    for body in cases {
        let req = test::TestRequest::post().uri("/api/translate").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "body {body}");
    }
}

#[actix_web::test]
async fn fenced_and_plain_model_output_agree() {
    let object = r#"{"ja": "おはよう", "ko": "좋은 아침"}"#;
    let mut bodies = Vec::new();
    for raw in [object.to_string(), format!("```json\n{object}\n```")] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "max_tokens": 400 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&raw)))
            .expect(1)
            .mount(&server)
            .await;
        let ctx = ctx(&llm_url(&server));
        let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;
        let req = test::TestRequest::post()
            .uri("/api/translate")
            .set_json(&json!({ "text": "good morning", "targetLanguages": ["ja", "ko"], "style": "casual" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        bodies.push(test::read_body_json::<Value, _>(resp).await);
    }
    assert_eq!(bodies[0], bodies[1]);
    let ja = &bodies[0]["translations"]["ja"];
    assert_eq!(ja["text"], "おはよう");
    assert_eq!(ja["previewText"], "おはよう");
    assert_eq!(ja["charCount"], 4);
    assert!(bodies[0].get("results").is_none());
}

#[actix_web::test]
async fn language_missing_from_model_output_is_empty_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"ja": "こんにちは"}"#)))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    // unknown style falls back to casual rather than failing
    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(&json!({ "text": "hello", "targetLanguages": ["ja", "es"], "style": "pirate" }))
        .to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["translations"]["ja"]["text"], "こんにちは");
    assert_eq!(v["translations"]["es"]["text"], "");
    assert_eq!(v["translations"]["es"]["charCount"], 0);
}

#[actix_web::test]
async fn upper_case_codes_come_back_lower_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"ko": "안녕"}"#)))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(&json!({ "text": "hi", "targetLanguages": ["KO"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["translations"]["ko"]["text"], "안녕");
    assert!(v["translations"].get("KO").is_none());
}

#[actix_web::test]
async fn unparseable_model_output_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Sure! Here are your translations: ...")))
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(&json!({ "text": "hello", "targetLanguages": ["ja"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["ok"], false);
}

#[actix_web::test]
async fn per_language_mode_reports_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("into Japanese (ja)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("おはよう")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("into Korean (ko)"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = ctx(&llm_url(&server));
    let app = test::init_service(App::new().app_data(web::Data::new(ctx.state.clone())).configure(config)).await;

    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(&json!({ "text": "good morning", "targetLanguages": ["ja", "ko"], "mode": "per-language" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;

    assert_eq!(v["translations"]["ja"]["text"], "おはよう");
    assert!(v["translations"].get("ko").is_none());
    let results = v["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["targetLang"], "ja");
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["translation"]["text"], "おはよう");
    assert_eq!(results[1]["targetLang"], "ko");
    assert_eq!(results[1]["status"], "failed");
    assert!(results[1]["error"].is_string());
}
