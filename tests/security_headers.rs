mod common;

use actix_web::{test, web, App};
use common::{ctx, UNUSED_LLM};
use polycast::app_config::SecurityConfig;
use polycast::{config, SecurityHeaders};

#[actix_web::test]
async fn test_security_headers_present() {
    let ctx = ctx(UNUSED_LLM);
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&ctx.state.config.security))
            .app_data(web::Data::new(ctx.state.clone()))
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/webhook").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let headers = resp.headers();
    let csp = headers.get("content-security-policy").unwrap().to_str().unwrap();
    assert!(csp.contains("frame-ancestors 'none'"));
    assert_eq!(headers.get("referrer-policy").unwrap(), "strict-origin-when-cross-origin");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("strict-transport-security").is_none()); // not enabled
}

#[actix_web::test]
async fn test_frame_ancestors_allow_mini_app_hosts() {
    let ctx = ctx(UNUSED_LLM);
    let security = SecurityConfig {
        enable_hsts: false,
        frame_ancestors: vec!["https://warpcast.com".into(), "https://*.farcaster.xyz".into()],
    };
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&security))
            .app_data(web::Data::new(ctx.state.clone()))
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/webhook").to_request();
    let resp = test::call_service(&app, req).await;
    let headers = resp.headers();
    let csp = headers.get("content-security-policy").unwrap().to_str().unwrap();
    assert!(csp.contains("frame-ancestors https://warpcast.com https://*.farcaster.xyz"));
    assert!(headers.get("x-frame-options").is_none());
}

#[actix_web::test]
async fn test_config_enables_hsts_without_builder_override() {
    let ctx = ctx(UNUSED_LLM);
    let security = SecurityConfig { enable_hsts: true, ..SecurityConfig::default() };
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&security))
            .app_data(web::Data::new(ctx.state.clone()))
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/webhook").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get("strict-transport-security").is_some(), "HSTS header missing");
}

#[actix_web::test]
async fn test_hsts_enabled_via_builder() {
    let ctx = ctx(UNUSED_LLM);
    let sec = SecurityHeaders::default().with_hsts(true).with_frame_ancestors(["https://warpcast.com"]);
    let app = test::init_service(
        App::new().wrap(sec).app_data(web::Data::new(ctx.state.clone())).configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/webhook").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get("strict-transport-security").is_some());
}
