//! Security header injection tests.

use admission_gateway::config::GatewayConfig;
use admission_gateway::security::CONTENT_SECURITY_POLICY_VALUE;

mod common;

#[tokio::test]
async fn every_response_carries_the_security_headers() {
    let gateway = common::spawn_gateway(GatewayConfig::default()).await;
    let client = common::client();

    for path in ["/health", "/api/echo"] {
        let res = client.get(gateway.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(
            res.headers()["content-security-policy"],
            CONTENT_SECURITY_POLICY_VALUE
        );
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(
            res.headers()["referrer-policy"],
            "strict-origin-when-cross-origin"
        );
    }

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn rejections_carry_the_security_headers_too() {
    let mut config = GatewayConfig::default();
    config.admission.max_requests = 1;
    let gateway = common::spawn_gateway(config).await;
    let client = common::client();

    let send = || {
        client
            .get(gateway.url("/api/echo"))
            .header("x-forwarded-for", "203.0.113.50")
            .send()
    };

    assert_eq!(send().await.unwrap().status(), 200);

    let rejected = send().await.unwrap();
    assert_eq!(rejected.status(), 429);
    assert_eq!(
        rejected.headers()["content-security-policy"],
        CONTENT_SECURITY_POLICY_VALUE
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn headers_can_be_disabled_by_config() {
    let mut config = GatewayConfig::default();
    config.security.enable_headers = false;
    let gateway = common::spawn_gateway(config).await;
    let client = common::client();

    let res = client.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("content-security-policy").is_none());

    gateway.shutdown.trigger();
}
