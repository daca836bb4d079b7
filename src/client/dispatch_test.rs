use std::sync::Arc;
use std::time::Duration;

use tracing_test::traced_test;

use super::*;
use crate::constants::ERROR_CLUSTER_FAILED;
use crate::constants::ERROR_RESPONSE_PARSE_FAILED;
use crate::constants::KEY_NOT_FOUND;
use crate::test_utils::error_reply;
use crate::test_utils::event_reply;
use crate::test_utils::mock_client;
use crate::test_utils::test_client;
use crate::test_utils::ScriptStep;
use crate::test_utils::ScriptedTransport;
use crate::test_utils::A;
use crate::test_utils::B;
use crate::test_utils::C;
use crate::transport::HttpReply;
use crate::transport::Method;
use crate::transport::MockTransport;
use crate::Error;
use crate::TransportErrorKind;

#[tokio::test]
#[traced_test]
async fn test_failover_skips_unreachable_members() {
    let transport = Arc::new(
        ScriptedTransport::new().script(C, vec![ScriptStep::Reply(event_reply("get", "/locks/a", "v1", 7))]),
    );
    let client = test_client(&[A, B, C], transport.clone());

    let resp = client.get("/locks/a").await.expect("C is reachable");

    assert_eq!(resp.node.value.as_deref(), Some("v1"));
    assert_eq!(client.picked(), 2);
    assert_eq!(client.picked_address(), C);
    let urls: Vec<String> = transport.calls().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{A}/v2/keys/locks/a"),
            format!("{B}/v2/keys/locks/a"),
            format!("{C}/v2/keys/locks/a"),
        ]
    );
    assert!(logs_contain("failing over"));
}

#[tokio::test]
#[traced_test]
async fn test_all_members_down_fails_after_one_round() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = test_client(&[A, B, C], transport.clone());

    let err = client.get("/locks/a").await.unwrap_err();

    assert!(matches!(err, Error::ClusterUnavailable { attempted: 3, .. }));
    assert_eq!(err.code(), ERROR_CLUSTER_FAILED);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(client.last_error().map(|e| e.code()), Some(ERROR_CLUSTER_FAILED));
    assert!(logs_contain("all 3 cluster members failed"));
}

#[tokio::test]
async fn test_next_request_starts_at_picked_member() {
    let transport = Arc::new(ScriptedTransport::new().script(
        B,
        vec![
            ScriptStep::Reply(event_reply("set", "/a", "1", 3)),
            ScriptStep::Reply(event_reply("get", "/a", "1", 3)),
        ],
    ));
    let client = test_client(&[A, B], transport.clone());

    client.set("/a", "1", 0).await.expect("B is reachable");
    client.get("/a").await.expect("B is reachable");

    // A is only tried by the first call
    assert_eq!(transport.call_count(), 3);
    assert_eq!(client.picked(), 1);
}

#[tokio::test]
async fn test_timeouts_fail_over_like_refused_connections() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .script(A, vec![ScriptStep::Fail(TransportErrorKind::Timeout)])
            .script(B, vec![ScriptStep::Reply(event_reply("get", "/a", "1", 3))]),
    );
    let client = test_client(&[A, B], transport.clone());

    assert!(client.get("/a").await.is_ok());
    assert_eq!(client.picked(), 1);
}

#[tokio::test]
async fn test_parse_error_does_not_fail_over() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .script(A, vec![ScriptStep::Reply(HttpReply::new(200, "<html>proxy</html>"))])
            .script(B, vec![ScriptStep::Reply(event_reply("get", "/a", "1", 3))]),
    );
    let client = test_client(&[A, B], transport.clone());

    let err = client.get("/a").await.unwrap_err();

    assert_eq!(err.code(), ERROR_RESPONSE_PARSE_FAILED);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.picked(), 0);
}

#[tokio::test]
async fn test_service_error_is_returned_verbatim() {
    let transport = Arc::new(ScriptedTransport::new().script(
        A,
        vec![ScriptStep::Reply(error_reply(404, KEY_NOT_FOUND, "Key not found", 12))],
    ));
    let client = test_client(&[A, B], transport.clone());

    let err = client.get("/missing").await.unwrap_err();

    assert_eq!(err.code(), KEY_NOT_FOUND);
    assert_eq!(err.index(), Some(12));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.last_error().map(|e| e.code()), Some(KEY_NOT_FOUND));
}

#[tokio::test]
async fn test_crud_requests_carry_request_timeout() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|r| r.timeout == Some(Duration::from_millis(4000)))
        .times(1)
        .returning(|_| Ok(event_reply("get", "/a", "1", 3)));
    let client = mock_client(&[A], transport);

    assert!(client.get("/a").await.is_ok());
}

#[tokio::test]
async fn test_long_polls_are_unbounded() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|r| r.timeout.is_none() && r.param("wait") == Some("true"))
        .times(1)
        .returning(|_| Ok(event_reply("set", "/a", "2", 9)));
    let client = mock_client(&[A], transport);

    assert!(client.watch("/a", 0).await.is_ok());
}

#[tokio::test]
async fn test_credentials_are_attached_after_setup_user() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|r| r.auth.as_ref().map(|a| (a.user.as_str(), a.password.as_str())) == Some(("root", "secret")))
        .times(1)
        .returning(|_| Ok(event_reply("get", "/a", "1", 3)));
    let client = mock_client(&[A], transport);

    client.setup_user("root", "secret");

    assert!(client.get("/a").await.is_ok());
}

#[test]
fn test_api_request_path_uses_configured_space() {
    let config = crate::ClientConfig {
        keys_space: "/v2/keys".into(),
        stats_space: "/v2/stats".into(),
        member_space: "/v2/members".into(),
        ..Default::default()
    };

    assert_eq!(ApiRequest::keys("get", Method::Get, "/a/b").path(&config), "/v2/keys/a/b");
    assert_eq!(ApiRequest::stats("stats_self", "/self").path(&config), "/v2/stats/self");
    assert_eq!(ApiRequest::members("list_members").path(&config), "/v2/members");
}

#[test]
fn test_ttl_zero_and_false_flags_are_omitted() {
    let request = ApiRequest::keys("set", Method::Put, "/a")
        .ttl(0)
        .flag("dir", false)
        .flag("recursive", true);

    assert_eq!(request.params, vec![("recursive", "true".to_string())]);
}
