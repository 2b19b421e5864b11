mod support;

use royalty_schedules::config::ApiSettings;
use royalty_schedules::source::{ApiEventSource, EventSource};
use serde_json::json;
use support::period;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one HTTP response and hand back the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}"), handle)
}

fn settings() -> ApiSettings {
    ApiSettings {
        connector: "hotels".to_string(),
        jwt: "test-jwt".to_string(),
        ..ApiSettings::default()
    }
}

#[test]
fn request_url_embeds_json_parameters() {
    let source = ApiEventSource::new(&settings()).expect("source");
    assert_eq!(
        source.request_url(&period("2603")),
        r#"https://localhost:443/3/uipEvents?{"connector":"hotels","month":"2603"}"#
    );
}

#[tokio::test]
async fn fetch_sends_bearer_token_and_decodes_mapping() {
    let body = r#"{"e1": {"territory": "UK", "title": "Argo", "views": 3}, "e2": {"title": "Brave"}}"#;
    let (base_url, server) = serve_once("200 OK", body).await;
    let source = ApiEventSource::new(&settings())
        .expect("source")
        .with_base_url(base_url);

    let events = source.fetch(&period("2603")).await.expect("events");
    assert_eq!(events.len(), 2);
    let keys: Vec<_> = events.keys().cloned().collect();
    assert_eq!(keys, vec!["e1", "e2"]);
    assert_eq!(events["e1"].views, Some(json!(3)));

    let request = server.await.expect("server").to_lowercase();
    assert!(request.starts_with("get /3/uipevents?"));
    assert!(request.contains("authorization: bearer test-jwt"));
    assert!(request.contains("2603"));
}

#[tokio::test]
async fn empty_body_is_an_empty_month() {
    let (base_url, server) = serve_once("200 OK", "").await;
    let source = ApiEventSource::new(&settings())
        .expect("source")
        .with_base_url(base_url);

    let events = source.fetch(&period("2603")).await.expect("events");
    assert!(events.is_empty());
    server.await.expect("server");
}

#[tokio::test]
async fn error_status_fails_the_fetch() {
    let (base_url, server) = serve_once("401 Unauthorized", r#"{"error":"bad token"}"#).await;
    let source = ApiEventSource::new(&settings())
        .expect("source")
        .with_base_url(base_url);

    let err = source.fetch(&period("2603")).await.expect_err("unauthorized");
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("bad token"), "{message}");
    server.await.expect("server");
}
