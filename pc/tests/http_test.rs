//! HTTP client tests against a canned loopback server

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use postcraft::{
    ClientError, FormatterClient, GenerationClient, HttpFormatterClient, HttpGenerationClient, PlatformId,
    ServiceConfig,
};

/// A request as seen by the canned server
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: Value,
}

/// Serve `responses` in order, one per connection, recording each request
async fn serve(responses: Vec<(u16, Value)>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let log = recorded.clone();
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            log.lock().unwrap().push(request);

            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (format!("http://{}", addr), recorded)
}

/// Read one request: headers up to the blank line, then Content-Length bytes
async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = &buf[header_end..header_end + content_length];
    Recorded {
        method,
        path,
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    }
}

fn config(base_url: &str) -> ServiceConfig {
    ServiceConfig {
        base_url: format!("{}/", base_url),
        api_key_env: None,
        timeout_ms: 5_000,
        max_retries: 1,
    }
}

#[tokio::test]
async fn test_generate_posts_topic_and_reads_field() {
    let (url, recorded) = serve(vec![(200, json!({ "generated_content": "Antlers at dawn" }))]).await;
    let client = HttpGenerationClient::from_config(&config(&url)).unwrap();

    let post = client.generate("a poem about deer").await.unwrap();
    assert_eq!(post, "Antlers at dawn");

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/generate");
    assert_eq!(requests[0].body, json!({ "content": "a poem about deer" }));
}

#[tokio::test]
async fn test_refine_sends_content_and_instruction() {
    let (url, recorded) = serve(vec![(200, json!({ "refined_content": "Short" }))]).await;
    let client = HttpGenerationClient::from_config(&config(&url)).unwrap();

    assert_eq!(client.refine("Long post", "shorter").await.unwrap(), "Short");

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests[0].path, "/api/refine");
    assert_eq!(
        requests[0].body,
        json!({ "content": "Long post", "instruction": "shorter" })
    );
}

#[tokio::test]
async fn test_429_is_rate_limited_and_not_retried() {
    let (url, recorded) = serve(vec![(429, json!({ "detail": "Daily usage limit exceeded." }))]).await;
    let client = HttpGenerationClient::from_config(&config(&url)).unwrap();

    let err = client.generate("x").await.unwrap_err();
    assert_eq!(
        err,
        ClientError::RateLimited {
            message: Some("Daily usage limit exceeded.".to_string())
        }
    );
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_quota_code_is_rate_limited() {
    let (url, _) = serve(vec![(403, json!({ "code": "quota_exceeded" }))]).await;
    let client = HttpFormatterClient::from_config(&config(&url)).unwrap();

    let err = client
        .format_for_platform(&PlatformId::new("x"), "draft")
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::RateLimited { message: None });
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (url, recorded) = serve(vec![
        (503, json!({ "detail": "warming up" })),
        (200, json!({ "formatted_content": "Hello <b>#world</b>" })),
    ])
    .await;
    let client = HttpFormatterClient::from_config(&config(&url)).unwrap();

    let formatted = client
        .format_for_platform(&PlatformId::new("x"), "Hello #world")
        .await
        .unwrap();
    assert_eq!(formatted, "Hello <b>#world</b>");

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.path == "/api/format/x"));
    assert_eq!(requests[1].body, json!({ "content": "Hello #world" }));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (url, recorded) = serve(vec![(400, json!({ "message": "bad platform" }))]).await;
    let client = HttpFormatterClient::from_config(&config(&url)).unwrap();

    let err = client
        .format_for_platform(&PlatformId::new("myspace"), "draft")
        .await
        .unwrap_err();
    match err {
        ClientError::FormattingFailed(reason) => assert!(reason.contains("bad platform")),
        other => panic!("Expected FormattingFailed, got {:?}", other),
    }
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_field_is_generation_failure() {
    let (url, _) = serve(vec![(200, json!({ "unexpected": "shape" }))]).await;
    let client = HttpGenerationClient::from_config(&config(&url)).unwrap();

    let err = client.generate("topic").await.unwrap_err();
    assert!(matches!(err, ClientError::GenerationFailed(_)));
}

#[tokio::test]
async fn test_fetch_catalogue() {
    let (url, recorded) = serve(vec![(
        200,
        json!({ "platforms": [
            { "id": "x", "name": "X", "characterLimit": 280 },
            { "id": "mastodon", "name": "Mastodon", "character-limit": 500 }
        ] }),
    )])
    .await;
    let client = HttpFormatterClient::from_config(&config(&url)).unwrap();

    let catalogue = client.fetch_catalogue().await.unwrap();
    assert_eq!(catalogue.len(), 2);
    let mastodon = catalogue.get(&PlatformId::new("mastodon")).unwrap();
    assert_eq!(mastodon.character_limit, 500);
    assert_eq!(recorded.lock().unwrap()[0].method, "GET");
}
