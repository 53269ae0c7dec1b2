use feed::{Cursor, FeedError, ItemCreator, PageFetcher};
use feed_http::{HttpCollection, HttpConfig};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Atiende una única petición con la respuesta dada y devuelve el texto de
/// la petición recibida.
async fn serve_once(status: &'static str, body: &'static str) -> (HttpCollection, JoinHandle<String>) {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
  let addr = listener.local_addr().expect("addr");
  let server = tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.expect("accept");
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
      let n = socket.read(&mut buf).await.expect("read");
      if n == 0 {
        break;
      }
      raw.extend_from_slice(&buf[..n]);
      if request_complete(&raw) {
        break;
      }
    }
    let response = format!("HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                           status,
                           body.len(),
                           body);
    socket.write_all(response.as_bytes()).await.expect("write");
    socket.shutdown().await.ok();
    String::from_utf8_lossy(&raw).to_string()
  });
  (collection(&format!("http://{}", addr)), server)
}

fn collection(base: &str) -> HttpCollection {
  let mut config = HttpConfig::new(base);
  config.timeout = Duration::from_secs(5);
  HttpCollection::new(config).expect("client")
}

fn request_complete(raw: &[u8]) -> bool {
  let text = String::from_utf8_lossy(raw);
  let Some(end) = text.find("\r\n\r\n") else {
    return false;
  };
  let length = text[..end].lines()
                          .filter_map(|l| l.split_once(':'))
                          .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                          .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                          .unwrap_or(0);
  raw.len() >= end + 4 + length
}

#[tokio::test]
async fn first_page_is_requested_without_cache_and_decoded() {
  let (repo, server) = serve_once("200 OK", r#"{"items":[{"SK":"01B","quote":"dos"},{"SK":"01A","quote":"uno"}],"cursor":"next-1"}"#).await;
  let page = repo.fetch_page(None, 10).await.expect("page");
  let request = server.await.expect("server").to_lowercase();

  assert!(request.starts_with("get /quotes?limit=10 http/1.1"), "{}", request);
  assert!(request.contains("cache-control: no-store"));
  assert_eq!(page.items.len(), 2);
  assert_eq!(page.items[0].id, "01B");
  assert_eq!(page.cursor, Some(Cursor::from("next-1")));
}

#[tokio::test]
async fn next_page_carries_the_cursor() {
  let (repo, server) = serve_once("200 OK", r#"{"items":[],"cursor":null}"#).await;
  let page = repo.fetch_page(Some(&Cursor::from("abc")), 10).await.expect("page");
  let request = server.await.expect("server");

  assert!(request.starts_with("GET /quotes?limit=10&cursor=abc "), "{}", request);
  assert!(page.is_terminal());
}

#[tokio::test]
async fn error_status_uses_the_error_body() {
  let (repo, server) = serve_once("500 Internal Server Error", r#"{"error":"tabla no disponible"}"#).await;
  let err = repo.fetch_page(None, 10).await.expect_err("status");
  server.await.expect("server");

  assert_eq!(err, FeedError::Status { status: 500, message: "tabla no disponible".into() });
  assert!(err.is_fetch_failure());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
  let addr = listener.local_addr().expect("addr");
  drop(listener);

  let err = collection(&format!("http://{}", addr)).fetch_page(None, 10).await.expect_err("transport");
  assert!(matches!(err, FeedError::Transport(_)), "{:?}", err);
}

#[tokio::test]
async fn create_posts_json_content() {
  let (repo, server) = serve_once("201 Created", r#"{"SK":"01C","quote":"nueva","createdAt":"2025-08-23T16:06:12Z"}"#).await;
  let created = repo.create_item("nueva").await.expect("created");
  let request = server.await.expect("server");

  assert!(request.starts_with("POST /quotes HTTP/1.1"), "{}", request);
  assert!(request.ends_with(r#"{"content":"nueva"}"#), "{}", request);
  assert_eq!(created.map(|i| i.id), Some("01C".to_string()));
}

#[tokio::test]
async fn rejected_create_surfaces_the_message() {
  let (repo, server) = serve_once("400 Bad Request", r#"{"error":"contenido demasiado largo"}"#).await;
  let err = repo.create_item("x").await.expect_err("rejected");
  server.await.expect("server");

  assert_eq!(err, FeedError::Rejected("contenido demasiado largo".into()));
  assert_eq!(err.to_string(), "contenido demasiado largo");
}

#[tokio::test]
async fn receipt_without_item_is_accepted() {
  let (repo, server) = serve_once("200 OK", r#"{"createdAt":"2025-08-23T16:06:12Z"}"#).await;
  let created = repo.create_item("hola").await.expect("created");
  server.await.expect("server");
  assert!(created.is_none());
}
