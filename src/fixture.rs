//! Minimal HTTP/1.1 server for exercising the HTTP hosts in tests.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone)]
pub(crate) struct Route {
  status: u16,
  content_type: &'static str,
  location: Option<String>,
  body: Vec<u8>,
}

impl Route {
  pub(crate) fn html(body: &str) -> Self {
    Self { status: 200, content_type: "text/html; charset=utf-8", location: None, body: body.as_bytes().to_vec() }
  }

  pub(crate) fn bytes(content_type: &'static str, body: &[u8]) -> Self {
    Self { status: 200, content_type, location: None, body: body.to_vec() }
  }

  pub(crate) fn status(status: u16) -> Self {
    Self { status, content_type: "text/plain", location: None, body: b"error".to_vec() }
  }

  pub(crate) fn redirect(to: &str) -> Self {
    Self { status: 302, content_type: "text/plain", location: Some(to.to_string()), body: Vec::new() }
  }
}

fn reason(status: u16) -> &'static str {
  match status {
    200 => "OK",
    302 => "Found",
    404 => "Not Found",
    500 => "Internal Server Error",
    _ => "Unknown",
  }
}

/// Serve `routes` (keyed by request path, query included) on an ephemeral port and return the
/// base URL. Unknown paths get a 404.
pub(crate) async fn serve(routes: Vec<(&str, Route)>) -> Url {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let routes: Arc<HashMap<String, Route>> = Arc::new(routes.into_iter().map(|(p, r)| (p.to_string(), r)).collect());

  tokio::spawn(async move {
    while let Ok((mut socket, _)) = listener.accept().await {
      let routes = routes.clone();
      tokio::spawn(async move {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
          let n = socket.read(&mut chunk).await.unwrap_or(0);
          if n == 0 {
            break;
          }
          request.extend_from_slice(&chunk[..n]);
          if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
          }
        }
        let request = String::from_utf8_lossy(&request);
        let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
        let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));

        let mut head = format!(
          "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
          route.status,
          reason(route.status),
          route.content_type,
          route.body.len()
        );
        if let Some(location) = route.location {
          head.push_str(&format!("Location: {}\r\n", location));
        }
        head.push_str("\r\n");
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&route.body).await;
        let _ = socket.shutdown().await;
      });
    }
  });

  Url::parse(&format!("http://{}/", addr)).unwrap()
}

pub(crate) fn client() -> reqwest::Client {
  reqwest::Client::builder().no_proxy().build().unwrap()
}
