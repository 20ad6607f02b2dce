//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use redirect_resolver::config::{parse_config, RedirectConfig};
use redirect_resolver::http::HttpServer;
use redirect_resolver::lifecycle::{Services, Shutdown};
use redirect_resolver::routing::Resolver;
use redirect_resolver::rules::Catalog;

/// Rules, sites and content used across the resolution tests.
pub const FIXTURE: &str = r##"
[[sites]]
name = "Dotmar"
[[sites.mappings]]
repository = "website"
handle_prefix = "/dotmar"
uri_prefix = ""

[[content]]
id = "123"
internal_path = "/internal/forward/page.html"
external_link = "http://www.example.com/internal/forward/page.html"

[[rules]]
name = "xmas"
redirect = "/xmas"
link = "123"
link_suffix = "#anchor1"
type = "301"

[[rules]]
name = "external"
from_url = "/example"
to_url = "http://example.com"

[[rules]]
name = "external-forward"
from_url = "/example-forward"
to_url = "http://example.com"
redirect_type = "forward"

[[rules]]
name = "site-test"
from_url = "/test"
site = "Dotmar"
to_url = "/dotmar/landing"

[[rules]]
name = "promo-exact"
from_url = "/promo/summer"
to_url = "/summer-sale"

[[rules]]
name = "promo-pattern"
from_url = "/promo/*"
use_pattern = true
to_url = "/promotions"

[[rules]]
name = "products"
from_url = "/products/*"
use_pattern = true
to_url = "/shop"
redirect_type = "forward"

[[rules]]
name = "profile"
from_url = "/user/{username}/profile"
use_pattern = true
to_url = "/people/{username}"

[[rules]]
name = "blog"
from_url = "/blog/{year}/{month}"
use_pattern = true
to_url = "/archives/{year}-{month}"

[[rules]]
name = "legacy"
from_url = "^/legacy/(\\d+)/(?<slug>[a-z-]+)$"
use_pattern = true
to_url = "/articles/$1/{slug}"
redirect_type = "301"
"##;

/// Parsed fixture configuration.
pub fn fixture_config() -> RedirectConfig {
    parse_config(FIXTURE).unwrap()
}

/// Resolver over a fixture-based catalog.
pub fn resolver(config: &RedirectConfig) -> Resolver {
    Resolver::from_catalog(&Catalog::from_config(config), &config.resolver)
}

/// Start a mock upstream that answers every request with
/// `<method> <path-and-query>` as body.
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let request_line = head.lines().next().unwrap_or_default();
                        let mut parts = request_line.split_whitespace();
                        let body = format!(
                            "{} {}",
                            parts.next().unwrap_or_default(),
                            parts.next().unwrap_or_default()
                        );

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A running resolver service bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub services: Services,
    pub shutdown: Arc<Shutdown>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the HTTP server for `config`.
pub async fn start_server(mut config: RedirectConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let services = Services::from_config(&config);
    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(config, services.resolver.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        services,
        shutdown,
        handle,
    }
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
