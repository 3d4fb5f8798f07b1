//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use httpmole::config::MoleConfig;
use httpmole::http::HttpServer;
use httpmole::lifecycle::{startup, Shutdown};
use httpmole::observability::{BodyFormatChoice, SharedBuffer, TrafficLog};
use httpmole::responders::{upstream_client, Responder};

/// A running instance on an ephemeral port.
pub struct Mole {
    pub addr: SocketAddr,
    buffer: SharedBuffer,
    traffic: TrafficLog,
    shutdown: Shutdown,
    responder: Arc<Responder>,
    handle: JoinHandle<std::io::Result<()>>,
}

#[allow(dead_code)]
impl Mole {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Everything written to the traffic log so far.
    pub async fn traffic(&self) -> String {
        self.traffic.flush().await;
        self.buffer.contents()
    }

    /// Trigger shutdown, wait for the server and close the responder.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
        assert!(result.is_ok());
        self.responder.close();
    }
}

/// Start an instance with `config`; the bind address is replaced by an ephemeral port.
pub async fn start_mole(mut config: MoleConfig) -> Mole {
    config.listener.bind_address = "127.0.0.1:0".into();
    config.logging.body_format = BodyFormatChoice::Compact;

    let client = upstream_client();
    let responder = Arc::new(startup::build_responder(&config.response, client.clone()).unwrap());
    let buffer = SharedBuffer::default();
    let traffic = TrafficLog::new(buffer.clone());
    let dispatcher =
        startup::build_dispatcher(&config, responder.clone(), client, traffic.clone()).unwrap();
    let listener = startup::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(HttpServer::new(dispatcher).run(listener, shutdown.subscribe()));

    Mole {
        addr,
        buffer,
        traffic,
        shutdown,
        responder,
        handle,
    }
}

/// Start a mock backend that answers every request with its own request target,
/// e.g. `GET /hello?x=1` → body `/hello?x=1`.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("")
                            .to_string();

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Backend: echo\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            target.len(),
                            target
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
