//! Shared utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use edge_httpd::config::RouteMapping;
use edge_httpd::discovery::{Discovery, DiscoveryError, DiscoveryRegistration, ServiceInstance};
use edge_httpd::RequestDispatcher;

/// Read a request head and return its request target (path and query).
async fn read_request_target(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string()
}

async fn write_response(socket: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a backend that answers every request with its request target.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let target = read_request_target(&mut socket).await;
                write_response(&mut socket, &target).await;
            });
        }
    });

    addr
}

/// Start a backend that waits `delay` before answering "slow".
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_target(&mut socket).await;
                tokio::time::sleep(delay).await;
                write_response(&mut socket, "slow").await;
            });
        }
    });

    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A port nothing is listening on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Serve a dispatcher on an ephemeral local port.
pub async fn serve_dispatcher(dispatcher: RequestDispatcher) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = dispatcher
        .into_router()
        .into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub fn mapping(path: &str, host: &str, strip_prefix: bool, prefix_path: &str) -> RouteMapping {
    RouteMapping {
        path: path.to_string(),
        scheme: "http".to_string(),
        host: host.to_string(),
        strip_prefix,
        prefix_path: prefix_path.to_string(),
    }
}

/// In-memory discovery backend that records every call.
#[derive(Default)]
pub struct FakeDiscovery {
    pub instances: Vec<ServiceInstance>,
    pub fail_connect: bool,
    pub fail_lookup: bool,
    pub lookups: Mutex<Vec<String>>,
    pub registered: Mutex<Vec<DiscoveryRegistration>>,
    pub deregistered: Mutex<Vec<String>>,
}

impl FakeDiscovery {
    pub fn with_instances(instances: Vec<ServiceInstance>) -> Self {
        Self {
            instances,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Discovery for FakeDiscovery {
    async fn check_connection(&self) -> Result<(), DiscoveryError> {
        if self.fail_connect {
            return Err(DiscoveryError::Connect {
                endpoint: "fake".to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(())
    }

    async fn register(&self, registration: &DiscoveryRegistration) -> Result<(), DiscoveryError> {
        self.registered.lock().unwrap().push(registration.clone());
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError> {
        self.deregistered
            .lock()
            .unwrap()
            .push(instance_id.to_string());
        Ok(())
    }

    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        self.lookups.lock().unwrap().push(service_name.to_string());
        if self.fail_lookup {
            return Err(DiscoveryError::Status {
                operation: format!("lookup {}", service_name),
                status: 500,
            });
        }
        Ok(self.instances.clone())
    }
}
