//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use provider_rotation::adapter::{ProviderAdapter, ProviderRequest, ProviderResponse};
use provider_rotation::config::{EndpointConfig, EngineConfig};
use provider_rotation::health::RecoveryScheduler;
use provider_rotation::{ProviderError, ProviderKind, RotationEngine, SelectedEndpoint};

/// Start a programmable mock provider on an ephemeral port.
///
/// `f` returns (status, extra headers, body) for each request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(&'static str, String)>, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;

                        let (status, headers, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let extra: String = headers
                            .iter()
                            .map(|(name, value)| format!("{}: {}\r\n", name, value))
                            .collect();
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            extra,
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

/// Consume one request (head plus Content-Length body) from `socket`.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + body_len {
            return;
        }
    }
}

pub fn endpoint(group: &str, name: &str) -> EndpointConfig {
    EndpointConfig {
        name: name.to_string(),
        group: group.to_string(),
        kind: ProviderKind::infer_from_group(group).or(Some(ProviderKind::Serper)),
        base_url: None,
        credential: Some(format!("key-{}", name)),
        credential_env: None,
        max_requests_per_window: None,
    }
}

/// Config with `groups` (group, endpoint names) and the given chains.
pub fn config(groups: &[(&str, Vec<&str>)], chains: &[(&str, Vec<Vec<&str>>)]) -> EngineConfig {
    let mut config = EngineConfig::default();
    for (group, names) in groups {
        for name in names {
            config.endpoints.push(endpoint(group, name));
        }
    }
    config.chains = chains
        .iter()
        .map(|(category, tiers)| {
            let tiers = tiers
                .iter()
                .map(|tier| tier.iter().map(|g| g.to_string()).collect())
                .collect();
            (category.to_string(), tiers)
        })
        .collect();
    config
}

pub fn engine(groups: &[(&str, Vec<&str>)], chains: &[(&str, Vec<Vec<&str>>)]) -> (Arc<RotationEngine>, RecoveryScheduler) {
    let (engine, scheduler) = RotationEngine::from_config(&config(groups, chains)).unwrap();
    (Arc::new(engine), scheduler)
}

/// Adapter answering from per-endpoint scripts; unscripted calls succeed.
#[derive(Default)]
pub struct ScriptedAdapter {
    scripts: Mutex<HashMap<String, VecDeque<Result<ProviderResponse, ProviderError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, endpoint: &str, outcome: Result<ProviderResponse, ProviderError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Endpoint names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProviderAdapter for ScriptedAdapter {
    fn call<'a>(
        &'a self,
        endpoint: &'a SelectedEndpoint,
        _request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>> {
        self.calls.lock().unwrap().push(endpoint.name.clone());
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&endpoint.name)
            .and_then(VecDeque::pop_front);
        let outcome = scripted.unwrap_or_else(|| Ok(serde_json::json!({ "endpoint": endpoint.name })));
        async move { outcome }.boxed()
    }
}
