//! Testing utilities for scenarios exercising health policies.
//!
//! Available when running tests or when the `test-utils` feature is enabled.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A minimal HTTP endpoint answering every request with `healthy\n`.
///
/// Health policies in `NODE_STATUS_POLL_URL` mode probe an URL to decide node
/// health; scenarios point that URL here.
pub struct HealthServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl HealthServer {
    /// Bind on an ephemeral local port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown, mut rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    accepted = listener.accept() => {
                        let Ok((mut socket, _)) = accepted else { break };
                        tokio::spawn(async move {
                            let mut buf = [0u8; 1024];
                            let _ = socket.read(&mut buf).await;
                            let body = b"healthy\n";
                            let head = format!(
                                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                                body.len()
                            );
                            let _ = socket.write_all(head.as_bytes()).await;
                            let _ = socket.write_all(body).await;
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    /// The URL health policies should poll.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop serving and wait for the accept loop to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}
