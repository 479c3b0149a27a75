//! Quiz server listener
//!
//! Handles TCP accept loop and spawns connection handlers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::cache::{QuizCache, QuizLoader, QuizSource};
use crate::error::Result;
use crate::registry::{SessionRegistry, SessionStore};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::service::QuizService;
use crate::stats::ServerStats;

/// Decrements the active connection count when a handler finishes
struct ActiveGuard(Arc<AtomicU64>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Quiz server
pub struct QuizServer<S, Q> {
    config: ServerConfig,
    service: Arc<QuizService<S, Q>>,
    registry: Option<Arc<SessionRegistry>>,
    next_connection_id: AtomicU64,
    total_connections: AtomicU64,
    active_connections: Arc<AtomicU64>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<L: QuizLoader + 'static> QuizServer<Arc<SessionRegistry>, QuizCache<L>> {
    /// Create a server over the in-memory registry and a cached loader
    ///
    /// The registry's background cleanup runs while the server runs.
    pub fn new(config: ServerConfig, loader: L) -> Self {
        let registry = Arc::new(SessionRegistry::with_config(config.registry.clone()));
        let cache = QuizCache::with_config(loader, config.cache.clone());
        let service = QuizService::new(Arc::clone(&registry), cache);

        let mut server = Self::with_service(config, service);
        server.registry = Some(registry);
        server
    }
}

impl<S, Q> QuizServer<S, Q>
where
    S: SessionStore + 'static,
    Q: QuizSource + 'static,
{
    /// Create a server over an existing service
    pub fn with_service(config: ServerConfig, service: QuizService<S, Q>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            service: Arc::new(service),
            registry: None,
            next_connection_id: AtomicU64::new(1),
            total_connections: AtomicU64::new(0),
            active_connections: Arc::new(AtomicU64::new(0)),
            connection_semaphore,
        }
    }

    /// Get a reference to the quiz service
    pub fn service(&self) -> &Arc<QuizService<S, Q>> {
        &self.service
    }

    /// Connection counters
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown).await
    }

    /// Serve an already bound listener until `shutdown` resolves
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Quiz server listening");

        // Spawn cleanup task for session registry
        let cleanup_handle = self.registry.as_ref().map(|r| r.spawn_cleanup_task());

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        // Stop cleanup task on shutdown
        if let Some(handle) = cleanup_handle {
            handle.abort();
        }

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let conn_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(conn_id = conn_id, peer = %peer_addr, "New connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        let guard = ActiveGuard(Arc::clone(&self.active_connections));

        let connection = Connection::new(
            conn_id,
            socket,
            Arc::clone(&self.service),
            self.config.max_frame_size,
        );

        tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;

            if let Err(e) = connection.run().await {
                tracing::debug!(conn_id = conn_id, error = %e, "Connection error");
            }

            tracing::debug!(conn_id = conn_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::sync::oneshot;

    use super::*;
    use crate::cache::StaticQuizLoader;
    use crate::model::{Question, Quiz};
    use crate::server::message::Outbound;

    fn loader() -> StaticQuizLoader {
        StaticQuizLoader::new([Quiz::new("quiz-1").question(
            Question::new("q1", "Pick b", 5)
                .option("a", "A", false)
                .option("b", "B", true),
        )])
    }

    async fn start(
        config: ServerConfig,
    ) -> (
        Arc<QuizServer<Arc<SessionRegistry>, QuizCache<StaticQuizLoader>>>,
        SocketAddr,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(QuizServer::new(config, loader()));
        let (tx, rx) = oneshot::channel::<()>();

        let running = Arc::clone(&server);
        let handle = tokio::spawn(async move {
            running
                .serve_until(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        (server, addr, tx, handle)
    }

    async fn wait_for(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let (server, addr, shutdown, handle) = start(ServerConfig::default()).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"type\":\"join\",\"payload\":{\"quizId\":\"quiz-1\",\"userId\":\"u1\",\"name\":\"Ann\"}}\n")
            .await
            .unwrap();

        let first: Outbound = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(matches!(first, Outbound::Joined(_)));
        let second: Outbound = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(matches!(second, Outbound::Leaderboard(_)));

        writer
            .write_all(b"{\"type\":\"answer\",\"payload\":{\"questionId\":\"q1\",\"optionId\":\"b\"}}\n")
            .await
            .unwrap();
        let result: Outbound = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        match result {
            Outbound::AnswerResult(result) => assert_eq!(result.total_score, 5),
            other => panic!("unexpected message: {:?}", other),
        }

        assert_eq!(server.stats().total_connections, 1);
        assert_eq!(server.stats().active_connections, 1);

        drop(writer);
        drop(lines);
        wait_for(|| server.stats().active_connections == 0).await;

        shutdown.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = ServerConfig::default().max_connections(1);
        let (server, addr, shutdown, handle) = start(config).await;

        let _first = TcpStream::connect(addr).await.unwrap();
        wait_for(|| server.stats().active_connections == 1).await;

        let second = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(second).lines();
        // Rejected sockets are closed without a response
        assert!(lines.next_line().await.unwrap().is_none());
        assert_eq!(server.stats().total_connections, 1);

        shutdown.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_until_binds_and_stops() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = QuizServer::new(ServerConfig::with_addr(addr), loader());

        assert_eq!(server.bind_addr(), addr);
        tokio_test::assert_ok!(server.run_until(async {}).await);
    }
}
