//! Line-oriented TCP front-end.
//!
//! Each connection gets its own [`Executor`] (and therefore its own session
//! state), while all connections share one lock registry so concurrent
//! statements against the same table serialize. The protocol is plain text:
//! one statement per line in, the result (or error text) back.

use crate::executor::Executor;
use crate::storage::LockRegistry;
use anyhow::Result;
use log::{info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub struct Server {
    root: PathBuf,
    locks: Arc<LockRegistry>,
}

impl Server {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Server {
            root: root.into(),
            locks: Arc::new(LockRegistry::new()),
        }
    }

    pub async fn run(&self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("listening on {}", addr);

        loop {
            let (socket, peer) = listener.accept().await?;
            info!("connection from {}", peer);

            let root = self.root.clone();
            let locks = self.locks.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(socket, root, locks).await {
                    warn!("connection {}: {}", peer, err);
                }
            });
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    root: PathBuf,
    locks: Arc<LockRegistry>,
) -> Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut executor = Executor::with_locks(root, locks);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        // Statement evaluation does synchronous filesystem I/O, so it runs
        // off the async runtime. The executor moves into the blocking task
        // and back out to keep session state across statements.
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = executor.execute(&line);
            (executor, result)
        })
        .await?;
        executor = returned;

        let reply = match result {
            Ok(output) => output,
            Err(err) => err.to_string(),
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    Ok(())
}
