//! Runs the HTTP and gRPC servers side by side over one [`MessageLog`].
//!
//! Both stop on the same signal. In-flight requests get
//! [`Config::shutdown_grace`] to finish before the servers are aborted.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::grpc;
use crate::http::{self, AppState};
use crate::storage::FileStorage;

/// Bound but not yet running servers.
pub struct Servers {
    http: TcpListener,
    grpc: TcpListener,
    state: AppState,
}

impl Servers {
    pub async fn bind(config: &Config) -> Result<Self> {
        let http = TcpListener::bind(config.http_addr)
            .await
            .with_context(|| format!("failed to bind http on {}", config.http_addr))?;
        let grpc = TcpListener::bind(config.grpc_addr)
            .await
            .with_context(|| format!("failed to bind grpc on {}", config.grpc_addr))?;

        let log = Arc::new(config.message_log());
        let state = AppState::new(log, FileStorage::new(&config.files_dir))?;
        Ok(Self { http, grpc, state })
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn grpc_addr(&self) -> std::io::Result<SocketAddr> {
        self.grpc.local_addr()
    }

    /// Serves until `shutdown` resolves or either server exits on its own.
    pub async fn run_until<F>(self, config: &Config, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Servers {
            http: http_listener,
            grpc: grpc_listener,
            state,
        } = self;
        let (stop_tx, stop_rx) = watch::channel(false);
        let log = Arc::clone(&state.log);

        let app = http::router(state);
        let mut http_task: JoinHandle<Result<()>> = {
            let stop = stopped(stop_rx.clone());
            tokio::spawn(async move {
                axum::serve(
                    http_listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(stop)
                .await
                .context("http server failed")
            })
        };
        let mut grpc_task: JoinHandle<Result<()>> = {
            let stop = stopped(stop_rx);
            tokio::spawn(async move {
                grpc::serve(grpc_listener, log, stop)
                    .await
                    .context("grpc server failed")
            })
        };

        tokio::select! {
            _ = shutdown => info!("shutdown requested"),
            res = &mut http_task => {
                warn!("http server exited early");
                let _ = stop_tx.send(true);
                grpc_task.abort();
                return flatten(res);
            }
            res = &mut grpc_task => {
                warn!("grpc server exited early");
                let _ = stop_tx.send(true);
                http_task.abort();
                return flatten(res);
            }
        }

        let _ = stop_tx.send(true);
        let drained = timeout(config.shutdown_grace, async {
            tokio::join!(&mut http_task, &mut grpc_task)
        })
        .await;

        match drained {
            Ok((http_res, grpc_res)) => {
                flatten(http_res)?;
                flatten(grpc_res)?;
                info!("servers stopped");
            }
            Err(_) => {
                warn!(grace = ?config.shutdown_grace, "grace period elapsed; aborting servers");
                http_task.abort();
                grpc_task.abort();
            }
        }
        Ok(())
    }
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

fn flatten(res: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match res {
        Ok(inner) => inner,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(err) => {
            error!(error = %err, "server task panicked");
            Err(err.into())
        }
    }
}

/// Binds both servers, prints their addresses and serves until SIGINT or
/// SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let servers = Servers::bind(&config).await?;
    let http_addr = servers.http_addr()?;
    let grpc_addr = servers.grpc_addr()?;

    println!("http listening on {http_addr}");
    println!("grpc listening on {grpc_addr}");
    info!(%http_addr, %grpc_addr, messages_file = %config.messages_file.display(), "servers listening");

    servers.run_until(&config, shutdown_signal()).await
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
