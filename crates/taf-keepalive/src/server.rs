//! Keep-alive HTTP server
//!
//! Runs the web role: binds the platform port with the declared backlog,
//! serves until a shutdown signal or the recycle limit, then drains
//! in-flight requests and returns so the process manager can relaunch
//! the role.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use tokio::net::{TcpListener, TcpSocket};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use taf_core::WebTuning;

use crate::error::{Result, ServerError};
use crate::middleware::recycle::{RequestRecycler, recycle_middleware};
use crate::routes::routes;

/// Start the keep-alive responder and serve until shutdown or recycle.
///
/// The recycle threshold is drawn once per launch from the tuning's
/// jitter band, so parallel workers spread their recycle points.
pub async fn start_server(port: u16, tuning: &WebTuning) -> Result<()> {
    let limit = u64::from(tuning.drawn_max_requests());
    let recycler = RequestRecycler::new(limit);

    // preload semantics: the full application is assembled before the
    // listener starts accepting
    let app = routes()
        .layer(middleware::from_fn_with_state(
            Arc::clone(&recycler),
            recycle_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(tuning.timeout_secs)))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = bind_with_backlog(addr, tuning.backlog)?;
    info!(
        "keep-alive responder listening on {} (workers={}, threads={}, class={}, timeout={}s, keep-alive={}s, max-requests={}, backlog={})",
        addr,
        tuning.workers,
        tuning.threads,
        tuning.worker_class,
        tuning.timeout_secs,
        tuning.keep_alive_secs,
        limit,
        tuning.backlog
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&recycler)))
        .await
        .map_err(ServerError::Io)?;

    if recycler.limit_reached() {
        info!("worker recycled after {} requests", recycler.served());
    }
    Ok(())
}

fn bind_with_backlog(addr: SocketAddr, backlog: u32) -> Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;
    Ok(socket.listen(backlog)?)
}

/// Resolves on Ctrl-C or once the recycle limit is reached.
async fn shutdown_signal(recycler: Arc<RequestRecycler>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        _ = recycler.recycled() => {
            info!("request limit {} reached, recycling worker", recycler.limit());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_with_backlog_uses_ephemeral_port() {
        let addr = SocketAddr::from(([0, 0, 0, 0], 0));
        let listener = bind_with_backlog(addr, 128).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_error_reports_address() {
        let addr = SocketAddr::from(([0, 0, 0, 0], 0));
        let first = bind_with_backlog(addr, 16).unwrap();
        let taken = first.local_addr().unwrap();

        // second bind on the same port fails with the address in the error
        let socket = TcpSocket::new_v4().unwrap();
        let err = match socket.bind(taken) {
            Err(source) => ServerError::Bind {
                addr: taken,
                source,
            },
            Ok(_) => return, // reuseaddr platforms may allow this; nothing to assert
        };
        assert!(err.to_string().contains(&taken.port().to_string()));
    }
}
