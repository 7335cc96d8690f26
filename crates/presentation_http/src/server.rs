//! Server lifecycle with a bounded graceful shutdown

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};

/// Serve `app` until `shutdown` completes, then drain for at most `grace`
///
/// Connections still open when `grace` elapses are abandoned and the call
/// returns.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> std::io::Result<()> {
    let signalled = Arc::new(Notify::new());
    let notifier = signalled.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Waiting up to {:?} for connections to close...", grace);
            notifier.notify_one();
        })
        .into_future();

    let deadline = async {
        signalled.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result,
        () = deadline => {
            warn!(
                grace_secs = grace.as_secs(),
                "Shutdown timeout elapsed with connections still open"
            );
            Ok(())
        }
    }
}
