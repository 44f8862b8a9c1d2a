use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};

use crate::config::Config;
use crate::handlers::AppState;
use crate::models;
use crate::routes::{RouterOptions, router};
use crate::session::SessionStore;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

fn listen_addr(raw: &str) -> String {
    if raw.parse::<SocketAddr>().is_ok() {
        raw.to_string()
    } else if let Some(port) = raw.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        format!("0.0.0.0:{raw}")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}

/// Open the database, build the router and serve until interrupted.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the listen
/// address cannot be bound.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let models = models::open(&cfg.db_path)
        .await
        .map_err(|e| anyhow!("{e}"))?;
    info!("database connection pool established");

    let sessions = SessionStore::new(cfg.session_lifetime(), cfg.secure_cookies);
    let purge = sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = purge.purge_expired();
            if removed > 0 {
                info!(removed, "purged expired sessions");
            }
        }
    });

    let state = AppState::new(models, sessions);
    let opts = RouterOptions {
        static_dir: cfg.static_dir.clone(),
        max_form_bytes: cfg.max_form_bytes,
    };
    let app = router(state, &opts);

    let addr = listen_addr(&cfg.addr);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("starting server on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::listen_addr;

    #[test]
    fn port_only_binds_all_interfaces() {
        assert_eq!(listen_addr(":4000"), "0.0.0.0:4000");
        assert_eq!(listen_addr("8080"), "0.0.0.0:8080");
    }

    #[test]
    fn full_address_is_kept() {
        assert_eq!(listen_addr("127.0.0.1:4000"), "127.0.0.1:4000");
        assert_eq!(listen_addr("[::1]:4000"), "[::1]:4000");
    }
}
