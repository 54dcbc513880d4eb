//! Helpers shared by unit tests and `tests/api_tests.rs`.
//!
//! Public rather than `#[cfg(test)]` because integration tests link against
//! the regular library build.

use axum::Router;

/// Serves `app` on an ephemeral local port and returns its base URL
pub async fn spawn_upstream(app: Router) -> std::io::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Test upstream stopped");
        }
    });
    Ok(format!("http://{}", addr))
}
