//! Shared poem plumbing for both services.

use std::net::IpAddr;
use std::str::FromStr;

use poem::listener::TcpListener;
use poem::{Endpoint, Response, Server};

use crate::prelude::*;

pub mod middleware;
pub mod responses;

/// Time given to the in-flight requests to complete after Ctrl+C.
const SHUTDOWN_TIMEOUT: StdDuration = StdDuration::from_secs(5);

pub async fn serve(
    host: &str,
    port: u16,
    app: impl Endpoint<Output = Response> + 'static,
) -> Result {
    let address = (IpAddr::from_str(host)?, port);
    info!(host, port, "listening…");
    Server::new(TcpListener::bind(address))
        .run_with_graceful_shutdown(
            app,
            async {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for Ctrl+C: {:#}", error);
                }
                info!("shutting down…");
            },
            Some(SHUTDOWN_TIMEOUT),
        )
        .await?;
    Ok(())
}
