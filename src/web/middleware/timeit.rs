use poem::{Endpoint, Middleware, Request, Response, Result};

use crate::prelude::*;

/// Logs the method, URI, status and elapsed time of every request.
pub struct TimeItMiddleware;

impl<E: Endpoint<Output = Response>> Middleware<E> for TimeItMiddleware {
    type Output = TimeItMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        TimeItMiddlewareImpl { ep }
    }
}

pub struct TimeItMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint<Output = Response>> Endpoint for TimeItMiddlewareImpl<E> {
    type Output = Response;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let start_instant = Instant::now();
        let response = self.ep.call(request).await;
        let status = match &response {
            Ok(response) => response.status(),
            Err(error) => error.status(),
        };
        info!(elapsed = ?start_instant.elapsed(), ?method, ?uri, %status);
        response
    }
}
