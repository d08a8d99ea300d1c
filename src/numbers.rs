//! Sliding-window average calculator.

use std::str::FromStr;

use poem::http::StatusCode;
use poem::middleware::{CatchPanic, Tracing};
use poem::web::{Data, Json, Path};
use poem::{get, handler, Endpoint, EndpointExt, IntoResponse, Response, Route};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::evaluation::models::Category;
use crate::evaluation::{EvaluationApi, NumberSource};
use crate::opts::NumbersOpts;
use crate::prelude::*;
use crate::web;
use crate::web::middleware::{ErrorMiddleware, TimeItMiddleware};
use crate::web::responses;
use crate::window::{Number, WindowStore};

pub async fn run(opts: NumbersOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "numbers"));

    let api = EvaluationApi::new(opts.evaluation.base_url, opts.evaluation.timeout)?
        .with_access_token(opts.access_token.as_deref());
    let store = WindowStore::new(opts.window_size);
    info!(window_size = opts.window_size.get(), "created the window store");

    let app = create_app(Arc::new(api), Arc::new(Mutex::new(store)));
    web::serve(&opts.host, opts.port, app).await
}

pub fn create_app(
    source: Arc<dyn NumberSource>,
    store: Arc<Mutex<WindowStore>>,
) -> impl Endpoint<Output = Response> {
    Route::new()
        .at("/numbers/:number_id", get(get_numbers))
        .data(source)
        .data(store)
        .with(Tracing)
        .with(CatchPanic::new())
        .with(TimeItMiddleware)
        .with(ErrorMiddleware)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowResponse {
    previous_window: Vec<Number>,
    current_window: Vec<Number>,

    /// Window contents after the merge.
    numbers: Vec<Number>,

    average: f64,
}

#[handler]
#[instrument(skip_all, level = "info")]
async fn get_numbers(
    Path(number_id): Path<String>,
    source: Data<&Arc<dyn NumberSource>>,
    store: Data<&Arc<Mutex<WindowStore>>>,
) -> Result<Response> {
    let category = match Category::from_str(&number_id) {
        Ok(category) => category,
        Err(error) => {
            info!("{:#}", error);
            return Ok(responses::error(StatusCode::BAD_REQUEST, "Invalid number type"));
        }
    };

    // The store must not be locked while the upstream is being called.
    let numbers = source.fetch_numbers(category).await;

    let (merge, average) = {
        let mut store = store.lock().await;
        let merge = store.merge(&numbers);
        (merge, store.average())
    };
    debug!(%category, n_fetched = numbers.len(), n_retained = merge.current.len(), average);

    Ok(Json(WindowResponse {
        previous_window: merge.previous,
        numbers: merge.current.clone(),
        current_window: merge.current,
        average,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::num::NonZeroUsize;

    use async_trait::async_trait;
    use futures::future::join_all;
    use poem::test::{TestClient, TestResponse};
    use serde_json::{json, Value};

    use super::*;

    /// Replies with the scripted batches, then with empty ones.
    struct ScriptedSource(std::sync::Mutex<VecDeque<Vec<Number>>>);

    impl ScriptedSource {
        fn new(batches: Vec<Vec<Number>>) -> Arc<dyn NumberSource> {
            Arc::new(Self(std::sync::Mutex::new(batches.into())))
        }
    }

    #[async_trait]
    impl NumberSource for ScriptedSource {
        async fn fetch_numbers(&self, _category: Category) -> Vec<Number> {
            self.0
                .lock()
                .map(|mut batches| batches.pop_front().unwrap_or_default())
                .unwrap_or_default()
        }
    }

    fn store(capacity: usize) -> Arc<Mutex<WindowStore>> {
        Arc::new(Mutex::new(WindowStore::new(NonZeroUsize::new(capacity).unwrap())))
    }

    async fn into_json(response: TestResponse) -> crate::Result<Value> {
        response
            .0
            .into_body()
            .into_json::<Value>()
            .await
            .map_err(|error| anyhow!("invalid JSON response: {}", error))
    }

    #[tokio::test]
    async fn get_numbers_ok() {
        let source = ScriptedSource::new(vec![vec![1, 2, 3], vec![4]]);
        let client = TestClient::new(create_app(source, store(3)));

        let response = client.get("/numbers/p").send().await;
        response.assert_status_is_ok();
        response
            .assert_json(json!({
                "previousWindow": [],
                "currentWindow": [1, 2, 3],
                "numbers": [1, 2, 3],
                "average": 2.0,
            }))
            .await;

        let response = client.get("/numbers/e").send().await;
        response.assert_status_is_ok();
        response
            .assert_json(json!({
                "previousWindow": [1, 2, 3],
                "currentWindow": [2, 3, 4],
                "numbers": [2, 3, 4],
                "average": 3.0,
            }))
            .await;
    }

    #[tokio::test]
    async fn numbers_field_holds_window_not_batch() -> crate::Result {
        let source = ScriptedSource::new(vec![vec![1, 2, 3], vec![4, 4, 1]]);
        let client = TestClient::new(create_app(source, store(3)));
        client.get("/numbers/p").send().await.assert_status_is_ok();

        let body = into_json(client.get("/numbers/p").send().await).await?;
        assert_eq!(body["numbers"], json!([2, 3, 4]));
        assert_eq!(body["numbers"], body["currentWindow"]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_fetch_keeps_window() {
        let source = ScriptedSource::new(vec![vec![10, 20]]);
        let client = TestClient::new(create_app(source, store(10)));
        client.get("/numbers/r").send().await.assert_status_is_ok();

        let response = client.get("/numbers/r").send().await;
        response.assert_status_is_ok();
        response
            .assert_json(json!({
                "previousWindow": [10, 20],
                "currentWindow": [10, 20],
                "numbers": [10, 20],
                "average": 15.0,
            }))
            .await;
    }

    #[tokio::test]
    async fn empty_window_average_is_zero() -> crate::Result {
        let client = TestClient::new(create_app(ScriptedSource::new(vec![]), store(10)));
        let response = client.get("/numbers/f").send().await;
        response.assert_status_is_ok();
        let body = into_json(response).await?;
        assert_eq!(body["average"], json!(0.0));
        assert_eq!(body["currentWindow"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_number_id_is_rejected() {
        let store = store(10);
        let source = ScriptedSource::new(vec![vec![1]]);
        let client = TestClient::new(create_app(source, store.clone()));

        let response = client.get("/numbers/x").send().await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(json!({"error": "Invalid number type"})).await;
        assert!(store.lock().await.snapshot().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let client = TestClient::new(create_app(ScriptedSource::new(vec![]), store(10)));
        client.get("/numbers").send().await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_merges_respect_capacity() {
        let store = store(4);
        let tasks = join_all((0..64).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.lock().await.merge(&[i, i + 1, i % 5]) })
        }))
        .await;
        for task in tasks {
            assert!(task.unwrap().current.len() <= 4);
        }
        assert_eq!(store.lock().await.snapshot().len(), 4);
    }
}
