//! Logging and error reporting.
//!
//! Console output is filtered by `EVALUATION_PROXY_LOG`, defaulting to
//! `evaluation_proxy=info,poem=info`. Sentry receives warnings and errors as events
//! and everything down to `debug` from this crate as breadcrumbs,
//! overridable with `EVALUATION_PROXY_SENTRY_LOG`.

use std::borrow::Cow;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Initialises Sentry and the tracing subscriber.
///
/// The returned guard must be kept alive until the process exits.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));

    let sentry_filter = EnvFilter::try_from_env("EVALUATION_PROXY_SENTRY_LOG")
        .or_else(|_| EnvFilter::try_new("evaluation_proxy=debug"))?;
    let sentry_layer = sentry::integrations::tracing::layer()
        .event_filter(|metadata| match *metadata.level() {
            Level::ERROR | Level::WARN => EventFilter::Event,
            Level::INFO | Level::DEBUG | Level::TRACE => EventFilter::Breadcrumb,
        })
        .span_filter(|metadata| {
            matches!(*metadata.level(), Level::ERROR | Level::WARN | Level::INFO)
        })
        .with_filter(sentry_filter);

    let format_filter = EnvFilter::try_from_env("EVALUATION_PROXY_LOG")
        .or_else(|_| EnvFilter::try_new("evaluation_proxy=info,poem=info"))?;
    let format_layer = tracing_subscriber::fmt::layer().with_filter(format_filter);

    tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .try_init()?;

    Ok(guard)
}
