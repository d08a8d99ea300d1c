use clap::Parser;

use crate::opts::{Command, Opts};
use crate::prelude::*;

mod evaluation;
mod logging;
mod numbers;
mod opts;
mod prelude;
mod social;
mod web;
mod window;

#[tokio::main]
async fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = logging::init(opts.sentry_dsn, opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let result = match opts.subcommand {
        Command::Numbers(opts) => numbers::run(opts).await,
        Command::Social(opts) => social::run(opts).await,
    };
    if let Err(error) = &result {
        error!("fatal error: {:#}", error);
    }
    result
}
