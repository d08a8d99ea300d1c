//! CLI options.

use std::num::NonZeroUsize;

use clap::{Args, Parser, Subcommand};

use crate::prelude::*;
use crate::window::WindowStore;

mod parsers;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "EVALUATION_PROXY_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate for Sentry
    #[arg(
        long,
        env = "EVALUATION_PROXY_TRACES_SAMPLE_RATE",
        default_value = "0",
        value_parser = parsers::sample_rate,
    )]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Numbers(NumbersOpts),
    Social(SocialOpts),
}

/// Runs the sliding-window average calculator
#[derive(Args)]
pub struct NumbersOpts {
    /// Web application bind host
    #[arg(long, default_value = "::", env = "EVALUATION_PROXY_HOST")]
    pub host: String,

    /// Web application bind port
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    #[command(flatten)]
    pub evaluation: EvaluationOpts,

    /// Maximum number of unique numbers kept in the window
    #[arg(
        long,
        default_value_t = WindowStore::DEFAULT_CAPACITY,
        env = "EVALUATION_PROXY_WINDOW_SIZE"
    )]
    pub window_size: NonZeroUsize,

    /// Bearer token for the number endpoints
    #[arg(long, env = "EVALUATION_PROXY_ACCESS_TOKEN")]
    pub access_token: Option<String>,
}

/// Runs the social analytics service
#[derive(Args)]
pub struct SocialOpts {
    /// Web application bind host
    #[arg(long, default_value = "::", env = "EVALUATION_PROXY_HOST")]
    pub host: String,

    /// Web application bind port
    #[arg(short, long, default_value = "8000", env = "PORT")]
    pub port: u16,

    #[command(flatten)]
    pub evaluation: EvaluationOpts,
}

#[derive(Args)]
pub struct EvaluationOpts {
    /// Evaluation service base URL
    #[arg(
        long,
        default_value = "http://20.244.56.144/evaluation-service",
        env = "EVALUATION_PROXY_BASE_URL",
        value_parser = parsers::base_url,
    )]
    pub base_url: String,

    /// Upstream request timeout, the request is given up afterwards
    #[arg(
        long,
        default_value = "500ms",
        env = "EVALUATION_PROXY_TIMEOUT",
        value_parser = humantime::parse_duration,
    )]
    pub timeout: StdDuration,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Opts::command().debug_assert();
    }

    #[test]
    fn parse_numbers_defaults_ok() -> crate::Result {
        let opts = Opts::try_parse_from(["evaluation-proxy", "numbers"])?;
        match opts.subcommand {
            Command::Numbers(opts) => {
                assert_eq!(opts.port, 3000);
                assert_eq!(opts.window_size, WindowStore::DEFAULT_CAPACITY);
                assert_eq!(opts.window_size.get(), 10);
                assert_eq!(opts.evaluation.timeout, StdDuration::from_millis(500));
            }
            Command::Social(_) => unreachable!(),
        }
        Ok(())
    }

    #[test]
    fn zero_window_size_is_rejected() {
        assert!(
            Opts::try_parse_from(["evaluation-proxy", "numbers", "--window-size", "0"]).is_err()
        );
    }
}
