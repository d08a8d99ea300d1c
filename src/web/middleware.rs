pub use self::error::ErrorMiddleware;
pub use self::timeit::TimeItMiddleware;

mod error;
mod timeit;
