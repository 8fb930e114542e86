pub mod client;
pub mod error;
mod types;

pub use client::RatesClient;
pub use error::RatesError;
