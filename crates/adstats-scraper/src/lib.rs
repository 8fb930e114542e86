pub mod client;
pub mod error;
pub mod extract;
pub mod reconcile;
pub mod types;

pub use client::AdsClient;
pub use error::ScrapeError;
pub use reconcile::reconcile;
pub use types::{CampaignPage, DailyStat};
