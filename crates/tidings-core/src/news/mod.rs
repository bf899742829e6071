//! News client
//!
//! A country selection drives one headlines request at a time through a
//! [`NewsSource`]; [`Headlines`] publishes loading / failed / loaded state.

pub mod client;
pub mod country;
pub mod feed;
pub mod models;

pub use client::{NewsApiClient, NewsSource};
pub use country::Country;
pub use feed::{FetchOutcome, FetchState, Headlines};
pub use models::{Article, NewsResponse, Source};
