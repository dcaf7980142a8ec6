pub mod client;
pub mod entrez;

pub use client::{FetchError, RateLimitedClient};
pub use entrez::EntrezClient;
