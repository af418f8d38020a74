pub mod client;

pub use client::{scrape_csrf_token, ClientError, PlotClient};
