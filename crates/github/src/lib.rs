//! GitHub REST client implementing [`notifeed_feed::NotificationSource`].

pub mod client;
pub mod error;
pub mod types;

pub use {
    client::GitHubClient,
    error::{Error, Result},
};
