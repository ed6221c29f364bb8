//! The VoteChain client: the connection context, the page view-models derived from the
//! voting contract, and the pieces they share.

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod connection;
pub mod countdown;
mod error;
pub mod pages;

pub use cache::{CachedLedger, CachingProvider};
pub use config::{from_toml_path, ClientConfig};
pub use connection::{ConnectionContext, EventOutcome};
pub use countdown::Countdown;
pub use error::{Action, ConnectionError, PageError};
