//! Wire types and provider client for the payrecon reconciler.
//!
//! The `objects` module holds everything that crosses a process boundary:
//! the webhook envelope posted by the payment provider, the invoice and
//! transfer objects exchanged with the provider API, and the admin API DTOs.
//! The typed HTTP client lives behind the `client` feature.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
