//! # Top-up server
//! This crate hosts the HTTP side of the top-up service. It is responsible for:
//! * Listening for payment webhooks from Razorpay.
//! * Authenticating each delivery against the raw request bytes before anything else looks at it.
//! * Decoding the event and handing captured payments to the ledger in `topup_engine`.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook`: The Razorpay webhook route. Requests must carry a valid `X-Razorpay-Signature` header.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
