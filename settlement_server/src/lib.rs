//! # Storefront payment settlement server
//! This crate hosts the HTTP front end of the settlement engine. It is responsible for:
//! * Accepting payment requests for orders and settling them from the customer's wallet or via Paystack.
//! * Receiving Paystack webhook confirmations and applying them to payments and orders.
//! * Periodically reconciling payments that have been pending for too long.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /payments`: Settle an order.
//! * `GET /payments/{reference}`: Fetch a payment by its reference.
//! * `GET /orders/{order_id}/payments`: All payment attempts for an order.
//! * `GET /wallets/{user_id}`: A customer's wallet balance.
//! * `POST /wallets/{user_id}/top-ups`: Credit a customer's wallet. The body carries the amount and a unique reference.
//! * `GET /wallets/{user_id}/history`: The wallet's journal, oldest first.
//! * `POST /webhook/paystack`: Paystack event notifications. Requests must carry a valid `x-paystack-signature`.

pub mod audit_hooks;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod paystack;
pub mod reconciliation_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
