//! # Feedgate Server Library
//!
//! Startup wiring for the gateway: the shared cache engine, the Xero
//! credential session and the health routes.

pub mod app;
pub mod health;
pub mod startup;
