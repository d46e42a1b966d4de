//! Satellite transit prediction tools for conversational agents: catalog
//! lookups, element sets, geocoding, pass prediction and cloud cover
//! forecasts, served over a JSON-RPC tool protocol.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod predict;
pub mod protocol;
pub mod testing;
pub mod tools;
pub mod web;
