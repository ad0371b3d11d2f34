//! # flowdex-query: Read-only projection over the state store
//!
//! The query layer external consumers (the dashboard) see: list streams
//! filterable by participant, token, and open/closed status; list
//! activities filterable by stream or participant. Strictly read-only,
//! strictly over committed tables: the executor scans a
//! [`Tables`](flowdex_store::Tables) snapshot, so it can never observe a
//! half-applied event.
//!
//! Field names in serialized results follow the entity definitions in
//! `flowdex-types` (`flowRate`, `createdAt`, ...), which is the contract
//! the dashboard's rendering keys off.

mod executor;
mod filter;

pub use executor::{list_activities, list_streams};
pub use filter::{ActivityFilter, Page, ScanOrder, StreamFilter, StreamOrder};

#[cfg(test)]
mod tests;
