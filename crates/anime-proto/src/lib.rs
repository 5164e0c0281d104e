//! Shared model and plumbing for the anime schedule client.
//!
//! - [`catalog`]: records as the Jikan API returns them
//! - [`client`]: read-only HTTP access to the catalog endpoints
//! - [`schedule`]: grouping of records by broadcast day
//! - [`config`] / [`platform`]: configuration file and on-disk paths

pub mod catalog;
pub mod client;
pub mod config;
pub mod platform;
pub mod schedule;

pub use catalog::{AnimeRecord, Broadcast, CatalogPage, ImageSet, Images};
pub use client::{CatalogClient, CatalogError, Endpoint, ErrorKind};
