//! rebackup Core - Domain types, configuration and port definitions
//!
//! This crate contains:
//! - **Domain types** - `DirectoryListing`, `SyncPlan`, `CycleReport`, `SyncInterval`
//! - **Port definitions** - Traits for adapters: `ILocalFileSystem`, `IAlertService`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure logic with no I/O. Ports define the trait
//! interfaces the sync engine depends on; their implementations live in
//! `rebackup-sync` (filesystem) and `rebackup-alerts` (sound and speech).

pub mod config;
pub mod domain;
pub mod ports;
