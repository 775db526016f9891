//! # vaultkeep
//!
//! A content-addressed incremental backup engine. Captures point-in-time
//! snapshots of a directory tree, storing each unique byte-stream exactly
//! once, and restores any snapshot back to a bit-identical tree. Shared
//! content survives pruning as long as any snapshot still references it.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  CLI (clap)  │
//!                    └──────┬───────┘
//!                           │
//!        ┌─────────┬────────┼────────┬─────────┐
//!        ▼         ▼        ▼         ▼         ▼
//!   ┌─────────┐ ┌──────┐ ┌───────┐ ┌───────┐ ┌───────┐
//!   │snapshot │ │ list │ │restore│ │ prune │ │ check │
//!   └────┬────┘ └──┬───┘ └───┬───┘ └───┬───┘ └───┬───┘
//!        │         │         │         │         │
//!        └─────────┴────┬────┴─────────┴─────────┘
//!                       ▼
//!                 ┌───────────┐        ┌────────┐
//!                 │  content  │───────▶│  walk  │ (snapshot only)
//!                 │ (SHA-256) │        └────────┘
//!                 └─────┬─────┘
//!                       ▼
//!                 ┌───────────┐
//!                 │   store   │ (SQLite: snapshots / contents / files)
//!                 └───────────┘
//! ```

pub mod check;
pub mod content;
pub mod error;
pub mod list;
pub mod prune;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod walk;

pub use error::{Error, Result};
pub use store::Store;
