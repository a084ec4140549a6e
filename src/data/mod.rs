//! Data layer: grid types, loading, and comparison.
//!
//! Architecture:
//! ```text
//!  .csv / .dat / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → LoadedGrid (Grid + GridMeta)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │   diff    │  shape check, max |a - b|
//!   └──────────┘
//! ```
//!
//! `writer` is the inverse of `loader` and only feeds fixtures and the
//! sample generator.

pub mod diff;
pub mod loader;
pub mod model;
pub mod writer;
