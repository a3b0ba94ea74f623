//! Data layer: the cluster table and its file I/O.
//!
//! Architecture:
//! ```text
//!  .parquet / .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  configured columns → ClusterTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ ClusterTable  │  ordered named f64 columns, equal length
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  writer   │  ClusterTable → .parquet / .csv / .json
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod writer;
