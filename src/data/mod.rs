//! Data layer: core types, loading, filtering, statistics and paging.
//!
//! Architecture:
//! ```text
//!  chicago.csv / .parquet / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  source   │  RowSource → RawTable (text cells)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse + derive month/day/hour → CityDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  month/day predicates → FilteredView (indices)
//!   └──────────┘
//!        │
//!        ├──────────────┐
//!        ▼              ▼
//!   ┌──────────┐   ┌──────────┐
//!   │  stats    │   │  pager    │  5-row windows over the view
//!   └──────────┘   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod pager;
pub mod source;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;
