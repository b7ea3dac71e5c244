/// Data layer: table model, loading, profiling, filtering, and statistics.
///
/// Architecture:
/// ```text
///   Resource (catalog)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  structured store → Table, else CSV → Table, else None
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  profile  │  numeric / categorical columns, quality counters
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  coerce column → Series, inclusive range
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ stats / narrative │  describe, top-N aggregate, skew
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered Table → CSV
///   └──────────┘
/// ```

pub mod analysis;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod narrative;
pub mod profile;
pub mod stats;
