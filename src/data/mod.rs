/// Data layer: records, decoders, loading and export.
///
/// Architecture:
/// ```text
///  *JV.txt / *.csv / EQE text
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read bytes → text, pick decoder by name
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ jv / mppt / eqe   │  fixed-offset blocks (table) → records (model)
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Measurement → JSON / Parquet
///   └──────────┘
/// ```

pub mod eqe;
pub mod export;
pub mod jv;
pub mod loader;
pub mod model;
pub mod mppt;
pub mod physics;
pub mod sample;
pub mod table;
