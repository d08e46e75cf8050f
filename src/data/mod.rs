/// Data layer: core types, loading, despiking, and export.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  BTreeMap<HeatingRate, Series>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ despike   │  flag spikes per series → SmoothingResult
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  cleaned table back to .csv / .json
///   └──────────┘
/// ```

pub mod despike;
pub mod export;
pub mod loader;
pub mod model;
