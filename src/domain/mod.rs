//! Motion data model and the offline kick analysis
//!
//! ```text
//! log lines ─► parser ─► Series ─► filter ─► axis ─► peaks ─► intensity
//!                                   └──────────── analysis ────────────┘
//! ```

pub mod analysis;
pub mod axis;
pub mod filter;
pub mod intensity;
pub mod models;
pub mod parser;
pub mod peaks;
pub mod records;
pub mod series;
pub mod settings;
