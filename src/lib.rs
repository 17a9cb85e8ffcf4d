pub mod analysis;
pub mod config;
pub mod fetch;
pub mod loader;
pub mod plot;
pub mod report;
pub mod sheet;
pub mod stats;
pub mod table;

pub use config::AnalysisConfig;
pub use loader::{load, LoadError, LoadRequest};
pub use table::{IndicatorTable, Table, TransposedTable};
