// Housing-market cycle analytics: CSV ingestion, phase classification,
// health scoring and choropleth scales for the Italian regional datasets.
pub mod choropleth;
pub mod config;
pub mod cycle;
pub mod error;
pub mod health;
pub mod loader;
pub mod merge;
pub mod output;
pub mod phase;
pub mod reports;
pub mod source;
pub mod types;
pub mod util;

pub use choropleth::{color_for_value, percentage_change, symmetric_range, ColorScale, Metric, Rgb};
pub use cycle::{classify_phase, current_phase, segment_history, PhaseBlock};
pub use error::{IngestError, Result};
pub use health::scale_to_100;
pub use phase::{Phase, PhaseDetail, PHASE_DETAILS};
pub use source::{load_housing_data, load_macro_data, load_omi_data, FileSource, TextSource};
pub use types::{
    AffordabilityEntry, HealthIndexData, HealthIndexEntry, HousingData, LaggingModelEntry, MacroData,
    RegionalDataset, YearlyRegionRecord,
};
