use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// One region, one calendar year of the main price/transactions dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRegionRecord {
    pub year: String,
    pub region_name: String,
    pub original_transactions: Option<f64>,
    /// `original_transactions / 1000`, the display unit.
    pub transactions: Option<f64>,
    pub average_price: Option<f64>,
    pub price_var: Option<f64>,
    #[serde(rename = "transactionsByMq", skip_serializing_if = "Option::is_none")]
    pub transactions_by_size: Option<TransactionsBySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictive: Option<PredictiveOutput>,
}

impl YearlyRegionRecord {
    pub fn new(
        year: impl Into<String>,
        region_name: impl Into<String>,
        original_transactions: Option<f64>,
        average_price: Option<f64>,
        price_var: Option<f64>,
    ) -> Self {
        Self {
            year: year.into(),
            region_name: region_name.into(),
            original_transactions,
            transactions: original_transactions.map(|t| t / 1_000.0),
            average_price,
            price_var,
            transactions_by_size: None,
            predictive: None,
        }
    }

    pub fn year_number(&self) -> Option<i32> {
        self.year.trim().parse().ok()
    }
}

/// Transactions split by dwelling size class (m²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct TransactionsBySize {
    #[serde(rename = "fino_a_50")]
    pub up_to_50: Option<f64>,
    #[serde(rename = "_50_85")]
    pub from_50_to_85: Option<f64>,
    #[serde(rename = "_85_115")]
    pub from_85_to_115: Option<f64>,
    #[serde(rename = "_115_145")]
    pub from_115_to_145: Option<f64>,
    #[serde(rename = "oltre_145")]
    pub over_145: Option<f64>,
}

impl TransactionsBySize {
    pub const LABELS: [&'static str; 5] =
        ["Fino a 50 mq", "50-85 mq", "85-115 mq", "115-145 mq", "Oltre 145 mq"];

    pub fn buckets(&self) -> [Option<f64>; 5] {
        [
            self.up_to_50,
            self.from_50_to_85,
            self.from_85_to_115,
            self.from_115_to_145,
            self.over_145,
        ]
    }
}

/// Leading-model output for a region and year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveOutput {
    pub market_index_predicted: Option<f64>,
    pub market_index_actual: Option<f64>,
    pub impacts: LeadingImpacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadingImpacts {
    pub confidence: Option<f64>,
    pub spread: Option<f64>,
    pub mortgages: Option<f64>,
    pub residential_var: Option<f64>,
    pub intercept: Option<f64>,
}

/// Region key -> records sorted by year. Includes the `"ITALIA"` aggregate.
pub type RegionalDataset = BTreeMap<String, Vec<YearlyRegionRecord>>;

/// Region key -> year -> value; the shape side datasets are parsed into.
pub type RegionYearMap<T> = BTreeMap<String, BTreeMap<String, T>>;

/// National lagging-model row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaggingModelEntry {
    pub year: i32,
    pub market_index_actual: Option<f64>,
    pub market_index_lagged: Option<f64>,
    pub market_index_predicted: Option<f64>,
    pub predictors: LaggingPredictors,
    pub impacts: LaggingImpacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LaggingPredictors {
    pub avg_rent: Option<f64>,
    pub construction_cost_index: Option<f64>,
    pub mortgage_default_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LaggingImpacts {
    pub construction_cost: Option<f64>,
    pub default_rate: Option<f64>,
    pub rent: Option<f64>,
    pub intercept: Option<f64>,
}

/// Mortgage affordability for a 90 m² home, national.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityEntry {
    pub year: String,
    pub average_price_italy: Option<f64>,
    pub income_index: Option<f64>,
    pub sustainability_20: Option<f64>,
    pub sustainability_25: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Semester {
    S1,
    S2,
}

impl Semester {
    pub fn from_digit(s: &str) -> Option<Self> {
        match s.trim() {
            "1" => Some(Semester::S1),
            "2" => Some(Semester::S2),
            _ => None,
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semester::S1 => f.write_str("S1"),
            Semester::S2 => f.write_str("S2"),
        }
    }
}

/// Four market-health sub-scores, each scaled to 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthKpis {
    pub affordability: Option<u8>,
    pub demand_pressure: Option<u8>,
    pub liquidity: Option<u8>,
    pub momentum: Option<u8>,
}

/// One region, one semester of the market-health index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthIndexEntry {
    pub year: String,
    pub semester: Semester,
    pub period: String,
    pub region_name: String,
    /// Raw index; scaled per view by `health::headline_scores`.
    pub health_index: Option<f64>,
    /// Raw delta against the previous semester of the same region.
    pub variation: f64,
    #[serde(rename = "fasciaSalute")]
    pub health_band: String,
    pub kpis: HealthKpis,
}

impl HealthIndexEntry {
    /// Sort key: numeric year first, then semester.
    pub fn period_key(&self) -> (i32, Semester) {
        (self.year.trim().parse().unwrap_or(i32::MIN), self.semester)
    }
}

pub type HealthIndexData = BTreeMap<String, Vec<HealthIndexEntry>>;

/// A cell of a generic macro series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MacroValue {
    Number(f64),
    Text(String),
}

impl MacroValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MacroValue::Number(n) => Some(*n),
            MacroValue::Text(_) => None,
        }
    }
}

/// One row of a generic macro series keyed by its `Date` column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroRow {
    pub date: Option<String>,
    pub values: BTreeMap<String, MacroValue>,
}

impl MacroRow {
    pub fn number(&self, column: &str) -> Option<f64> {
        self.values.get(column).and_then(MacroValue::as_number)
    }
}

/// Series name -> rows.
pub type MacroData = BTreeMap<String, Vec<MacroRow>>;

/// Average OMI price for a region in one semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OmiPrice {
    pub period: String,
    pub avg_price: f64,
}

/// Region -> OMI prices ordered by period.
pub type OmiData = BTreeMap<String, Vec<OmiPrice>>;

/// Everything the housing-cycle views consume, loaded as one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HousingData {
    pub regional_data: RegionalDataset,
    pub lagging_model_data: Vec<LaggingModelEntry>,
    pub affordability_mutuo_90mq: Vec<AffordabilityEntry>,
    pub health_index_data: HealthIndexData,
}

impl HousingData {
    pub fn is_empty(&self) -> bool {
        self.regional_data.is_empty()
            && self.lagging_model_data.is_empty()
            && self.affordability_mutuo_90mq.is_empty()
            && self.health_index_data.is_empty()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PhaseBlockRow {
    #[serde(rename = "StartYear")]
    #[tabled(rename = "StartYear")]
    pub start_year: String,
    #[serde(rename = "EndYear")]
    #[tabled(rename = "EndYear")]
    pub end_year: String,
    #[serde(rename = "PhaseId")]
    #[tabled(rename = "PhaseId")]
    pub phase_id: u8,
    #[serde(rename = "Phase")]
    #[tabled(rename = "Phase")]
    pub phase_name: String,
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub phase_color: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VariationRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Variation%")]
    #[tabled(rename = "Variation%")]
    pub variation: String,
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub color: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HealthRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Score")]
    #[tabled(rename = "Score")]
    pub score: String,
    #[serde(rename = "Variation")]
    #[tabled(rename = "Variation")]
    pub variation: String,
    #[serde(rename = "Band")]
    #[tabled(rename = "Band")]
    pub band: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_regions: usize,
    pub first_year: Option<String>,
    pub last_year: Option<String>,
    pub national_phase: String,
    pub national_phase_year: Option<String>,
    pub choropleth_metric: String,
    pub choropleth_year: String,
    pub scale_min: f64,
    pub scale_max: f64,
    pub market_index_equilibrium: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YoyRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: String,
    #[serde(rename = "TransactionsYoY%")]
    #[tabled(rename = "TransactionsYoY%")]
    pub change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SizeShareRow {
    #[serde(rename = "Size")]
    #[tabled(rename = "Size")]
    pub label: String,
    #[serde(rename = "Transactions")]
    #[tabled(rename = "Transactions")]
    pub transactions: String,
    #[serde(rename = "Share%")]
    #[tabled(rename = "Share%")]
    pub share: String,
}
