// CSV parsers for every dataset the dashboard reads.
//
// Each parser validates its required headers before touching a row. A missing
// header is a schema error: it is logged once and the parser hands back the
// empty container for its type. A malformed row is skipped (logged at debug)
// and an unreadable number becomes `None`. The `try_parse_*` variants expose
// the schema error to callers that want it.
use crate::error::{IngestError, Result};
use crate::health::{scale_to_100, value_range};
use crate::types::{
    AffordabilityEntry, HealthIndexData, HealthIndexEntry, HealthKpis, LaggingImpacts,
    LaggingModelEntry, LaggingPredictors, LeadingImpacts, MacroRow, MacroValue, OmiData,
    OmiPrice, PredictiveOutput, RegionYearMap, RegionalDataset, Semester, TransactionsBySize,
    YearlyRegionRecord,
};
use crate::util::{average, normalize_date, normalize_region_name, parse_number, parse_year};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;

pub const MAIN_COLUMNS: [&str; 5] = [
    "Anno",
    "Regione",
    "Numero_Transazioni",
    "Prezzo_Medio",
    "Variazione_%_Prezzo",
];

pub const SIZE_BUCKET_COLUMNS: [&str; 7] = [
    "Regione",
    "anno",
    "NTN_fino_a_50_mq",
    "NTN_50_85_mq",
    "NTN_85_115_mq",
    "NTN_115_145_mq",
    "NTN_oltre_145_mq",
];

pub const LEADING_COLUMNS: [&str; 9] = [
    "Regione",
    "Anno",
    "Y_Indice_Mercato",
    "Y_Predetto_dal_Modello",
    "Impatto_Fiducia_durevoli_t-1",
    "Impatto_Spread_t-1",
    "Impatto_Nuove_iscrizioni_mutui_RES_t-1",
    "Impatto_Residenziale_abitazioni_Variazione_annuale_t-1",
    "Impatto_Intercetta",
];

pub const LAGGING_COLUMNS: [&str; 11] = [
    "Anno",
    "Y_Indice_Mercato",
    "Y_Indice_Mercato_t-1",
    "Y_Predetto_dal_Modello",
    "Affitto_medio_€/m²",
    "Indice_costi_costruzione",
    "Tasso_default_mutui",
    "Impatto_Indice_costi_costruzione",
    "Impatto_Tasso_default_mutui",
    "Impatto_Affitto_medio_€/m²",
    "Impatto_Intercetta",
];

pub const AFFORDABILITY_COLUMNS: [&str; 3] =
    ["Anno", "Prezzo medio Italia", "Reddito annuo medio (indice)"];
const SUSTAINABILITY_PREFIX: &str = "Sostenibilita";

pub const HEALTH_COLUMNS: [&str; 3] = ["Periodo_Semestre", "Regione", "IMM"];
const HEALTH_BAND_COLUMN: &str = "Fascia_Salute";
const HEALTH_KPI_COLUMNS: [&str; 4] = [
    "Z_Accessibilita",
    "Z_PressioneDomanda",
    "Z_Liquidita",
    "Z_PriceMomentum",
];

pub const MACRO_DATE_COLUMN: &str = "Date";
pub const OMI_COLUMNS: [&str; 3] = ["Periodo", "Regione", "Prezzo_medio"];

/// Header row plus raw string records of one CSV text.
struct CsvTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    fn read(dataset: &'static str, text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            match result {
                Ok(record) => rows.push(record),
                Err(e) => skip_row(dataset, idx, e.to_string()),
            }
        }
        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Indices of `names`, or a schema error naming every missing one.
    fn require<const N: usize>(&self, dataset: &'static str, names: [&str; N]) -> Result<[usize; N]> {
        let found = names.map(|n| self.column(n));
        let missing: Vec<String> = names
            .iter()
            .zip(found.iter())
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::Schema { dataset, missing });
        }
        Ok(found.map(|idx| idx.unwrap_or_default()))
    }

    /// Records with at least as many fields as the header, paired with their
    /// zero-based data-row index.
    fn complete_rows(&self, dataset: &'static str) -> impl Iterator<Item = (usize, &StringRecord)> + '_ {
        let width = self.headers.len();
        self.rows.iter().enumerate().filter(move |(idx, row)| {
            if row.len() < width {
                skip_row(dataset, *idx, format!("expected {} fields, found {}", width, row.len()));
                false
            } else {
                true
            }
        })
    }
}

fn skip_row(dataset: &'static str, idx: usize, message: String) {
    // +2: one for the header, one for 1-based line numbers.
    let err = IngestError::Parse {
        dataset,
        row: idx + 2,
        message,
    };
    log::debug!("skipping row: {}", err);
}

fn cell<'a>(row: &'a StringRecord, idx: usize) -> &'a str {
    row.get(idx).unwrap_or("")
}

fn num(row: &StringRecord, idx: usize) -> Option<f64> {
    parse_number(row.get(idx))
}

/// Log a dataset-level failure and fall back to the empty shape.
fn degrade<T: Default>(result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        log::error!("{}", e);
        T::default()
    })
}

/// (a) Main dataset: prices and transactions per region and year.
pub fn parse_main_dataset(text: &str) -> RegionalDataset {
    degrade(try_parse_main_dataset(text))
}

pub fn try_parse_main_dataset(text: &str) -> Result<RegionalDataset> {
    const DATASET: &str = "main dataset";
    let mut data = RegionalDataset::new();
    if text.trim().is_empty() {
        return Ok(data);
    }
    let table = CsvTable::read(DATASET, text)?;
    let [year_idx, region_idx, tx_idx, price_idx, var_idx] = table.require(DATASET, MAIN_COLUMNS)?;

    for (idx, row) in table.complete_rows(DATASET) {
        let region = normalize_region_name(cell(row, region_idx));
        let year = cell(row, year_idx);
        if region.is_empty() || parse_year(year).is_none() {
            skip_row(DATASET, idx, format!("invalid region '{}' or year '{}'", region, year));
            continue;
        }
        let record = YearlyRegionRecord::new(
            year,
            region.clone(),
            num(row, tx_idx),
            num(row, price_idx),
            num(row, var_idx),
        );
        data.entry(region).or_default().push(record);
    }
    Ok(data)
}

/// (b) Transactions by dwelling size, keyed by region then year.
pub fn parse_transactions_by_size(text: &str) -> RegionYearMap<TransactionsBySize> {
    degrade(try_parse_transactions_by_size(text))
}

pub fn try_parse_transactions_by_size(text: &str) -> Result<RegionYearMap<TransactionsBySize>> {
    const DATASET: &str = "transactions by size";
    let mut data = RegionYearMap::new();
    if text.trim().is_empty() {
        return Ok(data);
    }
    let table = CsvTable::read(DATASET, text)?;
    let [region_idx, year_idx, b50, b85, b115, b145, over] =
        table.require(DATASET, SIZE_BUCKET_COLUMNS)?;

    for (idx, row) in table.complete_rows(DATASET) {
        let region = normalize_region_name(cell(row, region_idx));
        let year = cell(row, year_idx);
        if region.is_empty() || year.is_empty() {
            skip_row(DATASET, idx, "missing region or year".to_string());
            continue;
        }
        let buckets = TransactionsBySize {
            up_to_50: num(row, b50),
            from_50_to_85: num(row, b85),
            from_85_to_115: num(row, b115),
            from_115_to_145: num(row, b145),
            over_145: num(row, over),
        };
        data.entry(region)
            .or_insert_with(BTreeMap::new)
            .insert(year.to_string(), buckets);
    }
    Ok(data)
}

/// (c) Leading model predictions and per-variable impacts, by region and year.
pub fn parse_leading_model(text: &str) -> RegionYearMap<PredictiveOutput> {
    degrade(try_parse_leading_model(text))
}

pub fn try_parse_leading_model(text: &str) -> Result<RegionYearMap<PredictiveOutput>> {
    const DATASET: &str = "leading model";
    let mut data = RegionYearMap::new();
    if text.trim().is_empty() {
        return Ok(data);
    }
    let table = CsvTable::read(DATASET, text)?;
    let [region_idx, year_idx, actual, predicted, confidence, spread, mortgages, residential, intercept] =
        table.require(DATASET, LEADING_COLUMNS)?;

    for (idx, row) in table.complete_rows(DATASET) {
        let region = normalize_region_name(cell(row, region_idx));
        let year = cell(row, year_idx);
        if region.is_empty() || year.is_empty() {
            skip_row(DATASET, idx, "missing region or year".to_string());
            continue;
        }
        let output = PredictiveOutput {
            market_index_actual: num(row, actual),
            market_index_predicted: num(row, predicted),
            impacts: LeadingImpacts {
                confidence: num(row, confidence),
                spread: num(row, spread),
                mortgages: num(row, mortgages),
                residential_var: num(row, residential),
                intercept: num(row, intercept),
            },
        };
        data.entry(region)
            .or_insert_with(BTreeMap::new)
            .insert(year.to_string(), output);
    }
    Ok(data)
}

/// (d) National lagging model, sorted by year.
pub fn parse_lagging_model(text: &str) -> Vec<LaggingModelEntry> {
    degrade(try_parse_lagging_model(text))
}

pub fn try_parse_lagging_model(text: &str) -> Result<Vec<LaggingModelEntry>> {
    const DATASET: &str = "lagging model";
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let table = CsvTable::read(DATASET, text)?;
    let [year_idx, actual, lagged, predicted, rent, cost, default_rate, imp_cost, imp_default, imp_rent, imp_int] =
        table.require(DATASET, LAGGING_COLUMNS)?;

    let mut results = Vec::new();
    for (idx, row) in table.complete_rows(DATASET) {
        let Some(year) = parse_year(cell(row, year_idx)) else {
            skip_row(DATASET, idx, format!("invalid year '{}'", cell(row, year_idx)));
            continue;
        };
        results.push(LaggingModelEntry {
            year,
            market_index_actual: num(row, actual),
            market_index_lagged: num(row, lagged),
            market_index_predicted: num(row, predicted),
            predictors: LaggingPredictors {
                avg_rent: num(row, rent),
                construction_cost_index: num(row, cost),
                mortgage_default_rate: num(row, default_rate),
            },
            impacts: LaggingImpacts {
                construction_cost: num(row, imp_cost),
                default_rate: num(row, imp_default),
                rent: num(row, imp_rent),
                intercept: num(row, imp_int),
            },
        });
    }
    results.sort_by_key(|e| e.year);
    Ok(results)
}

/// (e) Mortgage affordability for a 90 m² home, sorted by year.
///
/// The two sustainability columns are matched by prefix and by the loan
/// length (`20` / `25`) appearing in the header.
pub fn parse_affordability(text: &str) -> Vec<AffordabilityEntry> {
    degrade(try_parse_affordability(text))
}

pub fn try_parse_affordability(text: &str) -> Result<Vec<AffordabilityEntry>> {
    const DATASET: &str = "affordability_mutuo_90mq";
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let table = CsvTable::read(DATASET, text)?;
    let fuzzy = |years: &str| {
        table
            .headers
            .iter()
            .position(|h| h.starts_with(SUSTAINABILITY_PREFIX) && h.contains(years))
    };
    let fixed = table.require(DATASET, AFFORDABILITY_COLUMNS);
    let ([year_idx, price_idx, income_idx], sust20, sust25) = match (fixed, fuzzy("20"), fuzzy("25")) {
        (Ok(idx), Some(s20), Some(s25)) => (idx, s20, s25),
        (fixed, s20, s25) => {
            let mut missing = match fixed {
                Err(IngestError::Schema { missing, .. }) => missing,
                Err(e) => return Err(e),
                Ok(_) => Vec::new(),
            };
            if s20.is_none() {
                missing.push(format!("{}*20*", SUSTAINABILITY_PREFIX));
            }
            if s25.is_none() {
                missing.push(format!("{}*25*", SUSTAINABILITY_PREFIX));
            }
            return Err(IngestError::Schema { dataset: DATASET, missing });
        }
    };

    let mut results: Vec<AffordabilityEntry> = table
        .complete_rows(DATASET)
        .filter_map(|(idx, row)| {
            let year = cell(row, year_idx);
            if year.is_empty() {
                skip_row(DATASET, idx, "missing year".to_string());
                return None;
            }
            Some(AffordabilityEntry {
                year: year.to_string(),
                average_price_italy: num(row, price_idx),
                income_index: num(row, income_idx),
                sustainability_20: num(row, sust20),
                sustainability_25: num(row, sust25),
            })
        })
        .collect();
    results.sort_by(|a, b| {
        let key = |e: &AffordabilityEntry| parse_year(&e.year).unwrap_or(i32::MAX);
        key(a).cmp(&key(b)).then_with(|| a.year.cmp(&b.year))
    });
    Ok(results)
}

struct RawHealthRow {
    region: String,
    year: String,
    semester: Semester,
    period: String,
    health_index: Option<f64>,
    band: String,
    kpis: [Option<f64>; 4],
}

/// Split `YYYY_S{1|2}` into year and semester.
pub fn parse_semester_period(period: &str) -> Option<(String, Semester)> {
    let (year, semester) = period.trim().split_once("_S")?;
    parse_year(year)?;
    Some((year.trim().to_string(), Semester::from_digit(semester)?))
}

/// (f) Semester-level market health index per region.
///
/// KPI z-scores are scaled to 0–100 against their range over the whole
/// dataset. The headline index stays raw. Rows are put in (year, semester)
/// order per region before the semester-on-semester variation is taken.
pub fn parse_health_index(text: &str) -> HealthIndexData {
    degrade(try_parse_health_index(text))
}

pub fn try_parse_health_index(text: &str) -> Result<HealthIndexData> {
    const DATASET: &str = "health index";
    let mut data = HealthIndexData::new();
    if text.trim().is_empty() {
        return Ok(data);
    }
    let table = CsvTable::read(DATASET, text)?;
    let [period_idx, region_idx, index_idx] = table.require(DATASET, HEALTH_COLUMNS)?;
    let band_idx = table.column(HEALTH_BAND_COLUMN);
    let kpi_idx = HEALTH_KPI_COLUMNS.map(|c| table.column(c));
    for (name, idx) in HEALTH_KPI_COLUMNS.iter().zip(kpi_idx.iter()) {
        if idx.is_none() {
            log::warn!("{}: column {} absent, its score will be empty", DATASET, name);
        }
    }

    let mut raw: Vec<RawHealthRow> = Vec::new();
    for (idx, row) in table.complete_rows(DATASET) {
        let region = normalize_region_name(cell(row, region_idx));
        let period = cell(row, period_idx);
        let Some((year, semester)) = parse_semester_period(period) else {
            skip_row(DATASET, idx, format!("invalid period '{}'", period));
            continue;
        };
        if region.is_empty() {
            skip_row(DATASET, idx, "missing region".to_string());
            continue;
        }
        let band = band_idx
            .map(|i| cell(row, i))
            .filter(|b| !b.is_empty())
            .unwrap_or("N/D");
        raw.push(RawHealthRow {
            region,
            year,
            semester,
            period: period.to_string(),
            health_index: num(row, index_idx),
            band: band.to_string(),
            kpis: kpi_idx.map(|i| i.and_then(|i| num(row, i))),
        });
    }

    let ranges: [(f64, f64); 4] =
        std::array::from_fn(|k| value_range(raw.iter().map(|r| r.kpis[k])));

    // Variation depends on order, so sort first.
    raw.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then_with(|| parse_year(&a.year).cmp(&parse_year(&b.year)))
            .then_with(|| a.semester.cmp(&b.semester))
    });

    for row in raw {
        let entries = data.entry(row.region.clone()).or_insert_with(Vec::new);
        let variation = match (entries.last().and_then(|p| p.health_index), row.health_index) {
            (Some(prev), Some(curr)) => curr - prev,
            _ => 0.0,
        };
        let [affordability, demand_pressure, liquidity, momentum] = row.kpis;
        entries.push(HealthIndexEntry {
            year: row.year,
            semester: row.semester,
            period: row.period,
            region_name: row.region,
            health_index: row.health_index,
            variation,
            health_band: row.band,
            kpis: HealthKpis {
                affordability: scale_to_100(affordability, ranges[0]),
                demand_pressure: scale_to_100(demand_pressure, ranges[1]),
                liquidity: scale_to_100(liquidity, ranges[2]),
                momentum: scale_to_100(momentum, ranges[3]),
            },
        });
    }
    Ok(data)
}

/// (g) Generic macro series: a `Date` column plus arbitrary columns.
///
/// Dates in `D/M/YYYY` become ISO; numeric cells become numbers, other
/// non-empty cells stay text, empty cells are left out.
pub fn parse_macro_series(text: &str) -> Vec<MacroRow> {
    degrade(try_parse_macro_series(text))
}

pub fn try_parse_macro_series(text: &str) -> Result<Vec<MacroRow>> {
    const DATASET: &str = "macro series";
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let table = CsvTable::read(DATASET, text)?;
    let [date_idx] = table.require(DATASET, [MACRO_DATE_COLUMN])?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let date = Some(normalize_date(cell(row, date_idx))).filter(|d| !d.is_empty());
            let values = table
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != date_idx)
                .filter_map(|(i, header)| {
                    let raw = cell(row, i);
                    if raw.is_empty() {
                        return None;
                    }
                    let value = match parse_number(Some(raw)) {
                        Some(n) => MacroValue::Number(n),
                        None => MacroValue::Text(raw.to_string()),
                    };
                    Some((header.clone(), value))
                })
                .collect();
            MacroRow { date, values }
        })
        .collect();
    Ok(rows)
}

fn period_order(period: &str) -> (i32, u8, String) {
    match period.split_once("_S") {
        Some((y, s)) => (
            parse_year(y).unwrap_or(i32::MAX),
            s.trim().parse().unwrap_or(u8::MAX),
            period.to_string(),
        ),
        None => (i32::MAX, u8::MAX, period.to_string()),
    }
}

/// (h) OMI quotations averaged per region and semester.
pub fn parse_omi_prices(text: &str) -> OmiData {
    degrade(try_parse_omi_prices(text))
}

pub fn try_parse_omi_prices(text: &str) -> Result<OmiData> {
    const DATASET: &str = "OMI";
    if text.trim().is_empty() {
        return Ok(OmiData::new());
    }
    let table = CsvTable::read(DATASET, text)?;
    let [period_idx, region_idx, price_idx] = table.require(DATASET, OMI_COLUMNS)?;

    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    for (idx, row) in table.complete_rows(DATASET) {
        let region = normalize_region_name(cell(row, region_idx));
        let period = cell(row, period_idx);
        let Some(price) = num(row, price_idx) else {
            skip_row(DATASET, idx, "missing price".to_string());
            continue;
        };
        if region.is_empty() || period.is_empty() {
            skip_row(DATASET, idx, "missing region or period".to_string());
            continue;
        }
        grouped
            .entry(region)
            .or_default()
            .entry(period.to_string())
            .or_default()
            .push(price);
    }

    Ok(grouped
        .into_iter()
        .map(|(region, periods)| {
            let mut prices: Vec<OmiPrice> = periods
                .into_iter()
                .map(|(period, values)| OmiPrice {
                    avg_price: average(&values),
                    period,
                })
                .collect();
            prices.sort_by_key(|p| period_order(&p.period));
            (region, prices)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "Anno,Regione,Numero_Transazioni,Prezzo_Medio,Variazione_%_Prezzo\n\
        2021,Lazio,\"1.234,5\",\"2.100,0\",\"1,5\"\n\
        2020,lazio,1000,2050,-0.5\n\
        2021,Emilia-Romagna,,1900,\n\
        2021,Molise\n\
        ,Puglia,100,100,1\n";

    #[test]
    fn main_dataset_parses_italian_numbers() {
        let data = try_parse_main_dataset(MAIN).expect("valid schema");
        let lazio = &data["LAZIO"];
        assert_eq!(lazio.len(), 2);
        assert_eq!(lazio[0].original_transactions, Some(1234.5));
        assert_eq!(lazio[0].transactions, Some(1.2345));
        assert_eq!(lazio[0].average_price, Some(2100.0));
        assert_eq!(lazio[0].price_var, Some(1.5));
        assert_eq!(lazio[1].price_var, Some(-0.5));
    }

    #[test]
    fn main_dataset_keeps_missing_values_as_none() {
        let data = parse_main_dataset(MAIN);
        let emilia = &data["EMILIA ROMAGNA"];
        assert_eq!(emilia[0].original_transactions, None);
        assert_eq!(emilia[0].transactions, None);
        assert_eq!(emilia[0].price_var, None);
        assert!(!data.contains_key("MOLISE"));
        assert!(!data.contains_key("PUGLIA"));
    }

    #[test]
    fn missing_header_is_a_schema_error() {
        let text = "Anno,Regione,Numero_Transazioni,Prezzo_Medio\n2021,Lazio,1,2\n";
        match try_parse_main_dataset(text) {
            Err(IngestError::Schema { missing, .. }) => {
                assert_eq!(missing, vec!["Variazione_%_Prezzo".to_string()])
            }
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(parse_main_dataset(text).is_empty());
    }

    #[test]
    fn empty_text_is_an_empty_dataset() {
        assert!(parse_main_dataset("").is_empty());
        assert!(parse_lagging_model("  \n").is_empty());
        assert!(parse_health_index("").is_empty());
    }

    #[test]
    fn size_buckets_keyed_by_region_and_year() {
        let text = "Regione,anno,NTN_fino_a_50_mq,NTN_50_85_mq,NTN_85_115_mq,NTN_115_145_mq,NTN_oltre_145_mq\n\
            Valle d'Aosta/Vallée d'Aoste,2022,10,20,30,40,\n";
        let data = parse_transactions_by_size(text);
        let row = data["VALLE D'AOSTA"]["2022"];
        assert_eq!(row.up_to_50, Some(10.0));
        assert_eq!(row.from_115_to_145, Some(40.0));
        assert_eq!(row.over_145, None);
    }

    #[test]
    fn leading_model_keeps_zero_impacts() {
        let text = format!(
            "{}\nLombardia,2023,\"0,5\",0.4,0,-0.1,0.2,0.3,0.05\n",
            LEADING_COLUMNS.join(",")
        );
        let data = parse_leading_model(&text);
        let out = data["LOMBARDIA"]["2023"];
        assert_eq!(out.market_index_actual, Some(0.5));
        assert_eq!(out.market_index_predicted, Some(0.4));
        assert_eq!(out.impacts.confidence, Some(0.0));
        assert_eq!(out.impacts.spread, Some(-0.1));
        assert_eq!(out.impacts.intercept, Some(0.05));
    }

    #[test]
    fn lagging_model_sorted_by_year() {
        let text = format!(
            "{}\n2022,1,2,3,4,5,6,7,8,9,10\n2021,1,,3,4,5,6,7,8,9,10\nxx,1,2,3,4,5,6,7,8,9,10\n",
            LAGGING_COLUMNS.join(",")
        );
        let rows = parse_lagging_model(&text);
        assert_eq!(rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2021, 2022]);
        assert_eq!(rows[0].market_index_lagged, None);
        assert_eq!(rows[1].predictors.avg_rent, Some(4.0));
        assert_eq!(rows[1].impacts.intercept, Some(10.0));
    }

    #[test]
    fn affordability_matches_sustainability_headers_by_substring() {
        let text = "Anno,Prezzo medio Italia,Reddito annuo medio (indice),Sostenibilita mutuo 25 anni,Sostenibilita mutuo 20 anni\n\
            2023,\"1.900,0\",101,\"32,5\",\"38,1\"\n\
            2022,1850,100,31,37\n";
        let rows = try_parse_affordability(text).expect("valid schema");
        assert_eq!(rows[0].year, "2022");
        assert_eq!(rows[1].average_price_italy, Some(1900.0));
        assert_eq!(rows[1].sustainability_20, Some(38.1));
        assert_eq!(rows[1].sustainability_25, Some(32.5));
    }

    #[test]
    fn affordability_without_sustainability_is_a_schema_error() {
        let text = "Anno,Prezzo medio Italia,Reddito annuo medio (indice)\n2023,1,2\n";
        assert!(matches!(
            try_parse_affordability(text),
            Err(IngestError::Schema { .. })
        ));
        assert!(parse_affordability(text).is_empty());
    }

    const HEALTH: &str = "Periodo_Semestre,Regione,IMM,Fascia_Salute,Z_Accessibilita,Z_PressioneDomanda,Z_Liquidita,Z_PriceMomentum\n\
        2023_S2,Lazio,60,Buona,1,0,-1,\n\
        2023_S1,Lazio,50,,-1,2,1,\n\
        2023_S1,Puglia,40,Debole,0,1,0,\n\
        2023_S3,Puglia,40,Debole,0,1,0,\n";

    #[test]
    fn health_variation_follows_sorted_order() {
        let data = parse_health_index(HEALTH);
        let lazio = &data["LAZIO"];
        assert_eq!(lazio[0].period, "2023_S1");
        assert_eq!(lazio[0].variation, 0.0);
        assert_eq!(lazio[0].health_band, "N/D");
        assert_eq!(lazio[1].semester, Semester::S2);
        assert_eq!(lazio[1].variation, 10.0);
        assert_eq!(lazio[1].health_index, Some(60.0));
        assert_eq!(data["PUGLIA"].len(), 1);
    }

    #[test]
    fn health_kpis_scale_over_the_whole_dataset() {
        let data = parse_health_index(HEALTH);
        let lazio = &data["LAZIO"];
        assert_eq!(lazio[0].kpis.affordability, Some(0));
        assert_eq!(lazio[1].kpis.affordability, Some(100));
        assert_eq!(data["PUGLIA"][0].kpis.affordability, Some(50));
        assert_eq!(lazio[0].kpis.demand_pressure, Some(100));
        // No momentum observed anywhere.
        assert!(data.values().flatten().all(|e| e.kpis.momentum.is_none()));
    }

    #[test]
    fn health_requires_only_core_columns() {
        let text = "Periodo_Semestre,Regione,IMM\n2024_S1,Sicilia,\"12,5\"\n";
        let data = parse_health_index(text);
        let entry = &data["SICILIA"][0];
        assert_eq!(entry.health_index, Some(12.5));
        assert_eq!(entry.kpis, HealthKpis::default());
        assert!(parse_health_index("Regione,IMM\nSicilia,1\n").is_empty());
    }

    #[test]
    fn macro_series_normalizes_dates_and_types_cells() {
        let text = "Date,Italy_HICP_2015base,Country\n1/2/2024,\"120,5\",Italy\n2024-03-01,121,\n";
        let rows = parse_macro_series(text);
        assert_eq!(rows[0].date.as_deref(), Some("2024-02-01"));
        assert_eq!(rows[0].number("Italy_HICP_2015base"), Some(120.5));
        assert_eq!(
            rows[0].values.get("Country"),
            Some(&MacroValue::Text("Italy".to_string()))
        );
        assert_eq!(rows[1].date.as_deref(), Some("2024-03-01"));
        assert!(!rows[1].values.contains_key("Country"));
        assert!(parse_macro_series("Year,GDP\n2020,1\n").is_empty());
    }

    #[test]
    fn omi_prices_average_per_period_in_order() {
        let text = "Periodo,Regione,Prezzo_medio\n2023_S2,Lazio,3000\n2023_S1,Lazio,2000\n2023_S1,Lazio,2200\n2023_S1,Lazio,n.d.\n";
        let data = parse_omi_prices(text);
        let lazio = &data["LAZIO"];
        assert_eq!(lazio.len(), 2);
        assert_eq!(lazio[0].period, "2023_S1");
        assert_eq!(lazio[0].avg_price, 2100.0);
        assert_eq!(lazio[1].avg_price, 3000.0);
    }

    #[test]
    fn semester_periods() {
        assert_eq!(
            parse_semester_period("2024_S2"),
            Some(("2024".to_string(), Semester::S2))
        );
        assert_eq!(parse_semester_period("2024_S3"), None);
        assert_eq!(parse_semester_period("2024"), None);
    }
}
