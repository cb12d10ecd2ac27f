use crate::choropleth::{percentage_change, symmetric_range, Metric};
use crate::cycle::{current_phase, segment_history};
use crate::types::{
    AffordabilityEntry, HousingData, LaggingModelEntry, MacroData, MacroRow, MacroValue, PhaseBlockRow,
    RankingRow, RegionalDataset, SizeShareRow, SummaryStats, TransactionsBySize, YearlyRegionRecord,
    YoyRow,
};
use crate::util::{average, format_number, format_opt, NATIONAL_KEY};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Shown instead of the context when there is nothing to summarize.
pub const CONTEXT_UNAVAILABLE: &str =
    "Mi spiace, ma i dati necessari per l'analisi non sono completamente disponibili in questo momento.";

const MONTHS_IT: [&str; 12] = [
    "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto", "settembre",
    "ottobre", "novembre", "dicembre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankingMetric {
    AveragePrice,
    Transactions,
}

impl RankingMetric {
    fn value(self, record: &YearlyRegionRecord) -> f64 {
        let v = match self {
            RankingMetric::AveragePrice => record.average_price,
            RankingMetric::Transactions => record.original_transactions,
        };
        v.unwrap_or(0.0)
    }

    pub fn label(self) -> &'static str {
        match self {
            RankingMetric::AveragePrice => "Prezzo / m²",
            RankingMetric::Transactions => "N. Transazioni",
        }
    }
}

/// "LAZIO" -> "Lazio".
pub fn display_region_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Most recent year of the national series.
pub fn latest_year(dataset: &RegionalDataset) -> Option<String> {
    dataset
        .get(NATIONAL_KEY)
        .and_then(|records| records.last())
        .map(|r| r.year.clone())
}

/// Top regions by the value of their latest record. A missing value ranks
/// as zero.
pub fn regional_ranking(dataset: &RegionalDataset, metric: RankingMetric, limit: usize) -> Vec<RankingRow> {
    let mut latest: Vec<(&YearlyRegionRecord, f64)> = dataset
        .iter()
        .filter(|(region, _)| region.as_str() != NATIONAL_KEY)
        .filter_map(|(_, records)| records.last())
        .map(|r| (r, metric.value(r)))
        .collect();
    latest.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    latest
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (record, value))| RankingRow {
            rank: idx + 1,
            region: display_region_name(&record.region_name),
            year: record.year.clone(),
            value: format_number(value, 0),
        })
        .collect()
}

/// Year-over-year change of the raw transaction count, from the second year
/// on. A zero or missing side gives 0.
pub fn yoy_transaction_series(records: &[YearlyRegionRecord]) -> Vec<(String, f64)> {
    records
        .windows(2)
        .map(|pair| {
            let change = match (pair[0].original_transactions, pair[1].original_transactions) {
                (Some(prev), Some(curr)) if prev != 0.0 => (curr - prev) / prev * 100.0,
                _ => 0.0,
            };
            (pair[1].year.clone(), change)
        })
        .collect()
}

pub fn yoy_rows(series: &[(String, f64)]) -> Vec<YoyRow> {
    series
        .iter()
        .map(|(year, change)| YoyRow {
            year: year.clone(),
            change: format_number(*change, 1),
        })
        .collect()
}

/// Size buckets of the latest record that has them, with each bucket's share
/// of their sum. Missing buckets count as zero.
pub fn size_bucket_shares(records: &[YearlyRegionRecord]) -> Option<(String, Vec<SizeShareRow>)> {
    let record = records.iter().rev().find(|r| r.transactions_by_size.is_some())?;
    let buckets = record.transactions_by_size?.buckets().map(|b| b.unwrap_or(0.0));
    let total: f64 = buckets.iter().sum();
    let rows = TransactionsBySize::LABELS
        .iter()
        .zip(buckets)
        .map(|(label, value)| SizeShareRow {
            label: label.to_string(),
            transactions: format_number(value, 0),
            share: if total > 0.0 {
                format_number(value / total * 100.0, 1)
            } else {
                "N/D".to_string()
            },
        })
        .collect();
    Some((record.year.clone(), rows))
}

pub fn phase_block_rows(records: &[YearlyRegionRecord]) -> Vec<PhaseBlockRow> {
    segment_history(records).iter().map(|b| b.to_row()).collect()
}

/// Long-run mean of the actual market index, the "equilibrium" line of the
/// leading-model chart.
pub fn market_index_equilibrium(records: &[YearlyRegionRecord]) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.predictive.and_then(|p| p.market_index_actual))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(average(&values))
    }
}

pub fn generate_summary(data: &HousingData, metric: Metric, year: &str) -> SummaryStats {
    let national = data
        .regional_data
        .get(NATIONAL_KEY)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let variations = percentage_change(&data.regional_data, metric, year);
    let scale = symmetric_range(&variations);

    SummaryStats {
        total_regions: data
            .regional_data
            .keys()
            .filter(|k| k.as_str() != NATIONAL_KEY)
            .count(),
        first_year: national.first().map(|r| r.year.clone()),
        last_year: national.last().map(|r| r.year.clone()),
        national_phase: current_phase(national).name.to_string(),
        national_phase_year: national.last().map(|r| r.year.clone()),
        choropleth_metric: metric.to_string(),
        choropleth_year: year.to_string(),
        scale_min: scale.min,
        scale_max: scale.max,
        market_index_equilibrium: market_index_equilibrium(national),
    }
}

/// What the chat assistant is told about the selected area.
pub struct ContextInputs<'a> {
    pub display_name: &'a str,
    pub records: &'a [YearlyRegionRecord],
    pub lagging: &'a [LaggingModelEntry],
    pub affordability: &'a [AffordabilityEntry],
    pub macro_data: &'a MacroData,
}

fn pct(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{}%", format_number(v, decimals)),
        None => "N/D".to_string(),
    }
}

fn euro(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{} €", format_number(v, 0)),
        None => "N/D".to_string(),
    }
}

fn latest_macro<'a>(data: &'a MacroData, key: &str) -> Option<&'a MacroRow> {
    data.get(key)?
        .iter()
        .filter(|r| r.date.is_some())
        .max_by(|a, b| a.date.cmp(&b.date))
}

/// "2024-02-01" -> "febbraio 2024". Unparseable dates pass through.
fn month_label(row: Option<&MacroRow>) -> String {
    let Some(date) = row.and_then(|r| r.date.as_deref()) else {
        return "N/D".to_string();
    };
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!("{} {}", MONTHS_IT[d.month0() as usize], d.year()),
        Err(_) => date.to_string(),
    }
}

fn macro_num(row: Option<&MacroRow>, column: &str, decimals: usize) -> String {
    format_opt(row.and_then(|r| r.number(column)), decimals)
}

/// Latest row of `country` in the GDP series, by its `Year` column.
fn latest_gdp<'a>(data: &'a MacroData, country: &str) -> Option<&'a MacroRow> {
    data.get("gdpGrowth")?
        .iter()
        .filter(|r| matches!(r.values.get("Country"), Some(MacroValue::Text(t)) if t == country))
        .max_by(|a, b| {
            let ya = a.number("Year").unwrap_or(f64::NEG_INFINITY);
            let yb = b.number("Year").unwrap_or(f64::NEG_INFINITY);
            ya.partial_cmp(&yb).unwrap_or(Ordering::Equal)
        })
}

/// Plain-text digest of the latest housing and macro figures.
pub fn market_context(inputs: &ContextInputs<'_>) -> String {
    let Some(latest) = inputs.records.last() else {
        return CONTEXT_UNAVAILABLE.to_string();
    };
    let name = inputs.display_name;
    let predictive = latest.predictive;
    let lagging = inputs.lagging.last();
    let afford = inputs.affordability.last();
    let sizes = latest.transactions_by_size.unwrap_or_default();
    let bucket = |v: Option<f64>| format_number(v.unwrap_or(0.0), 0);
    let forecast_year = match (predictive, latest.year_number()) {
        (Some(_), Some(y)) => (y + 1).to_string(),
        _ => "N/D".to_string(),
    };

    let cpi = latest_macro(inputs.macro_data, "cpi");
    let bonds = latest_macro(inputs.macro_data, "bondYield10Y");
    let rates = latest_macro(inputs.macro_data, "interbankRates");
    let commodities = latest_macro(inputs.macro_data, "commoditiesIndex");
    let energy = latest_macro(inputs.macro_data, "punPsv");
    let gdp_italy = latest_gdp(inputs.macro_data, "Italy");
    let gdp = |country: &str| pct(latest_gdp(inputs.macro_data, country).and_then(|r| r.number("GDP_Growth")), 1);

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("Sintesi dei dati più recenti disponibili per l'area: {}.", name));
    lines.push(String::new());
    lines.push(format!("## MERCATO IMMOBILIARE ({})", name));
    lines.push(format!("DATI CHIAVE (Anno {}):", latest.year));
    lines.push(format!("- Transazioni totali: {}", format_opt(latest.original_transactions, 0)));
    lines.push(format!("- Prezzo medio al m²: {}", euro(latest.average_price)));
    lines.push(format!("- Variazione % annua prezzi: {}", pct(latest.price_var, 1)));
    lines.push(String::new());
    lines.push(format!("MODELLO PREDITTIVO (Leading - Stima per il {}):", forecast_year));
    lines.push(format!(
        "- Valore predetto (indice): {}",
        format_opt(predictive.and_then(|p| p.market_index_predicted), 2)
    ));
    let impacts = predictive.map(|p| p.impacts).unwrap_or_default();
    lines.push(format!("- Fiducia Consumatori: {}", format_opt(impacts.confidence, 2)));
    lines.push(format!("- Spread BTP-Bund: {}", format_opt(impacts.spread, 2)));
    lines.push(format!("- Nuovi Mutui: {}", format_opt(impacts.mortgages, 2)));
    lines.push(String::new());
    lines.push(format!(
        "MODELLO DESCRITTIVO (Lagging - Analisi del {}):",
        lagging.map_or_else(|| "N/D".to_string(), |l| l.year.to_string())
    ));
    lines.push(format!(
        "- Valore del modello (indice): {}",
        format_opt(lagging.and_then(|l| l.market_index_predicted), 2)
    ));
    lines.push(format!("- Affitto Medio: {}", format_opt(lagging.and_then(|l| l.impacts.rent), 2)));
    lines.push(format!(
        "- Costi di Costruzione: {}",
        format_opt(lagging.and_then(|l| l.impacts.construction_cost), 2)
    ));
    lines.push(format!(
        "- Tasso Default Mutui: {}",
        format_opt(lagging.and_then(|l| l.impacts.default_rate), 2)
    ));
    lines.push(String::new());
    lines.push(format!(
        "SOSTENIBILITÀ ACQUISTO (ITALIA - Anno {}):",
        afford.map_or("N/D", |a| a.year.as_str())
    ));
    lines.push(format!(
        "- Indice di sostenibilità (mutuo 20 anni): {}",
        format_opt(afford.and_then(|a| a.sustainability_20), 1)
    ));
    lines.push(format!(
        "- Indice di sostenibilità (mutuo 25 anni): {}",
        format_opt(afford.and_then(|a| a.sustainability_25), 1)
    ));
    lines.push(String::new());
    lines.push(format!("RIPARTIZIONE MERCATO PER DIMENSIONE (Anno {}):", latest.year));
    lines.push(format!("- Fino a 50 mq: {} transazioni", bucket(sizes.up_to_50)));
    lines.push(format!("- 50-85 mq: {} transazioni", bucket(sizes.from_50_to_85)));
    lines.push(format!("- 85-115 mq: {} transazioni", bucket(sizes.from_85_to_115)));
    lines.push(format!(
        "- Oltre 115 mq (somma): {} transazioni",
        format_number(
            sizes.from_115_to_145.unwrap_or(0.0) + sizes.over_145.unwrap_or(0.0),
            0
        )
    ));
    lines.push(String::new());
    lines.push("## CONTESTO MACROECONOMICO (DATI PIÙ RECENTI)".to_string());
    lines.push(format!("INFLAZIONE (Indice HICP, base 2015=100, dato di {}):", month_label(cpi)));
    lines.push(format!("- Italia: {}", macro_num(cpi, "Italy_HICP_2015base", 2)));
    lines.push(format!("- Area Euro: {}", macro_num(cpi, "EuroArea_HICP_2015base", 2)));
    lines.push(format!("- USA: {}", macro_num(cpi, "USA_CPI_2015base", 2)));
    lines.push(String::new());
    lines.push(format!("COSTO DEL DENARO (Dato di {}):", month_label(bonds)));
    lines.push(format!("- Tasso BTP 10 Anni (ITA): {}", pct(bonds.and_then(|r| r.number("BTP_10Y")), 2)));
    lines.push(format!(
        "- Tasso Bund 10 Anni (UE): {}",
        pct(bonds.and_then(|r| r.number("IRLTLT01DEM156N")), 2)
    ));
    lines.push(format!("- Euribor 3 Mesi: {}", pct(rates.and_then(|r| r.number("Euribor_3M")), 2)));
    lines.push(String::new());
    lines.push(format!(
        "CRESCITA ECONOMICA (PIL % YoY, dato del {}):",
        gdp_italy
            .and_then(|r| r.number("Year"))
            .map_or_else(|| "N/D".to_string(), |y| format!("{:.0}", y))
    ));
    lines.push(format!("- Italia: {}", gdp("Italy")));
    lines.push(format!("- Germania: {}", gdp("Germany")));
    lines.push(format!("- Francia: {}", gdp("France")));
    lines.push(format!("- Spagna: {}", gdp("Spain")));
    lines.push(String::new());
    lines.push(format!("MATERIE PRIME (Indice, dato di {}):", month_label(commodities)));
    lines.push(format!("- Indice Energia (Fuel): {}", macro_num(commodities, "Fuel_Index", 2)));
    lines.push(format!("- Indice Non-Energia: {}", macro_num(commodities, "Non_Fuel_Index", 2)));
    lines.push(String::new());
    lines.push(format!("COSTO ENERGIA (Dato di {}):", month_label(energy)));
    lines.push(format!("- Elettricità (PUN): {} €/kWh", macro_num(energy, "PUN euro/kWh", 3)));
    lines.push(format!("- Gas (PSV): {} €/Smc", macro_num(energy, "PSV euro/Smc", 3)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PredictiveOutput;
    use std::collections::BTreeMap;

    fn rec(region: &str, year: &str, tx: Option<f64>, price: Option<f64>) -> YearlyRegionRecord {
        YearlyRegionRecord::new(year, region, tx, price, Some(1.0))
    }

    fn dataset() -> RegionalDataset {
        let mut data = RegionalDataset::new();
        data.insert(
            "LAZIO".to_string(),
            vec![rec("LAZIO", "2022", Some(40_000.0), Some(2_500.0)), rec("LAZIO", "2023", Some(42_000.0), Some(2_600.0))],
        );
        data.insert("MOLISE".to_string(), vec![rec("MOLISE", "2023", Some(2_000.0), None)]);
        data.insert("PUGLIA".to_string(), vec![rec("PUGLIA", "2023", Some(30_000.0), Some(1_300.0))]);
        data.insert(
            NATIONAL_KEY.to_string(),
            vec![
                rec(NATIONAL_KEY, "2022", Some(700_000.0), Some(1_900.0)),
                rec(NATIONAL_KEY, "2023", Some(0.0), Some(1_950.0)),
                rec(NATIONAL_KEY, "2024", Some(650_000.0), Some(2_000.0)),
            ],
        );
        data
    }

    #[test]
    fn ranking_uses_latest_record_and_skips_national() {
        let rows = regional_ranking(&dataset(), RankingMetric::AveragePrice, DEFAULT_RANKING_LIMIT);
        let order: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["Lazio", "Puglia", "Molise"]);
        assert_eq!(rows[0].value, "2.600");
        assert_eq!(rows[2].value, "0");

        let top1 = regional_ranking(&dataset(), RankingMetric::Transactions, 1);
        assert_eq!(top1.len(), 1);
        assert_eq!(top1[0].region, "Lazio");
    }

    #[test]
    fn yoy_series_treats_zero_base_as_zero() {
        let series = yoy_transaction_series(&dataset()[NATIONAL_KEY]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "2023");
        assert!((series[0].1 + 100.0).abs() < 1e-9);
        assert_eq!(series[1], ("2024".to_string(), 0.0));
        assert!(yoy_transaction_series(&[]).is_empty());
    }

    #[test]
    fn size_shares_come_from_latest_record_with_buckets() {
        let mut records = dataset()[NATIONAL_KEY].clone();
        records[1].transactions_by_size = Some(TransactionsBySize {
            up_to_50: Some(25.0),
            from_50_to_85: Some(75.0),
            ..Default::default()
        });
        let (year, rows) = size_bucket_shares(&records).expect("buckets present");
        assert_eq!(year, "2023");
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].share, "25,0");
        assert_eq!(rows[1].share, "75,0");
        assert_eq!(rows[4].share, "0,0");
        assert!(size_bucket_shares(&dataset()["LAZIO"]).is_none());
    }

    #[test]
    fn summary_reports_national_phase_and_scale() {
        let mut data = HousingData {
            regional_data: dataset(),
            ..Default::default()
        };
        if let Some(national) = data.regional_data.get_mut(NATIONAL_KEY) {
            national[0].predictive = Some(PredictiveOutput {
                market_index_actual: Some(1.0),
                ..Default::default()
            });
            national[2].predictive = Some(PredictiveOutput {
                market_index_actual: Some(3.0),
                ..Default::default()
            });
        }
        let summary = generate_summary(&data, Metric::AveragePrice, "2023");
        assert_eq!(summary.total_regions, 3);
        assert_eq!(summary.first_year.as_deref(), Some("2022"));
        assert_eq!(summary.last_year.as_deref(), Some("2024"));
        // 2023 -> 2024 with a zero base is a recovery.
        assert_eq!(summary.national_phase, "Ripresa");
        assert_eq!(summary.scale_max, 5.0);
        assert_eq!(summary.scale_min, -5.0);
        assert_eq!(summary.market_index_equilibrium, Some(2.0));
    }

    #[test]
    fn context_without_records_is_the_apology() {
        let macro_data = MacroData::new();
        let text = market_context(&ContextInputs {
            display_name: "Italia",
            records: &[],
            lagging: &[],
            affordability: &[],
            macro_data: &macro_data,
        });
        assert_eq!(text, CONTEXT_UNAVAILABLE);
    }

    #[test]
    fn context_fills_placeholders_for_missing_values() {
        let mut macro_data = MacroData::new();
        macro_data.insert(
            "cpi".to_string(),
            vec![
                MacroRow {
                    date: Some("2024-01-01".to_string()),
                    values: BTreeMap::from([("Italy_HICP_2015base".to_string(), MacroValue::Number(119.0))]),
                },
                MacroRow {
                    date: Some("2024-02-01".to_string()),
                    values: BTreeMap::from([("Italy_HICP_2015base".to_string(), MacroValue::Number(120.5))]),
                },
            ],
        );
        let records = dataset()[NATIONAL_KEY].clone();
        let text = market_context(&ContextInputs {
            display_name: "Italia",
            records: &records,
            lagging: &[],
            affordability: &[],
            macro_data: &macro_data,
        });
        assert!(text.contains("DATI CHIAVE (Anno 2024):"));
        assert!(text.contains("- Transazioni totali: 650.000"));
        assert!(text.contains("- Prezzo medio al m²: 2.000 €"));
        assert!(text.contains("MODELLO PREDITTIVO (Leading - Stima per il N/D):"));
        assert!(text.contains("dato di febbraio 2024"));
        assert!(text.contains("- Italia: 120,50"));
        assert!(text.contains("- Euribor 3 Mesi: N/D"));
    }

    #[test]
    fn display_names_are_capitalized() {
        assert_eq!(display_region_name("VALLE D'AOSTA"), "Valle d'aosta");
        assert_eq!(display_region_name(""), "");
    }
}
