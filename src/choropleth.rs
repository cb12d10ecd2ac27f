// Year-over-year variation per region and the diverging color scale that
// paints it on the map.
use crate::types::{RegionalDataset, VariationRow, YearlyRegionRecord};
use crate::util::{format_number, NATIONAL_KEY};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Color of "no change", the pivot of every diverging scale.
pub const NEUTRAL: Rgb = Rgb(245, 245, 245);
/// Default color for falling values (the Recession phase color).
pub const NEGATIVE: Rgb = Rgb(244, 67, 54);
/// Default color for rising values (the Recovery phase color).
pub const POSITIVE: Rgb = Rgb(76, 175, 80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Transactions,
    OriginalTransactions,
    AveragePrice,
    PriceVar,
}

impl Metric {
    pub fn value(self, record: &YearlyRegionRecord) -> Option<f64> {
        match self {
            Metric::Transactions => record.transactions,
            Metric::OriginalTransactions => record.original_transactions,
            Metric::AveragePrice => record.average_price,
            Metric::PriceVar => record.price_var,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Transactions => "transactions",
            Metric::OriginalTransactions => "originalTransactions",
            Metric::AveragePrice => "averagePrice",
            Metric::PriceVar => "priceVar",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Transactions => "Numero Transazioni (in migliaia)",
            Metric::OriginalTransactions => "Numero Transazioni",
            Metric::AveragePrice => "Prezzo Medio (€/m²)",
            Metric::PriceVar => "Variazione % Prezzo",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "transactions" => Ok(Metric::Transactions),
            "originalTransactions" => Ok(Metric::OriginalTransactions),
            "averagePrice" => Ok(Metric::AveragePrice),
            "priceVar" => Ok(Metric::PriceVar),
            other => Err(format!(
                "unknown metric '{}', expected one of: transactions, originalTransactions, averagePrice, priceVar",
                other
            )),
        }
    }
}

/// Symmetric value range of a diverging scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

/// Percent change of `metric` between `year` and the year before, per region.
///
/// A region is left out (not zero) when either year is missing, either value
/// is missing or the prior value is zero. The national aggregate is skipped.
pub fn percentage_change(dataset: &RegionalDataset, metric: Metric, year: &str) -> BTreeMap<String, f64> {
    let mut changes = BTreeMap::new();
    let Ok(year_num) = year.trim().parse::<i32>() else {
        return changes;
    };
    let year = year_num.to_string();
    let previous_year = (year_num - 1).to_string();

    for (region, records) in dataset {
        if region == NATIONAL_KEY {
            continue;
        }
        let current = records.iter().find(|r| r.year == year).and_then(|r| metric.value(r));
        let previous = records
            .iter()
            .find(|r| r.year == previous_year)
            .and_then(|r| metric.value(r));
        if let (Some(curr), Some(prev)) = (current, previous) {
            if prev != 0.0 {
                changes.insert(region.clone(), (curr - prev) / prev * 100.0);
            }
        }
    }
    changes
}

/// Range symmetric about zero, rounded up to a multiple of 5.
///
/// Never zero-width: no variations (or only zeros) give `[-1, 1]`.
pub fn symmetric_range(variations: &BTreeMap<String, f64>) -> ColorScale {
    let absolute_max = variations
        .values()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let limit = (absolute_max / 5.0).ceil() * 5.0;
    if limit <= 0.0 {
        return ColorScale { min: -1.0, max: 1.0 };
    }
    ColorScale {
        min: -limit,
        max: limit,
    }
}

/// Diverging color for `value` on `[min, max]`, pivoting at the midpoint.
///
/// Values at or below the midpoint blend `start` into `NEUTRAL`, values above
/// blend `NEUTRAL` into `end`. The blend fraction is clamped, so values
/// outside the range saturate.
pub fn color_for_value(value: f64, min: f64, max: f64, start: Rgb, end: Rgb) -> Rgb {
    if max == min {
        return start;
    }
    if value.is_nan() {
        return NEUTRAL;
    }
    let mid = (min + max) / 2.0;

    let (from, to, ratio) = if value <= mid {
        let range = mid - min;
        let ratio = if range == 0.0 { 1.0 } else { (value - min) / range };
        (start, NEUTRAL, ratio)
    } else {
        let range = max - mid;
        let ratio = if range == 0.0 { 1.0 } else { (value - mid) / range };
        (NEUTRAL, end, ratio)
    };

    interpolate(from, to, ratio.clamp(0.0, 1.0))
}

fn interpolate(from: Rgb, to: Rgb, ratio: f64) -> Rgb {
    let channel = |a: u8, b: u8| -> u8 {
        let v = f64::from(a) + ratio * (f64::from(b) - f64::from(a));
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb(
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

/// Table rows for a variation map, colored with the default palette.
pub fn variation_rows(variations: &BTreeMap<String, f64>, scale: ColorScale) -> Vec<VariationRow> {
    let mut rows: Vec<(f64, VariationRow)> = variations
        .iter()
        .map(|(region, v)| {
            let color = color_for_value(*v, scale.min, scale.max, NEGATIVE, POSITIVE);
            (
                *v,
                VariationRow {
                    region: region.clone(),
                    variation: format_number(*v, 2),
                    color: color.to_string(),
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    rows.into_iter().map(|(_, row)| row).collect()
}
