// Market-health index: 0–100 scaling, KPI ranges and view-level ranking.
use crate::types::{HealthIndexData, HealthIndexEntry, HealthRankingRow, Semester};
use crate::util::{format_number, NATIONAL_KEY};
use std::cmp::Ordering;

/// Reference range for z-scores when no data-driven range is available.
pub const DEFAULT_Z_RANGE: (f64, f64) = (-2.0, 2.0);

/// Clamp `value` into `range`, map it linearly onto 0..=100 and round.
///
/// Returns `None` for a missing or non-finite value and for a degenerate
/// range (non-finite bound or `max <= min`), so an empty dataset whose range
/// is still `(inf, -inf)` never divides by zero.
pub fn scale_to_100(value: Option<f64>, range: (f64, f64)) -> Option<u8> {
    let value = value.filter(|v| v.is_finite())?;
    let (min, max) = range;
    if !min.is_finite() || !max.is_finite() || max <= min {
        return None;
    }
    let clamped = value.clamp(min, max);
    let normalized = (clamped - min) / (max - min);
    // Non-negative, so `round` (half away from zero) is half-up here.
    Some((normalized * 100.0).round() as u8)
}

/// `[min, max]` over every present, finite observation.
///
/// With no observations the result is `(INFINITY, NEG_INFINITY)`, which
/// `scale_to_100` treats as degenerate.
pub fn value_range<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Scale the raw headline index of the visible entries against the range of
/// those same entries. The score is comparative, so it changes with the view.
pub fn headline_scores(entries: &[&HealthIndexEntry]) -> Vec<Option<u8>> {
    let range = value_range(entries.iter().map(|e| e.health_index));
    entries
        .iter()
        .map(|e| scale_to_100(e.health_index, range))
        .collect()
}

/// Most recent `(year, semester)` present anywhere in the data.
pub fn latest_period(data: &HealthIndexData) -> Option<(i32, Semester)> {
    data.values()
        .flat_map(|entries| entries.iter().map(HealthIndexEntry::period_key))
        .max()
}

/// One entry per region for the given period, national aggregate excluded.
pub fn snapshot_at(data: &HealthIndexData, period: (i32, Semester)) -> Vec<&HealthIndexEntry> {
    data.iter()
        .filter(|(region, _)| region.as_str() != NATIONAL_KEY)
        .filter_map(|(_, entries)| entries.iter().rev().find(|e| e.period_key() == period))
        .collect()
}

/// Rank entries by raw index, highest first, missing values last.
/// The score column is the contextual 0–100 headline for this set of entries.
pub fn rank_by_health(entries: &[&HealthIndexEntry]) -> Vec<HealthRankingRow> {
    let scores = headline_scores(entries);
    let mut scored: Vec<(&HealthIndexEntry, Option<u8>)> =
        entries.iter().copied().zip(scores).collect();
    scored.sort_by(|a, b| match (a.0.health_index, b.0.health_index) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (entry, score))| HealthRankingRow {
            rank: idx + 1,
            region: entry.region_name.clone(),
            period: entry.period.clone(),
            score: score.map_or_else(|| "N/D".to_string(), |s| s.to_string()),
            variation: format_variation(entry),
            band: entry.health_band.clone(),
        })
        .collect()
}

/// Raw variation rendered for display.
pub fn format_variation(entry: &HealthIndexEntry) -> String {
    let sign = if entry.variation > 0.0 { "+" } else { "" };
    format!("{}{}", sign, format_number(entry.variation, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HealthKpis;
    use std::collections::BTreeMap;

    fn entry(region: &str, year: &str, semester: Semester, index: Option<f64>) -> HealthIndexEntry {
        HealthIndexEntry {
            year: year.to_string(),
            semester,
            period: format!("{}_{}", year, semester),
            region_name: region.to_string(),
            health_index: index,
            variation: 0.0,
            health_band: "Media".to_string(),
            kpis: HealthKpis::default(),
        }
    }

    #[test]
    fn scale_endpoints_and_clamping() {
        assert_eq!(scale_to_100(Some(-2.0), DEFAULT_Z_RANGE), Some(0));
        assert_eq!(scale_to_100(Some(2.0), DEFAULT_Z_RANGE), Some(100));
        assert_eq!(scale_to_100(Some(0.0), DEFAULT_Z_RANGE), Some(50));
        assert_eq!(scale_to_100(Some(7.0), DEFAULT_Z_RANGE), Some(100));
        assert_eq!(scale_to_100(Some(-7.0), DEFAULT_Z_RANGE), Some(0));
        assert_eq!(scale_to_100(Some(0.5), (0.0, 4.0)), Some(13));
    }

    #[test]
    fn scale_rejects_degenerate_input() {
        assert_eq!(scale_to_100(None, DEFAULT_Z_RANGE), None);
        assert_eq!(scale_to_100(Some(f64::NAN), DEFAULT_Z_RANGE), None);
        assert_eq!(scale_to_100(Some(1.0), (1.0, 1.0)), None);
        assert_eq!(scale_to_100(Some(1.0), (f64::INFINITY, f64::NEG_INFINITY)), None);
        assert_eq!(scale_to_100(Some(1.0), value_range(Vec::new())), None);
    }

    #[test]
    fn range_skips_missing_values() {
        assert_eq!(
            value_range(vec![Some(1.5), None, Some(-0.5), Some(f64::NAN)]),
            (-0.5, 1.5)
        );
    }

    #[test]
    fn headline_is_relative_to_the_view() {
        let a = entry("LAZIO", "2024", Semester::S1, Some(10.0));
        let b = entry("PUGLIA", "2024", Semester::S1, Some(20.0));
        let c = entry("SICILIA", "2024", Semester::S1, Some(15.0));
        assert_eq!(headline_scores(&[&a, &b, &c]), vec![Some(0), Some(100), Some(50)]);
        assert_eq!(headline_scores(&[&a, &c]), vec![Some(0), Some(100)]);
        assert_eq!(headline_scores(&[&a]), vec![None]);
    }

    #[test]
    fn snapshot_takes_latest_period_without_national() {
        let mut data: HealthIndexData = BTreeMap::new();
        data.insert(
            "LAZIO".to_string(),
            vec![
                entry("LAZIO", "2023", Semester::S2, Some(1.0)),
                entry("LAZIO", "2024", Semester::S1, Some(2.0)),
            ],
        );
        data.insert(
            "PUGLIA".to_string(),
            vec![entry("PUGLIA", "2023", Semester::S2, Some(3.0))],
        );
        data.insert(
            NATIONAL_KEY.to_string(),
            vec![entry(NATIONAL_KEY, "2024", Semester::S1, Some(5.0))],
        );
        let latest = latest_period(&data);
        assert_eq!(latest, Some((2024, Semester::S1)));
        let snapshot = snapshot_at(&data, (2024, Semester::S1));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].region_name, "LAZIO");
    }

    #[test]
    fn ranking_puts_missing_last() {
        let a = entry("LAZIO", "2024", Semester::S1, None);
        let b = entry("PUGLIA", "2024", Semester::S1, Some(20.0));
        let c = entry("SICILIA", "2024", Semester::S1, Some(15.0));
        let rows = rank_by_health(&[&a, &b, &c]);
        let order: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["PUGLIA", "SICILIA", "LAZIO"]);
        assert_eq!(rows[0].score, "100");
        assert_eq!(rows[2].score, "N/D");
    }
}
