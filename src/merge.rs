// Join of the side datasets onto the main per-region series.
use crate::types::{PredictiveOutput, RegionYearMap, RegionalDataset, TransactionsBySize, YearlyRegionRecord};

/// Attach size buckets and leading-model output to the matching main records
/// (same region key, same year), then put every region in year order.
///
/// Side rows without a host record are dropped. Regions with no overlap keep
/// `None` in both fields.
pub fn merge_side_datasets(
    main: &mut RegionalDataset,
    by_size: &RegionYearMap<TransactionsBySize>,
    predictive: &RegionYearMap<PredictiveOutput>,
) {
    for (region, records) in main.iter_mut() {
        let sizes = by_size.get(region);
        let models = predictive.get(region);
        for record in records.iter_mut() {
            if let Some(buckets) = sizes.and_then(|m| m.get(&record.year)) {
                record.transactions_by_size = Some(*buckets);
            }
            if let Some(output) = models.and_then(|m| m.get(&record.year)) {
                record.predictive = Some(*output);
            }
        }
        sort_by_year(region, records);
    }
}

/// Ascending numeric year, one record per year. When a year repeats, the
/// row read last wins.
pub fn sort_by_year(region: &str, records: &mut Vec<YearlyRegionRecord>) {
    records.sort_by_key(|r| r.year_number().unwrap_or(i32::MAX));
    let before = records.len();
    let mut unique: Vec<YearlyRegionRecord> = Vec::with_capacity(before);
    for record in records.drain(..) {
        match unique.last_mut() {
            Some(last) if last.year_number() == record.year_number() => *last = record,
            _ => unique.push(record),
        }
    }
    if unique.len() != before {
        log::warn!(
            "{}: {} duplicate year row(s) replaced by the later one",
            region,
            before - unique.len()
        );
    }
    *records = unique;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rec(region: &str, year: &str, tx: f64) -> YearlyRegionRecord {
        YearlyRegionRecord::new(year, region, Some(tx), Some(1_000.0), Some(0.5))
    }

    #[test]
    fn attaches_side_data_by_region_and_year_then_sorts() {
        let mut main = RegionalDataset::new();
        main.insert(
            "LAZIO".to_string(),
            vec![rec("LAZIO", "2022", 2.0), rec("LAZIO", "2021", 1.0)],
        );
        main.insert("MOLISE".to_string(), vec![rec("MOLISE", "2022", 3.0)]);

        let buckets = TransactionsBySize {
            up_to_50: Some(5.0),
            ..Default::default()
        };
        let mut by_size = RegionYearMap::new();
        by_size.insert(
            "LAZIO".to_string(),
            BTreeMap::from([("2021".to_string(), buckets), ("1999".to_string(), buckets)]),
        );
        by_size.insert(
            "SARDEGNA".to_string(),
            BTreeMap::from([("2022".to_string(), buckets)]),
        );
        let mut predictive = RegionYearMap::new();
        predictive.insert(
            "LAZIO".to_string(),
            BTreeMap::from([(
                "2022".to_string(),
                PredictiveOutput {
                    market_index_actual: Some(0.3),
                    ..Default::default()
                },
            )]),
        );

        merge_side_datasets(&mut main, &by_size, &predictive);

        let lazio = &main["LAZIO"];
        assert_eq!(lazio[0].year, "2021");
        assert_eq!(lazio[0].transactions_by_size, Some(buckets));
        assert_eq!(lazio[0].predictive, None);
        assert_eq!(lazio[1].year, "2022");
        assert_eq!(lazio[1].transactions_by_size, None);
        assert_eq!(lazio[1].predictive.and_then(|p| p.market_index_actual), Some(0.3));

        assert_eq!(main["MOLISE"][0].transactions_by_size, None);
        assert!(!main.contains_key("SARDEGNA"));
        assert_eq!(lazio.len(), 2);
    }

    #[test]
    fn duplicate_years_keep_the_last_row() {
        let mut records = vec![
            rec("LAZIO", "2021", 1.0),
            rec("LAZIO", "2020", 0.5),
            rec("LAZIO", "2021", 9.0),
        ];
        sort_by_year("LAZIO", &mut records);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].original_transactions, Some(9.0));
    }
}
