// Phase classification of consecutive yearly records and the historical
// segmentation into contiguous phase blocks.
use crate::phase::{price_thresholds as price, transaction_thresholds as tx, Phase, PhaseDetail};
use crate::types::{PhaseBlockRow, YearlyRegionRecord};
use serde::Serialize;

/// A maximal run of consecutive years sharing one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseBlock {
    pub start_year: String,
    pub end_year: String,
    pub phase_id: u8,
    pub phase_name: &'static str,
    pub phase_short_name: &'static str,
    pub phase_color: &'static str,
}

impl PhaseBlock {
    fn open(year: &str, detail: &'static PhaseDetail) -> Self {
        Self {
            start_year: year.to_string(),
            end_year: year.to_string(),
            phase_id: detail.id,
            phase_name: detail.name,
            phase_short_name: detail.short_name,
            phase_color: detail.color,
        }
    }

    pub fn to_row(&self) -> PhaseBlockRow {
        PhaseBlockRow {
            start_year: self.start_year.clone(),
            end_year: self.end_year.clone(),
            phase_id: self.phase_id,
            phase_name: self.phase_name.to_string(),
            phase_color: self.phase_color.to_string(),
        }
    }
}

/// Classify `current` against the immediately preceding year of the same region.
///
/// Missing records, missing transaction counts or a missing current price
/// change give `Indeterminate`. The rules are evaluated in order and the
/// first match wins; the ranges overlap, so the order is part of the rule set.
pub fn classify_phase(
    current: Option<&YearlyRegionRecord>,
    previous: Option<&YearlyRegionRecord>,
) -> &'static PhaseDetail {
    classify(current, previous).detail()
}

fn classify(current: Option<&YearlyRegionRecord>, previous: Option<&YearlyRegionRecord>) -> Phase {
    let (Some(current), Some(previous)) = (current, previous) else {
        return Phase::Indeterminate;
    };
    let (Some(t_curr), Some(t_prev), Some(p)) = (
        current.original_transactions,
        previous.original_transactions,
        current.price_var,
    ) else {
        return Phase::Indeterminate;
    };

    if t_prev == 0.0 {
        return if t_curr > 0.0 {
            Phase::Recovery
        } else {
            Phase::Indeterminate
        };
    }

    phase_for_changes((t_curr - t_prev) / t_prev * 100.0, p)
}

/// Ordered rule set over the transaction change `t` and price change `p`,
/// both in percent.
fn phase_for_changes(t: f64, p: f64) -> Phase {
    if t >= tx::STRONG_POS && p >= price::STRONG_POS {
        Phase::NewExpansion
    } else if t >= tx::MILD_POS && p >= price::MILD_POS {
        Phase::Expansion
    } else if t < tx::MILD_POS && t > tx::STRONG_NEG && p >= price::MILD_POS {
        Phase::Slowdown
    } else if t <= tx::MILD_NEG && p <= price::MILD_NEG {
        Phase::Recession
    } else if t >= tx::MILD_POS && p < price::MILD_POS && p > price::STRONG_NEG {
        Phase::Recovery
    } else if t <= tx::MILD_NEG && p >= price::MILD_NEG && p < price::MILD_POS {
        Phase::Contraction
    } else {
        Phase::Indeterminate
    }
}

/// Phase of the most recent year of a chronologically sorted series.
pub fn current_phase(records: &[YearlyRegionRecord]) -> &'static PhaseDetail {
    match records {
        [.., previous, current] => classify_phase(Some(current), Some(previous)),
        _ => Phase::Indeterminate.detail(),
    }
}

/// Run-length encode the pairwise phases of a chronologically sorted series.
///
/// The first year has no predecessor and belongs to no block, so the blocks
/// cover `records[1].year ..= records[last].year` without gaps or overlaps.
pub fn segment_history(records: &[YearlyRegionRecord]) -> Vec<PhaseBlock> {
    let mut blocks = Vec::new();
    let mut active: Option<PhaseBlock> = None;

    for pair in records.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let detail = classify_phase(Some(current), Some(previous));
        match active.as_mut() {
            Some(block) if block.phase_id == detail.id => {
                block.end_year = current.year.clone();
            }
            _ => {
                if let Some(mut done) = active.take() {
                    done.end_year = previous.year.clone();
                    blocks.push(done);
                }
                active = Some(PhaseBlock::open(&current.year, detail));
            }
        }
    }
    if let Some(last) = active {
        blocks.push(last);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: &str, transactions: Option<f64>, price_var: Option<f64>) -> YearlyRegionRecord {
        YearlyRegionRecord::new(year, "LAZIO", transactions, Some(2_500.0), price_var)
    }

    fn phase_of(prev_t: f64, curr_t: f64, price_var: f64) -> Phase {
        let prev = rec("2020", Some(prev_t), None);
        let curr = rec("2021", Some(curr_t), Some(price_var));
        classify_phase(Some(&curr), Some(&prev)).phase()
    }

    #[test]
    fn missing_inputs_are_indeterminate() {
        let full = rec("2021", Some(100.0), Some(1.0));
        assert_eq!(classify_phase(None, Some(&full)).id, 0);
        assert_eq!(classify_phase(Some(&full), None).id, 0);
        let no_price = rec("2021", Some(120.0), None);
        assert_eq!(classify_phase(Some(&no_price), Some(&full)).id, 0);
        let no_tx = rec("2020", None, Some(1.0));
        assert_eq!(classify_phase(Some(&full), Some(&no_tx)).id, 0);
    }

    #[test]
    fn zero_previous_transactions() {
        assert_eq!(phase_of(0.0, 50.0, -5.0), Phase::Recovery);
        assert_eq!(phase_of(0.0, 0.0, 3.0), Phase::Indeterminate);
    }

    #[test]
    fn each_rule_in_order() {
        assert_eq!(phase_of(100.0, 125.0, 2.0), Phase::NewExpansion);
        // Strong transactions but only mild price growth falls to Expansion.
        assert_eq!(phase_of(100.0, 125.0, 1.0), Phase::Expansion);
        assert_eq!(phase_of(100.0, 110.0, 0.2), Phase::Expansion);
        assert_eq!(phase_of(100.0, 100.0, 0.5), Phase::Slowdown);
        assert_eq!(phase_of(100.0, 90.0, -2.0), Phase::Recession);
        assert_eq!(phase_of(100.0, 110.0, -1.0), Phase::Recovery);
        assert_eq!(phase_of(100.0, 90.0, -1.0), Phase::Contraction);
    }

    #[test]
    fn overlapping_ranges_resolve_by_order() {
        // -10% transactions with rising prices hits Slowdown before anything else.
        assert_eq!(phase_of(100.0, 90.0, 0.5), Phase::Slowdown);
        // -20% with rising prices matches no rule.
        assert_eq!(phase_of(100.0, 80.0, 0.5), Phase::Indeterminate);
        // Strong growth with a deep price fall is not a recovery.
        assert_eq!(phase_of(100.0, 130.0, -3.0), Phase::Indeterminate);
        // Flat transactions with falling prices.
        assert_eq!(phase_of(100.0, 100.0, -1.0), Phase::Indeterminate);
    }

    #[test]
    fn recession_wins_the_shared_price_boundary() {
        // p == MILD_NEG satisfies both Recession and Contraction.
        assert_eq!(phase_of(100.0, 80.0, price::MILD_NEG), Phase::Recession);
        assert_eq!(phase_for_changes(tx::MILD_NEG, price::MILD_NEG), Phase::Recession);
        assert_eq!(phase_for_changes(-20.0, -1.74), Phase::Contraction);
    }

    #[test]
    fn threshold_ends_are_inclusive_or_exclusive_as_written() {
        assert_eq!(phase_for_changes(tx::STRONG_POS, price::STRONG_POS), Phase::NewExpansion);
        assert_eq!(phase_for_changes(tx::MILD_POS, price::MILD_POS), Phase::Expansion);
        assert_eq!(phase_for_changes(tx::MILD_POS, -1.0), Phase::Recovery);
        assert_eq!(phase_for_changes(tx::MILD_NEG, -1.0), Phase::Contraction);
        // Slowdown excludes its lower transaction bound.
        assert_eq!(phase_for_changes(tx::STRONG_NEG, 0.5), Phase::Indeterminate);
        assert_eq!(phase_for_changes(tx::STRONG_NEG + 0.01, 0.5), Phase::Slowdown);
        // Recovery excludes the deep-fall price bound.
        assert_eq!(phase_for_changes(30.0, price::STRONG_NEG), Phase::Indeterminate);
        assert_eq!(phase_for_changes(30.0, price::STRONG_NEG + 0.01), Phase::Recovery);
    }

    #[test]
    fn segmentation_merges_equal_neighbours() {
        let series = vec![
            rec("2015", Some(100.0), Some(0.0)),
            rec("2016", Some(125.0), Some(2.0)),
            rec("2017", Some(160.0), Some(3.0)),
            rec("2018", Some(140.0), Some(-2.0)),
            rec("2019", Some(150.0), Some(-1.0)),
        ];
        let blocks = segment_history(&series);
        let summary: Vec<(&str, &str, u8)> = blocks
            .iter()
            .map(|b| (b.start_year.as_str(), b.end_year.as_str(), b.phase_id))
            .collect();
        assert_eq!(
            summary,
            vec![("2016", "2017", 6), ("2018", "2018", 4), ("2019", "2019", 0)]
        );
    }

    #[test]
    fn short_series_have_no_blocks() {
        assert!(segment_history(&[]).is_empty());
        assert!(segment_history(&[rec("2020", Some(1.0), Some(1.0))]).is_empty());
        assert_eq!(current_phase(&[rec("2020", Some(1.0), Some(1.0))]).id, 0);
    }

    #[test]
    fn current_phase_uses_last_pair() {
        let series = vec![
            rec("2019", Some(100.0), Some(0.0)),
            rec("2020", Some(80.0), Some(-2.0)),
            rec("2021", Some(125.0), Some(-1.0)),
        ];
        assert_eq!(current_phase(&series).phase(), Phase::Recovery);
    }
}
