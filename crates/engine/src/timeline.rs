//! Tiered, date-bounded interest-rate structure.

use chrono::{Months, NaiveDate};
use subrecon_core::contract::{RateBands, RateTier};

/// Whole-year offsets of the tier starts from the subsidy period start:
/// years 1–3, year 4, year 5, years 6–7.
const TIER_START_MONTHS: [u32; 4] = [0, 36, 48, 60];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTimeline {
    tiers: Vec<RateTier>,
}

impl RateTimeline {
    /// Build the active tiers for a contract. The first band always forms a
    /// tier; a later band joins only if its rate is non-zero, differs from
    /// the previously active tier's rate, and its start precedes the
    /// contract end date.
    pub fn build(start: NaiveDate, end: NaiveDate, bands: &RateBands) -> Self {
        let rates = bands.as_array();
        let mut tiers: Vec<RateTier> = Vec::with_capacity(4);

        for (band, (&rate, &offset)) in rates.iter().zip(&TIER_START_MONTHS).enumerate() {
            let tier_start = start + Months::new(offset);
            if band > 0 {
                let prior_rate = tiers.last().map(|t| t.rate).unwrap_or(0);
                if rate == 0 || rate == prior_rate || tier_start >= end {
                    continue;
                }
            }
            tiers.push(RateTier {
                index: band,
                rate,
                start: tier_start,
                end, // provisional; chained below
            });
        }

        // Each tier ends the day before the next active tier starts.
        for i in 0..tiers.len().saturating_sub(1) {
            let next_start = tiers[i + 1].start;
            tiers[i].end = next_start.pred_opt().unwrap_or(next_start);
        }

        Self { tiers }
    }

    pub fn tiers(&self) -> &[RateTier] {
        &self.tiers
    }

    /// The tier a date falls in. Dates before the first tier clamp to the
    /// first, dates past the last tier clamp to the last.
    pub fn tier_on(&self, date: NaiveDate) -> &RateTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.start <= date)
            .unwrap_or(&self.tiers[0])
    }

    pub fn rate_on(&self, date: NaiveDate) -> i64 {
        self.tier_on(date).rate
    }

    pub fn tier_index_on(&self, date: NaiveDate) -> usize {
        self.tier_on(date).index
    }

    /// Tier starts strictly inside the accrual period `(from, to]`: the
    /// points where a payment period crosses into a new rate.
    pub fn crossings(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        self.tiers
            .iter()
            .map(|t| t.start)
            .filter(|&s| from < s && s <= to)
            .collect()
    }
}
