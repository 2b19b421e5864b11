//! Per-site guaranteed minimum, net receipts and total due.

use super::aggregate::SiteNode;
use crate::model::PaymentPolicy;

/// Inclusive range of detail-report rows occupied by one site's titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u32,
    pub end: u32,
}

impl RowRange {
    pub fn len(&self) -> u32 {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteLiability {
    /// Rate of the first title processed, pence per room per day
    pub rate: f64,
    pub days: u32,
    pub guaranteed_minimum: f64,
    pub net_receipts: f64,
    pub total_due: f64,
    pub total_plays: i64,
    pub policy: PaymentPolicy,
    pub rows: RowRange,
}

/// Net receipts for one title: `gross × share% ÷ tax multiplier`.
///
/// Keep this operation order: totals are compared bit for bit across runs.
pub fn net_receipts(gross: f64, share_pct: f64, tax_multiplier: f64) -> f64 {
    gross * share_pct / 100.0 / tax_multiplier
}

pub fn guaranteed_minimum(rooms: i64, rate: f64, days: u32) -> f64 {
    rooms as f64 * rate * days as f64 / 100.0
}

pub fn total_due(policy: PaymentPolicy, guaranteed_minimum: f64, net_receipts: f64) -> f64 {
    match policy {
        PaymentPolicy::Hybrid => net_receipts + guaranteed_minimum,
        PaymentPolicy::GuestToPay => net_receipts,
        PaymentPolicy::GuaranteeFloor => {
            if guaranteed_minimum > net_receipts {
                guaranteed_minimum
            } else {
                net_receipts
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SiteLiabilityCalculator {
    days_in_period: u32,
}

impl SiteLiabilityCalculator {
    pub fn new(days_in_period: u32) -> Self {
        Self { days_in_period }
    }

    /// Compute a site's liability. Titles are visited in name order, which
    /// fixes both the rate/policy source (the first title) and the row range
    /// beginning at `first_row`.
    pub fn compute(&self, site: &SiteNode, tax_multiplier: f64, first_row: u32) -> SiteLiability {
        let mut net = 0.0;
        let mut plays = 0;
        let mut rows = 0;
        let mut first = None;

        for (_, title) in site.titles() {
            let gross = title.plays as f64 * title.guest_charge;
            net += net_receipts(gross, title.share_pct, tax_multiplier);
            plays += title.plays;
            rows += 1;
            if first.is_none() {
                first = Some((title.rate, title.policy));
            }
        }

        let (rate, policy) = first.unwrap_or((0.0, PaymentPolicy::GuaranteeFloor));
        let guarantee = guaranteed_minimum(site.rooms(), rate, self.days_in_period);

        SiteLiability {
            rate,
            days: self.days_in_period,
            guaranteed_minimum: guarantee,
            net_receipts: net,
            total_due: total_due(policy, guarantee, net),
            total_plays: plays,
            policy,
            rows: RowRange {
                start: first_row,
                end: first_row + rows - 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarantee_floor_takes_the_larger_amount() {
        assert_eq!(total_due(PaymentPolicy::GuaranteeFloor, 12.0, 5.0), 12.0);
        assert_eq!(total_due(PaymentPolicy::GuaranteeFloor, 12.0, 16.5), 16.5);
    }

    #[test]
    fn hybrid_adds_and_guest_to_pay_ignores_guarantee() {
        assert_eq!(total_due(PaymentPolicy::Hybrid, 12.0, 5.0), 17.0);
        assert_eq!(total_due(PaymentPolicy::GuestToPay, 12.0, 5.0), 5.0);
    }

    #[test]
    fn guarantee_uses_pence_per_room_per_day() {
        assert_eq!(guaranteed_minimum(10, 4.0, 30), 12.0);
        assert_eq!(guaranteed_minimum(0, 4.0, 30), 0.0);
    }

    #[test]
    fn row_range_length() {
        let rows = RowRange { start: 4, end: 6 };
        assert_eq!(rows.len(), 3);
        assert!(!rows.is_empty());
    }
}
