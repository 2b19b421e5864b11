//! Schedule E: spreading each site's total due back over its titles.

use super::aggregate::SiteNode;
use super::liability::{SiteLiability, net_receipts};
use crate::model::AgeClass;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// Licence window length added to the release date in the detail report.
pub const RELEASE_WINDOW_DAYS: u64 = 364;

#[derive(Debug, Clone, PartialEq)]
pub struct TitleAllocation {
    pub title: String,
    pub row: u32,
    pub plays: i64,
    pub guest_charge: f64,
    pub share_pct: f64,
    pub gross_receipts: f64,
    pub net_receipts: f64,
    pub allocated_share: f64,
    pub reference_id: String,
    pub release_date: Option<NaiveDate>,
    pub age_class: AgeClass,
    /// e.g. "Airtime Hybrid"; only set for titles matched by a provider rule
    pub policy_label: Option<String>,
}

impl TitleAllocation {
    pub fn share_fraction(&self) -> f64 {
        self.share_pct / 100.0
    }

    pub fn release_end(&self) -> Option<NaiveDate> {
        self.release_date
            .and_then(|date| date.checked_add_days(Days::new(RELEASE_WINDOW_DAYS)))
    }
}

/// A title's share of its site's total due.
///
/// Net-proportional whenever the title earned anything. Only when the whole
/// site earned nothing does the split fall back to play counts, and to an
/// even split when nothing was played either.
pub fn allocated_share(
    title_net: f64,
    plays: i64,
    liability: &SiteLiability,
    title_count: usize,
) -> f64 {
    if title_net != 0.0 {
        title_net * liability.total_due / liability.net_receipts
    } else if liability.net_receipts != 0.0 {
        0.0
    } else if liability.total_plays != 0 {
        liability.total_due * plays as f64 / liability.total_plays as f64
    } else if title_count > 0 {
        liability.total_due / title_count as f64
    } else {
        0.0
    }
}

pub fn allocate_site(
    site: &SiteNode,
    tax_multiplier: f64,
    liability: &SiteLiability,
) -> Vec<TitleAllocation> {
    let title_count = site.title_count();
    site.titles()
        .zip(liability.rows.start..)
        .map(|((name, title), row)| {
            let gross = title.plays as f64 * title.guest_charge;
            let net = net_receipts(gross, title.share_pct, tax_multiplier);
            TitleAllocation {
                title: name.to_string(),
                row,
                plays: title.plays,
                guest_charge: title.guest_charge,
                share_pct: title.share_pct,
                gross_receipts: gross,
                net_receipts: net,
                allocated_share: allocated_share(net, title.plays, liability, title_count),
                reference_id: title.reference_id.clone(),
                release_date: title.release_date,
                age_class: title.age_class,
                policy_label: title
                    .provider_label
                    .as_ref()
                    .map(|label| format!("{label} {}", title.policy)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleEEntry {
    pub reference_id: String,
    pub allocated: f64,
}

/// Allocated shares summed per title name across every site.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleETotals {
    entries: BTreeMap<String, ScheduleEEntry>,
}

impl ScheduleETotals {
    /// Add one site's allocation. The reference id of the first contributor is kept.
    pub fn add(&mut self, title: &str, reference_id: &str, amount: f64) {
        self.entries
            .entry(title.to_string())
            .or_insert_with(|| ScheduleEEntry {
                reference_id: reference_id.to_string(),
                allocated: 0.0,
            })
            .allocated += amount;
    }

    /// Entries in ascending title order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ScheduleEEntry)> {
        self.entries.iter().map(|(title, entry)| (title.as_str(), entry))
    }

    pub fn get(&self, title: &str) -> Option<&ScheduleEEntry> {
        self.entries.get(title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.values().map(|entry| entry.allocated).sum()
    }
}
