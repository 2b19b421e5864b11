//! Territory → site → title aggregation.
//!
//! The tree uses ordered maps at every level so iteration is always
//! lexicographic by name, independent of the order events arrived in.

use crate::error::{RoyaltyError, RoyaltyResult};
use crate::model::{AgeClass, PaymentPolicy, UsageEvent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when an event repeats a (territory, site, title) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Later events overwrite counts and rates; first-seen metadata is kept
    #[default]
    Lenient,
    /// Repeats must agree on every attribute
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleNode {
    pub plays: i64,
    pub guest_charge: f64,
    pub share_pct: f64,
    pub rate: f64,
    pub hybrid: bool,
    pub policy: PaymentPolicy,
    pub provider_label: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub age_class: AgeClass,
    pub reference_id: String,
}

impl TitleNode {
    fn from_event(event: &UsageEvent) -> Self {
        Self {
            plays: event.plays,
            guest_charge: event.guest_charge,
            share_pct: event.share_pct,
            rate: event.rate,
            hybrid: event.hybrid,
            policy: event.policy,
            provider_label: event.provider_label.clone(),
            release_date: event.release_date,
            age_class: event.age_class,
            reference_id: event.reference_id.clone(),
        }
    }

    fn overwrite_counts(&mut self, event: &UsageEvent) {
        self.plays = event.plays;
        self.guest_charge = event.guest_charge;
        self.share_pct = event.share_pct;
        self.rate = event.rate;
        self.hybrid = event.hybrid;
        self.policy = event.policy;
        self.provider_label = event.provider_label.clone();
    }

    /// First attribute that differs from `event`, if any.
    fn conflict_with(&self, event: &UsageEvent) -> Option<&'static str> {
        if self.plays != event.plays {
            Some("plays")
        } else if self.guest_charge != event.guest_charge {
            Some("guest_charge")
        } else if self.share_pct != event.share_pct {
            Some("share_pct")
        } else if self.rate != event.rate {
            Some("rate")
        } else if self.policy != event.policy || self.hybrid != event.hybrid {
            Some("policy")
        } else if self.reference_id != event.reference_id {
            Some("reference_id")
        } else if self.release_date != event.release_date {
            Some("release_date")
        } else if self.age_class != event.age_class {
            Some("age_class")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteNode {
    rooms: i64,
    titles: BTreeMap<String, TitleNode>,
}

impl SiteNode {
    pub fn rooms(&self) -> i64 {
        self.rooms
    }

    /// Titles in ascending name order.
    pub fn titles(&self) -> impl Iterator<Item = (&str, &TitleNode)> {
        self.titles.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn title(&self, name: &str) -> Option<&TitleNode> {
        self.titles.get(name)
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryNode {
    tax_multiplier: f64,
    sites: BTreeMap<String, SiteNode>,
}

impl TerritoryNode {
    pub fn tax_multiplier(&self) -> f64 {
        self.tax_multiplier
    }

    /// Sites in ascending name order.
    pub fn sites(&self) -> impl Iterator<Item = (&str, &SiteNode)> {
        self.sites.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn site(&self, name: &str) -> Option<&SiteNode> {
        self.sites.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTree {
    territories: BTreeMap<String, TerritoryNode>,
}

impl AggregateTree {
    /// Territories in ascending name order.
    pub fn territories(&self) -> impl Iterator<Item = (&str, &TerritoryNode)> {
        self.territories
            .iter()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn territory(&self, name: &str) -> Option<&TerritoryNode> {
        self.territories.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    pub fn site_count(&self) -> usize {
        self.territories.values().map(|t| t.sites.len()).sum()
    }

    pub fn title_count(&self) -> usize {
        self.territories
            .values()
            .flat_map(|t| t.sites.values())
            .map(|s| s.titles.len())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    mode: AggregationMode,
}

impl Aggregator {
    pub fn new(mode: AggregationMode) -> Self {
        Self { mode }
    }

    pub fn aggregate<'a, I>(&self, events: I) -> RoyaltyResult<AggregateTree>
    where
        I: IntoIterator<Item = &'a UsageEvent>,
    {
        let mut tree = AggregateTree::default();
        for event in events {
            self.fold(&mut tree, event)?;
        }
        tracing::debug!(
            territories = tree.territories.len(),
            sites = tree.site_count(),
            titles = tree.title_count(),
            "aggregated usage events"
        );
        Ok(tree)
    }

    fn fold(&self, tree: &mut AggregateTree, event: &UsageEvent) -> RoyaltyResult<()> {
        let strict = self.mode == AggregationMode::Strict;
        let conflict = |attribute| RoyaltyError::DuplicateKeyConflict {
            territory: event.territory.clone(),
            site: event.site.clone(),
            title: event.title.clone(),
            attribute,
        };

        let territory = tree
            .territories
            .entry(event.territory.clone())
            .or_insert_with(|| TerritoryNode {
                tax_multiplier: event.tax_multiplier(),
                sites: BTreeMap::new(),
            });

        let site = territory
            .sites
            .entry(event.site.clone())
            .or_insert_with(|| SiteNode {
                rooms: event.rooms,
                titles: BTreeMap::new(),
            });

        match site.titles.get_mut(&event.title) {
            Some(existing) => {
                if strict {
                    if territory.tax_multiplier != event.tax_multiplier() {
                        return Err(conflict("tax_rate"));
                    }
                    if site.rooms != event.rooms {
                        return Err(conflict("rooms"));
                    }
                    if let Some(attribute) = existing.conflict_with(event) {
                        return Err(conflict(attribute));
                    }
                }
                existing.overwrite_counts(event);
            }
            None => {
                site.titles
                    .insert(event.title.clone(), TitleNode::from_event(event));
            }
        }

        // Last write wins for both.
        territory.tax_multiplier = event.tax_multiplier();
        site.rooms = event.rooms;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Partition;
    use assert_matches::assert_matches;

    fn event(territory: &str, site: &str, title: &str) -> UsageEvent {
        UsageEvent {
            territory: territory.to_string(),
            tax_rate: 20.0,
            site: site.to_string(),
            rooms: 10,
            title: title.to_string(),
            reference_id: format!("ref-{title}"),
            plays: 5,
            guest_charge: 4.5,
            rate: 3.2,
            share_pct: 40.0,
            hybrid: false,
            policy: PaymentPolicy::GuaranteeFloor,
            provider_label: None,
            release_date: None,
            age_class: AgeClass::Current,
            partition: Partition::Other,
        }
    }

    #[test]
    fn iteration_is_sorted_regardless_of_input_order() {
        let events = vec![
            event("UK", "Zeta", "b"),
            event("France", "Alpha", "z"),
            event("UK", "Alpha", "c"),
            event("UK", "Alpha", "a"),
        ];
        let tree = Aggregator::default().aggregate(&events).expect("tree");
        let territories: Vec<_> = tree.territories().map(|(name, _)| name).collect();
        assert_eq!(territories, vec!["France", "UK"]);

        let uk = tree.territory("UK").expect("uk");
        let sites: Vec<_> = uk.sites().map(|(name, _)| name).collect();
        assert_eq!(sites, vec!["Alpha", "Zeta"]);
        let titles: Vec<_> = uk
            .site("Alpha")
            .expect("alpha")
            .titles()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(tree.site_count(), 3);
        assert_eq!(tree.title_count(), 4);
    }

    #[test]
    fn tax_and_rooms_are_last_write_wins() {
        let mut first = event("UK", "Hotel", "a");
        first.tax_rate = 20.0;
        first.rooms = 10;
        let mut second = event("UK", "Hotel", "b");
        second.tax_rate = 5.0;
        second.rooms = 12;
        let tree = Aggregator::default()
            .aggregate(&[first, second])
            .expect("tree");
        let uk = tree.territory("UK").expect("uk");
        assert_eq!(uk.tax_multiplier(), 1.05);
        assert_eq!(uk.site("Hotel").expect("site").rooms(), 12);
    }

    #[test]
    fn lenient_repeat_overwrites_counts_but_keeps_first_metadata() {
        let first = event("UK", "Hotel", "a");
        let mut second = event("UK", "Hotel", "a");
        second.plays = 9;
        second.reference_id = "other".to_string();
        second.age_class = AgeClass::Library;
        let tree = Aggregator::default()
            .aggregate(&[first, second])
            .expect("tree");
        let title = tree
            .territory("UK")
            .and_then(|t| t.site("Hotel"))
            .and_then(|s| s.title("a"))
            .expect("title");
        assert_eq!(title.plays, 9);
        assert_eq!(title.reference_id, "ref-a");
        assert_eq!(title.age_class, AgeClass::Current);
    }

    #[test]
    fn strict_mode_rejects_conflicting_repeat() {
        let first = event("UK", "Hotel", "a");
        let mut second = event("UK", "Hotel", "a");
        second.plays = 9;
        let err = Aggregator::new(AggregationMode::Strict)
            .aggregate(&[first.clone(), second])
            .expect_err("conflict");
        assert_matches!(
            err,
            RoyaltyError::DuplicateKeyConflict {
                attribute: "plays",
                ..
            }
        );

        // Identical repeats are fine even in strict mode.
        let tree = Aggregator::new(AggregationMode::Strict)
            .aggregate(&[first.clone(), first])
            .expect("identical repeat");
        assert_eq!(tree.title_count(), 1);
    }

    #[test]
    fn strict_mode_rejects_room_disagreement_on_repeat() {
        let first = event("UK", "Hotel", "a");
        let mut second = event("UK", "Hotel", "a");
        second.rooms = 99;
        let err = Aggregator::new(AggregationMode::Strict)
            .aggregate(&[first, second])
            .expect_err("conflict");
        assert_matches!(
            err,
            RoyaltyError::DuplicateKeyConflict {
                attribute: "rooms",
                ..
            }
        );
    }
}
