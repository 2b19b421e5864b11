//! The royalty calculation core.
//!
//! A run is a strict one-way pipeline over fully materialized input:
//! normalize → partition → aggregate → site liabilities → title allocation.
//! Everything produced here is read-only once built.

pub mod aggregate;
pub mod allocation;
pub mod liability;
pub mod normalize;

use crate::config::ReportConfig;
use crate::error::RoyaltyResult;
use crate::model::{Partition, RawEventSet};
use crate::partition;
use crate::period::ReportingPeriod;
use aggregate::{AggregateTree, Aggregator};
use allocation::{ScheduleETotals, TitleAllocation, allocate_site};
use liability::{SiteLiability, SiteLiabilityCalculator};
use normalize::Normalizer;

/// Detail rows start below the title, a blank row and the headings.
pub const FIRST_DETAIL_ROW: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteStatement {
    pub territory: String,
    pub site: String,
    pub rooms: i64,
    pub tax_multiplier: f64,
    pub liability: SiteLiability,
    pub titles: Vec<TitleAllocation>,
}

/// Column totals of the detail report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrandTotals {
    pub guaranteed_minimum: f64,
    pub gross_receipts: f64,
    pub net_receipts: f64,
    pub total_due: f64,
    pub allocated_share: f64,
}

/// Everything one Schedule A / Schedule E pair needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub partition: Partition,
    pub sites: Vec<SiteStatement>,
    pub schedule_e: ScheduleETotals,
    pub totals: GrandTotals,
    /// Row right after the last detail row, where the totals go
    pub totals_row: u32,
}

impl Statement {
    pub fn row_count(&self) -> usize {
        self.sites.iter().map(|site| site.titles.len()).sum()
    }
}

/// Compute the statement for one aggregate, laying detail rows out from `first_row`.
pub fn compute_statement(
    tree: &AggregateTree,
    partition: Partition,
    days_in_period: u32,
    first_row: u32,
) -> Statement {
    let calculator = SiteLiabilityCalculator::new(days_in_period);
    let mut sites = Vec::with_capacity(tree.site_count());
    let mut schedule_e = ScheduleETotals::default();
    let mut totals = GrandTotals::default();
    let mut row = first_row;

    for (territory_name, territory) in tree.territories() {
        let tax = territory.tax_multiplier();
        for (site_name, site) in territory.sites() {
            let liability = calculator.compute(site, tax, row);
            let titles = allocate_site(site, tax, &liability);

            totals.guaranteed_minimum += liability.guaranteed_minimum;
            totals.total_due += liability.total_due;
            for title in &titles {
                totals.gross_receipts += title.gross_receipts;
                totals.net_receipts += title.net_receipts;
                totals.allocated_share += title.allocated_share;
                schedule_e.add(&title.title, &title.reference_id, title.allocated_share);
            }

            row = liability.rows.end + 1;
            sites.push(SiteStatement {
                territory: territory_name.to_string(),
                site: site_name.to_string(),
                rooms: site.rooms(),
                tax_multiplier: tax,
                liability,
                titles,
            });
        }
    }

    Statement {
        partition,
        sites,
        schedule_e,
        totals,
        totals_row: row,
    }
}

/// The configured calculation pipeline for one reporting period.
#[derive(Debug, Clone)]
pub struct Engine {
    normalizer: Normalizer,
    aggregator: Aggregator,
    days_in_period: u32,
    split_ferry: bool,
}

impl Engine {
    pub fn new(config: &ReportConfig, period: &ReportingPeriod) -> anyhow::Result<Self> {
        Ok(Self {
            normalizer: Normalizer::new(
                config.tax.default_rate,
                config.shares.clone(),
                &config.providers,
            )?,
            aggregator: Aggregator::new(config.aggregation),
            days_in_period: period.days(&config.calendar),
            split_ferry: config.split_ferry,
        })
    }

    pub fn days_in_period(&self) -> u32 {
        self.days_in_period
    }

    /// Run the whole pipeline. Any malformed record fails the run before
    /// a single statement is produced.
    pub fn run(&self, events: &RawEventSet) -> RoyaltyResult<Vec<Statement>> {
        let normalized = self.normalizer.normalize_all(events)?;
        partition::split(normalized, self.split_ferry)
            .into_iter()
            .map(|(partition, events)| {
                let tree = self.aggregator.aggregate(&events)?;
                let statement =
                    compute_statement(&tree, partition, self.days_in_period, FIRST_DETAIL_ROW);
                tracing::info!(
                    partition = %partition,
                    sites = statement.sites.len(),
                    rows = statement.row_count(),
                    total_due = statement.totals.total_due,
                    "computed statement"
                );
                Ok(statement)
            })
            .collect()
    }
}
