use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Events keyed by the opaque identifier the source assigned them.
pub type RawEventSet = IndexMap<String, RawEventRecord>;

/// One usage event exactly as the source delivered it. Values may be
/// strings, numbers or booleans depending on the upstream variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventRecord {
    pub territory: Option<Value>,
    pub vat: Option<Value>,
    pub site: Option<Value>,
    pub rooms: Option<Value>,
    pub title: Option<Value>,
    pub provider_ref: Option<Value>,
    pub views: Option<Value>,
    pub stg: Option<Value>,
    pub charge_rate: Option<Value>,
    pub company: Option<Value>,
    /// Older feeds name the provider tag `type`
    #[serde(rename = "type")]
    pub provider_type: Option<Value>,
    pub nominated: Option<Value>,
    pub ntrdate: Option<Value>,
    pub class: Option<Value>,
    pub ferry: Option<Value>,
}

impl RawEventRecord {
    /// Build a record from header/value pairs of a delimited file. Empty
    /// cells are treated as absent.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = RawEventRecord::default();
        for (name, raw) in pairs {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value = Some(Value::String(raw.to_string()));
            match name.trim().to_ascii_lowercase().as_str() {
                "territory" => record.territory = value,
                "vat" => record.vat = value,
                "site" => record.site = value,
                "rooms" => record.rooms = value,
                "title" => record.title = value,
                "provider_ref" => record.provider_ref = value,
                "views" => record.views = value,
                "stg" => record.stg = value,
                "charge_rate" => record.charge_rate = value,
                "company" => record.company = value,
                "type" => record.provider_type = value,
                "nominated" => record.nominated = value,
                "ntrdate" => record.ntrdate = value,
                "class" => record.class = value,
                "ferry" => record.ferry = value,
                _ => {}
            }
        }
        record
    }

    /// The provider tag, preferring `company` over `type` when both are sent.
    pub fn provider_tag(&self) -> Option<&Value> {
        self.company.as_ref().or(self.provider_type.as_ref())
    }
}

/// How a site's total due is derived from its guarantee and net receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum PaymentPolicy {
    /// Guarantee is added on top of net receipts
    #[strum(serialize = "Hybrid")]
    Hybrid,
    /// Only net receipts are due; the guarantee is informational
    #[strum(serialize = "Guest to Pay")]
    GuestToPay,
    /// The larger of guarantee and net receipts
    #[strum(serialize = "Guarantee Floor")]
    GuaranteeFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum AgeClass {
    Current,
    Library,
    #[strum(serialize = "")]
    Unspecified,
}

/// Report split applied before aggregation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
pub enum Partition {
    Ferry,
    Other,
    All,
}

/// A canonical, validated usage event.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub territory: String,
    /// Consumption-tax percentage, already defaulted
    pub tax_rate: f64,
    pub site: String,
    pub rooms: i64,
    pub title: String,
    pub reference_id: String,
    pub plays: i64,
    /// Per-play charge to the guest in major currency units
    pub guest_charge: f64,
    /// Pence per room per day
    pub rate: f64,
    /// Revenue share percentage (e.g. 40 or 50)
    pub share_pct: f64,
    pub hybrid: bool,
    pub policy: PaymentPolicy,
    /// Label of the provider rule that matched, if any
    pub provider_label: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub age_class: AgeClass,
    pub partition: Partition,
}

impl UsageEvent {
    pub fn tax_multiplier(&self) -> f64 {
        1.0 + self.tax_rate / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_accepts_type_alias_and_mixed_value_kinds() {
        let record: RawEventRecord = serde_json::from_value(json!({
            "territory": "United Kingdom",
            "vat": 20,
            "rooms": "60",
            "type": "airtime",
            "ferry": true,
            "unknown": "ignored"
        }))
        .expect("record");
        assert_eq!(record.provider_tag(), Some(&json!("airtime")));
        assert_eq!(record.vat, Some(json!(20)));
        assert_eq!(record.ferry, Some(json!(true)));
        assert!(record.site.is_none());
    }

    #[test]
    fn company_wins_when_both_provider_keys_are_sent() {
        let record: RawEventRecord = serde_json::from_value(json!({
            "company": "airtime",
            "type": "airwave"
        }))
        .expect("record with both keys");
        assert_eq!(record.provider_tag(), Some(&json!("airtime")));
        assert_eq!(record.provider_type, Some(json!("airwave")));

        let pairs = RawEventRecord::from_pairs([("type", "airwave"), ("company", "airtime")]);
        assert_eq!(pairs.provider_tag(), Some(&json!("airtime")));
    }

    #[test]
    fn from_pairs_skips_blank_cells() {
        let record =
            RawEventRecord::from_pairs([("Territory", "UK"), ("vat", " "), ("TYPE", "airwave")]);
        assert_eq!(record.territory, Some(json!("UK")));
        assert!(record.vat.is_none());
        assert_eq!(record.provider_tag(), Some(&json!("airwave")));
    }

    #[test]
    fn policy_labels() {
        assert_eq!(PaymentPolicy::GuestToPay.to_string(), "Guest to Pay");
        assert_eq!(PaymentPolicy::Hybrid.to_string(), "Hybrid");
        assert_eq!(AgeClass::Unspecified.to_string(), "");
    }
}
