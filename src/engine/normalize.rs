//! Raw record validation and coercion.
//!
//! Every field is coerced once here, including the payment policy, so the
//! later passes only ever see typed values.

use crate::config::{ProviderRule, ShareSettings};
use crate::error::{RoyaltyError, RoyaltyResult};
use crate::model::{AgeClass, Partition, PaymentPolicy, RawEventRecord, RawEventSet, UsageEvent};
use anyhow::Context;
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Release dates arrive as `DD/MM/YY`.
pub const RELEASE_DATE_FORMAT: &str = "%d/%m/%y";

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Regex,
    label: String,
    default_rate: f64,
    hybrid_sentinel: String,
}

/// Outcome of matching a provider tag against the rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyResolution {
    pub policy: PaymentPolicy,
    pub hybrid: bool,
    /// Rate override from the matching rule
    pub rate_override: Option<f64>,
    pub label: Option<String>,
}

impl PolicyResolution {
    fn guarantee_floor() -> Self {
        Self {
            policy: PaymentPolicy::GuaranteeFloor,
            hybrid: false,
            rate_override: None,
            label: None,
        }
    }

    pub fn is_provider_rule(&self) -> bool {
        self.label.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    default_tax_rate: f64,
    shares: ShareSettings,
    rules: Vec<CompiledRule>,
}

impl Normalizer {
    pub fn new(
        default_tax_rate: f64,
        shares: ShareSettings,
        providers: &[ProviderRule],
    ) -> anyhow::Result<Self> {
        let rules = providers
            .iter()
            .map(|rule| {
                let pattern = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid provider pattern {:?}", rule.pattern))?;
                Ok(CompiledRule {
                    pattern,
                    label: rule.label.clone(),
                    default_rate: rule.default_rate,
                    hybrid_sentinel: rule.hybrid_sentinel.trim().to_string(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            default_tax_rate,
            shares,
            rules,
        })
    }

    /// Map a provider tag to its policy. Unrecognized tags fall back to the
    /// guarantee floor.
    pub fn resolve_policy(&self, tag: &str, raw_rate: Option<&Value>) -> PolicyResolution {
        let Some(rule) = self.rules.iter().find(|rule| rule.pattern.is_match(tag)) else {
            return PolicyResolution::guarantee_floor();
        };
        let hybrid = raw_rate
            .and_then(text)
            .is_some_and(|raw| matches_sentinel(&raw, &rule.hybrid_sentinel));
        PolicyResolution {
            policy: if hybrid {
                PaymentPolicy::Hybrid
            } else {
                PaymentPolicy::GuestToPay
            },
            hybrid,
            rate_override: Some(rule.default_rate),
            label: Some(rule.label.clone()),
        }
    }

    pub fn normalize(&self, key: &str, raw: &RawEventRecord) -> RoyaltyResult<UsageEvent> {
        let territory = required_text(key, "territory", raw.territory.as_ref())?;
        let site = required_text(key, "site", raw.site.as_ref())?;
        let title = required_text(key, "title", raw.title.as_ref())?;

        let tax_rate = raw
            .vat
            .as_ref()
            .and_then(lenient_decimal)
            .unwrap_or(self.default_tax_rate);

        let rooms = non_negative(key, "rooms", raw.rooms.as_ref())?;
        let plays = non_negative(key, "views", raw.views.as_ref())?;
        let guest_minor = non_negative(key, "stg", raw.stg.as_ref())?;

        let tag = raw.provider_tag().and_then(text).unwrap_or_default();
        let resolution = self.resolve_policy(&tag, raw.charge_rate.as_ref());
        let rate = match resolution.rate_override {
            Some(rate) => rate,
            None => decimal(key, "charge_rate", raw.charge_rate.as_ref())?,
        };

        let nominated = raw.nominated.as_ref().is_some_and(flag);
        let share_pct = if nominated || resolution.is_provider_rule() {
            self.shares.nominated
        } else {
            self.shares.standard
        };

        let release_date = match raw.ntrdate.as_ref().and_then(text) {
            Some(raw_date) => Some(
                NaiveDate::parse_from_str(&raw_date, RELEASE_DATE_FORMAT).map_err(|_| {
                    RoyaltyError::malformed(
                        key,
                        "ntrdate",
                        format!("is not a DD/MM/YY date: {raw_date:?}"),
                    )
                })?,
            ),
            None => None,
        };

        let age_class = match raw.class.as_ref().and_then(text) {
            None => AgeClass::Unspecified,
            Some(class) if class.eq_ignore_ascii_case("current") => AgeClass::Current,
            Some(class) if class.eq_ignore_ascii_case("library") => AgeClass::Library,
            Some(other) => {
                return Err(RoyaltyError::malformed(
                    key,
                    "class",
                    format!("must be Current or Library, got {other:?}"),
                ));
            }
        };

        let partition = if raw.ferry.as_ref().is_some_and(flag) {
            Partition::Ferry
        } else {
            Partition::Other
        };

        Ok(UsageEvent {
            territory,
            tax_rate,
            site,
            rooms,
            title,
            reference_id: raw
                .provider_ref
                .as_ref()
                .and_then(text)
                .unwrap_or_default(),
            plays,
            guest_charge: guest_minor as f64 / 100.0,
            rate,
            share_pct,
            hybrid: resolution.hybrid,
            policy: resolution.policy,
            provider_label: resolution.label,
            release_date,
            age_class,
            partition,
        })
    }

    /// Normalize a whole event set. The first malformed record aborts the run.
    pub fn normalize_all(&self, events: &RawEventSet) -> RoyaltyResult<Vec<UsageEvent>> {
        let normalized = events
            .iter()
            .map(|(key, raw)| self.normalize(key, raw))
            .collect::<RoyaltyResult<Vec<_>>>()?;
        tracing::debug!(events = normalized.len(), "normalized usage events");
        Ok(normalized)
    }
}

fn matches_sentinel(raw: &str, sentinel: &str) -> bool {
    if raw == sentinel {
        return true;
    }
    match (raw.parse::<f64>(), sentinel.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Textual form of a scalar value. Null and compound values have none.
fn text(value: &Value) -> Option<String> {
    let out = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if out.is_empty() { None } else { Some(out) }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn required_text(key: &str, field: &'static str, value: Option<&Value>) -> RoyaltyResult<String> {
    value
        .and_then(text)
        .ok_or_else(|| RoyaltyError::malformed(key, field, "is missing or empty"))
}

fn lenient_decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn decimal(key: &str, field: &'static str, value: Option<&Value>) -> RoyaltyResult<f64> {
    let value = value.ok_or_else(|| RoyaltyError::malformed(key, field, "is missing"))?;
    lenient_decimal(value)
        .ok_or_else(|| RoyaltyError::malformed(key, field, format!("is not a number: {value}")))
}

/// Integers truncate toward zero, so `"4.9"` reads as 4.
fn integer(key: &str, field: &'static str, value: Option<&Value>) -> RoyaltyResult<i64> {
    let value = value.ok_or_else(|| RoyaltyError::malformed(key, field, "is missing"))?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(f64::trunc).map(|v| v as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
        }
        _ => None,
    };
    parsed.ok_or_else(|| RoyaltyError::malformed(key, field, format!("is not an integer: {value}")))
}

/// Counts and charges. Negative values would let title nets cancel out.
fn non_negative(key: &str, field: &'static str, value: Option<&Value>) -> RoyaltyResult<i64> {
    let parsed = integer(key, field, value)?;
    if parsed < 0 {
        return Err(RoyaltyError::malformed(
            key,
            field,
            format!("must not be negative, got {parsed}"),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        let config = ReportConfig::default();
        Normalizer::new(config.tax.default_rate, config.shares, &config.providers)
            .expect("normalizer")
    }

    fn record(value: Value) -> RawEventRecord {
        serde_json::from_value(value).expect("record")
    }

    fn base() -> Value {
        json!({
            "territory": "United Kingdom",
            "vat": "20",
            "site": "Athena Hotel",
            "rooms": "60",
            "title": "Big Miracle",
            "provider_ref": "12345678",
            "views": "8",
            "stg": "450",
            "charge_rate": "3.2",
            "company": "airwave",
            "nominated": "false",
            "ntrdate": "20/10/16",
            "class": "Library",
            "ferry": "false"
        })
    }

    #[test]
    fn coerces_standard_event() {
        let event = normalizer()
            .normalize("k1", &record(base()))
            .expect("event");
        assert_eq!(event.rooms, 60);
        assert_eq!(event.plays, 8);
        assert_eq!(event.guest_charge, 4.5);
        assert_eq!(event.rate, 3.2);
        assert_eq!(event.share_pct, 40.0);
        assert_eq!(event.tax_multiplier(), 1.2);
        assert_eq!(event.policy, PaymentPolicy::GuaranteeFloor);
        assert!(event.provider_label.is_none());
        assert_eq!(event.age_class, AgeClass::Library);
        assert_eq!(event.partition, Partition::Other);
        assert_eq!(
            event.release_date,
            NaiveDate::from_ymd_opt(2016, 10, 20)
        );
    }

    #[test]
    fn missing_or_bad_vat_uses_default() {
        let mut raw = base();
        raw["vat"] = json!("undefined");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.tax_rate, 20.0);

        let mut raw = base();
        raw.as_object_mut().expect("object").remove("vat");
        raw["ferry"] = json!(true);
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.tax_rate, 20.0);
        assert_eq!(event.partition, Partition::Ferry);
    }

    #[test]
    fn provider_rule_overrides_rate_and_share() {
        let mut raw = base();
        raw["company"] = json!("AirTime");
        raw["charge_rate"] = json!("1");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.policy, PaymentPolicy::Hybrid);
        assert!(event.hybrid);
        assert_eq!(event.rate, 4.17);
        assert_eq!(event.share_pct, 50.0);
        assert_eq!(event.provider_label.as_deref(), Some("Airtime"));

        let mut raw = base();
        raw["company"] = json!("airtime");
        raw["charge_rate"] = json!("0");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.policy, PaymentPolicy::GuestToPay);
        assert!(!event.hybrid);
    }

    #[test]
    fn provider_rule_does_not_need_charge_rate() {
        let mut raw = base();
        raw["company"] = json!("airtime");
        raw.as_object_mut().expect("object").remove("charge_rate");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.policy, PaymentPolicy::GuestToPay);
        assert_eq!(event.rate, 4.17);
    }

    #[test]
    fn nominated_flag_selects_premium_share() {
        let mut raw = base();
        raw["nominated"] = json!("true");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.share_pct, 50.0);
    }

    #[test]
    fn unknown_provider_is_guarantee_floor() {
        let mut raw = base();
        raw["company"] = json!("somebody-else");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.policy, PaymentPolicy::GuaranteeFloor);

        let mut raw = base();
        raw.as_object_mut().expect("object").remove("company");
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.policy, PaymentPolicy::GuaranteeFloor);
    }

    #[test]
    fn integers_truncate_like_parse_int() {
        let mut raw = base();
        raw["views"] = json!("7.9");
        raw["rooms"] = json!(12);
        let event = normalizer().normalize("k", &record(raw)).expect("event");
        assert_eq!(event.plays, 7);
        assert_eq!(event.rooms, 12);
    }

    #[test]
    fn malformed_fields_are_named() {
        let cases = [
            ("views", json!("many")),
            ("rooms", json!(null)),
            ("stg", json!("four pounds")),
            ("charge_rate", json!("n/a")),
            ("ntrdate", json!("2016-10-20")),
            ("class", json!("Vintage")),
            ("title", json!("   ")),
        ];
        for (field, value) in cases {
            let mut raw = base();
            raw[field] = value;
            let err = normalizer()
                .normalize("evt", &record(raw))
                .expect_err(field);
            assert_eq!(err.field(), Some(field), "{err}");
        }
    }

    #[test]
    fn negative_counts_and_charges_are_rejected() {
        for field in ["rooms", "views", "stg"] {
            let mut raw = base();
            raw[field] = json!("-10");
            let err = normalizer()
                .normalize("evt", &record(raw))
                .expect_err(field);
            assert_eq!(err.field(), Some(field), "{err}");
            assert!(err.to_string().contains("must not be negative"), "{err}");
        }

        let mut raw = base();
        raw["views"] = json!("0");
        raw["stg"] = json!(0);
        let event = normalizer().normalize("k", &record(raw)).expect("zero is fine");
        assert_eq!(event.plays, 0);
    }

    #[test]
    fn normalize_all_stops_at_first_bad_record() {
        let mut events = RawEventSet::new();
        events.insert("good".to_string(), record(base()));
        let mut bad = base();
        bad["views"] = json!("x");
        events.insert("bad".to_string(), record(bad));
        let err = normalizer().normalize_all(&events).expect_err("bad record");
        assert!(err.to_string().contains("'bad'"));
    }
}
