//! Per-record engineered features.
//!
//! Every column is a pure function of one [`Record`]; [`derive`] evaluates
//! them all in a single pass into a [`FeatureRow`].

use serde::{Deserialize, Serialize};

use crate::algo::markup;
use crate::config::TextSource;
use crate::record::{Record, TicketType};

/// Fallback `caps_proportion` for an empty description (training-set mean).
pub const CAPS_PROPORTION_FALLBACK: f64 = 0.045;

/// Sentinel for a missing `delivery_method`, kept as its own category.
pub const DELIVERY_METHOD_UNKNOWN: f64 = 10.0;

/// Countries whose historical fraud rate was more than one standard deviation
/// above the mean.
pub const HIGH_FRAUD_COUNTRIES: [&str; 31] = [
    "A1", "AR", "BG", "CH", "CI", "CM", "CN", "CO", "CZ", "DE", "DK", "DZ", "FI", "HR", "ID", "IL",
    "JE", "JM", "KH", "MA", "MY", "NA", "NG", "PH", "PK", "PR", "PS", "QA", "RU", "TR", "VN",
];

/// Column names in matrix order. Must stay in step with [`FeatureRow::to_vec`].
pub const FEATURE_NAMES: [&str; 23] = [
    "has_previous_payouts",
    "gts_is_0",
    "gts_less_10",
    "gts_less_25",
    "venue_outside_user_country",
    "num_tix_total",
    "num_tix_sold_by_event",
    "num_payouts",
    "email_gmail",
    "email_yahoo",
    "email_hotmail",
    "email_aol",
    "email_com",
    "email_org",
    "email_edu",
    "approx_payout_date",
    "sale_duration2",
    "num_order",
    "body_length",
    "high_fraud_country",
    "exclamation_points",
    "caps_proportion",
    "delivery_method",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub has_previous_payouts: u8,
    pub gts_is_0: u8,
    pub gts_less_10: u8,
    pub gts_less_25: u8,
    pub venue_outside_user_country: u8,
    pub num_tix_total: f64,
    pub num_tix_sold_by_event: f64,
    pub num_payouts: usize,
    pub email_gmail: u8,
    pub email_yahoo: u8,
    pub email_hotmail: u8,
    pub email_aol: u8,
    pub email_com: u8,
    pub email_org: u8,
    pub email_edu: u8,
    pub approx_payout_date: f64,
    pub sale_duration2: f64,
    pub num_order: f64,
    pub body_length: f64,
    pub high_fraud_country: u8,
    pub exclamation_points: usize,
    pub caps_proportion: f64,
    pub delivery_method: f64,
}

impl FeatureRow {
    /// Numeric values in [`FEATURE_NAMES`] order.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.has_previous_payouts),
            f64::from(self.gts_is_0),
            f64::from(self.gts_less_10),
            f64::from(self.gts_less_25),
            f64::from(self.venue_outside_user_country),
            self.num_tix_total,
            self.num_tix_sold_by_event,
            self.num_payouts as f64,
            f64::from(self.email_gmail),
            f64::from(self.email_yahoo),
            f64::from(self.email_hotmail),
            f64::from(self.email_aol),
            f64::from(self.email_com),
            f64::from(self.email_org),
            f64::from(self.email_edu),
            self.approx_payout_date,
            self.sale_duration2,
            self.num_order,
            self.body_length,
            f64::from(self.high_fraud_country),
            self.exclamation_points as f64,
            self.caps_proportion,
            self.delivery_method,
        ]
    }
}

/// Derive every engineered column for one record.
pub fn derive(record: &Record, text_source: TextSource) -> FeatureRow {
    let stats_text = match text_source {
        TextSource::Raw => record.description.clone(),
        TextSource::Normalized => markup::strip_markup(&record.description),
    };
    let domain = record.email_domain.as_str();

    FeatureRow {
        has_previous_payouts: flag(!record.previous_payouts.is_empty()),
        gts_is_0: flag(record.gts == 0.0),
        gts_less_10: flag(record.gts > 0.0 && record.gts < 10.0),
        gts_less_25: flag(record.gts > 10.0 && record.gts < 25.0),
        // A missing country on either side counts as outside.
        venue_outside_user_country: flag(match (&record.venue_country, &record.country) {
            (Some(venue), Some(user)) => venue != user,
            _ => true,
        }),
        num_tix_total: sum_tickets(&record.ticket_types, |t| t.quantity_total),
        num_tix_sold_by_event: sum_tickets(&record.ticket_types, |t| t.quantity_sold),
        num_payouts: record.previous_payouts.len(),
        email_gmail: flag(domain == "gmail.com"),
        email_yahoo: flag(domain == "yahoo.com"),
        email_hotmail: flag(domain == "hotmail.com"),
        email_aol: flag(domain == "aol.com"),
        email_com: flag(domain.ends_with("com")),
        email_org: flag(domain.ends_with("org")),
        email_edu: flag(domain.ends_with("edu")),
        approx_payout_date: record.approx_payout_date,
        sale_duration2: record.sale_duration2.unwrap_or(0.0),
        num_order: record.num_order,
        body_length: record.body_length,
        high_fraud_country: flag(is_high_fraud_country(record.country.as_deref())),
        exclamation_points: exclamation_points(&stats_text),
        caps_proportion: caps_proportion(&stats_text),
        delivery_method: record.delivery_method.unwrap_or(DELIVERY_METHOD_UNKNOWN),
    }
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

pub fn sum_tickets(tickets: &[TicketType], field: impl Fn(&TicketType) -> f64) -> f64 {
    tickets.iter().map(field).sum()
}

pub fn is_high_fraud_country(country: Option<&str>) -> bool {
    country.is_some_and(|c| HIGH_FRAUD_COUNTRIES.contains(&c))
}

pub fn exclamation_points(text: &str) -> usize {
    text.chars().filter(|&c| c == '!').count()
}

/// Share of characters that are ASCII uppercase letters. Spaces and
/// punctuation count toward the total.
pub fn caps_proportion(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return CAPS_PROPORTION_FALLBACK;
    }
    let upper = text.chars().filter(char::is_ascii_uppercase).count();
    upper as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record() -> Record {
        Record {
            description: String::new(),
            org_desc: String::new(),
            country: Some("US".into()),
            venue_country: Some("US".into()),
            gts: 0.0,
            previous_payouts: vec![],
            ticket_types: vec![],
            email_domain: "gmail.com".into(),
            delivery_method: Some(1.0),
            approx_payout_date: 0.0,
            sale_duration2: Some(0.0),
            num_order: 0.0,
            body_length: 0.0,
            acct_type: None,
        }
    }

    fn with_gts(gts: f64) -> FeatureRow {
        derive(&Record { gts, ..record() }, TextSource::Raw)
    }

    #[test]
    fn gts_bins() {
        let r = with_gts(0.0);
        assert_eq!((r.gts_is_0, r.gts_less_10, r.gts_less_25), (1, 0, 0));
        let r = with_gts(5.0);
        assert_eq!((r.gts_is_0, r.gts_less_10, r.gts_less_25), (0, 1, 0));
        let r = with_gts(15.0);
        assert_eq!((r.gts_is_0, r.gts_less_10, r.gts_less_25), (0, 0, 1));
    }

    #[test]
    fn gts_bin_gaps_at_boundaries() {
        for gts in [10.0, 25.0, 100.0] {
            let r = with_gts(gts);
            assert_eq!((r.gts_is_0, r.gts_less_10, r.gts_less_25), (0, 0, 0), "gts={gts}");
        }
    }

    #[test]
    fn empty_sequences_give_zero_aggregates() {
        let r = derive(&record(), TextSource::Raw);
        assert_eq!(r.num_tix_total, 0.0);
        assert_eq!(r.num_tix_sold_by_event, 0.0);
        assert_eq!(r.num_payouts, 0);
        assert_eq!(r.has_previous_payouts, 0);
    }

    #[test]
    fn ticket_and_payout_aggregates() {
        let rec = Record {
            ticket_types: vec![
                TicketType { quantity_total: 100.0, quantity_sold: 40.0 },
                TicketType { quantity_total: 50.0, quantity_sold: 5.0 },
            ],
            previous_payouts: vec![serde_json::json!({"amount": 10}), serde_json::json!({})],
            ..record()
        };
        let r = derive(&rec, TextSource::Raw);
        assert_eq!(r.num_tix_total, 150.0);
        assert_eq!(r.num_tix_sold_by_event, 45.0);
        assert_eq!(r.num_payouts, 2);
        assert_eq!(r.has_previous_payouts, 1);
    }

    #[test]
    fn email_flags_gmail() {
        let r = derive(&record(), TextSource::Raw);
        assert_eq!(
            (r.email_gmail, r.email_yahoo, r.email_hotmail, r.email_aol),
            (1, 0, 0, 0)
        );
        assert_eq!((r.email_com, r.email_org, r.email_edu), (1, 0, 0));
    }

    #[test]
    fn email_suffix_flags_and_short_domains() {
        let r = derive(&Record { email_domain: "mit.edu".into(), ..record() }, TextSource::Raw);
        assert_eq!((r.email_com, r.email_org, r.email_edu), (0, 0, 1));
        let r = derive(&Record { email_domain: "x".into(), ..record() }, TextSource::Raw);
        assert_eq!((r.email_com, r.email_org, r.email_edu), (0, 0, 0));
        let r = derive(&Record { email_domain: String::new(), ..record() }, TextSource::Raw);
        assert_eq!(r.email_gmail, 0);
    }

    #[test]
    fn country_features() {
        let rec = Record {
            country: Some("NG".into()),
            venue_country: Some("GB".into()),
            ..record()
        };
        let r = derive(&rec, TextSource::Raw);
        assert_eq!(r.high_fraud_country, 1);
        assert_eq!(r.venue_outside_user_country, 1);

        let r = derive(&record(), TextSource::Raw);
        assert_eq!(r.high_fraud_country, 0);
        assert_eq!(r.venue_outside_user_country, 0);

        let r = derive(&Record { venue_country: None, ..record() }, TextSource::Raw);
        assert_eq!(r.venue_outside_user_country, 1);
        let r = derive(&Record { country: None, ..record() }, TextSource::Raw);
        assert_eq!(r.venue_outside_user_country, 1);
        let r = derive(
            &Record {
                country: None,
                venue_country: None,
                ..record()
            },
            TextSource::Raw,
        );
        assert_eq!(r.venue_outside_user_country, 1);
        assert!(!is_high_fraud_country(None));
    }

    #[test]
    fn caps_proportion_cases() {
        assert_eq!(caps_proportion(""), 0.045);
        assert_eq!(caps_proportion("ABC"), 1.0);
        assert_eq!(caps_proportion("abc"), 0.0);
    }

    #[test]
    fn shouting_description() {
        let rec = Record { description: "WOW!!! AMAZING!!".into(), ..record() };
        let r = derive(&rec, TextSource::Raw);
        assert_eq!(r.exclamation_points, 5);
        // 10 uppercase letters over 16 characters
        assert_eq!(r.caps_proportion, 10.0 / 16.0);
    }

    #[test]
    fn text_source_changes_stats() {
        let rec = Record { description: "<B>Hi!</B>".into(), ..record() };
        let raw = derive(&rec, TextSource::Raw);
        let norm = derive(&rec, TextSource::Normalized);
        assert_eq!(raw.caps_proportion, 3.0 / 10.0);
        assert_eq!(norm.caps_proportion, 1.0 / 3.0);
        assert_eq!(raw.exclamation_points, 1);
        assert_eq!(norm.exclamation_points, 1);
    }

    #[test]
    fn null_delivery_method_sentinel() {
        let r = derive(&Record { delivery_method: None, ..record() }, TextSource::Raw);
        assert_eq!(r.delivery_method, DELIVERY_METHOD_UNKNOWN);
        let r = derive(&record(), TextSource::Raw);
        assert_eq!(r.delivery_method, 1.0);
    }

    #[test]
    fn vector_matches_names() {
        let r = derive(&record(), TextSource::Raw);
        let v = r.to_vec();
        assert_eq!(v.len(), FEATURE_NAMES.len());
        let idx = FEATURE_NAMES.iter().position(|&n| n == "delivery_method").unwrap();
        assert_eq!(v[idx], 1.0);
        let idx = FEATURE_NAMES.iter().position(|&n| n == "caps_proportion").unwrap();
        assert_eq!(v[idx], CAPS_PROPORTION_FALLBACK);
    }

    proptest! {
        #[test]
        fn gts_bins_never_overlap(gts in -5.0f64..100.0) {
            let r = with_gts(gts);
            prop_assert!(r.gts_is_0 + r.gts_less_10 + r.gts_less_25 <= 1);
        }

        #[test]
        fn caps_proportion_in_unit_interval(s in "\\PC{1,40}") {
            let p = caps_proportion(&s);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
