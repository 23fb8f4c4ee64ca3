//! Typed view over the structured `device_license` record.
//!
//! The driver publishes the license as JSON inside its state channel.  The
//! raw value is passed through untouched; this module decodes the parts the
//! control surface needs to decide whether a supporter-tier feature is usable
//! and how long a trial has left.
//!
//! All timestamps are seconds since the Unix epoch.  A missing `endDate`
//! means "never expires".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::control::SUPPORTER_TIER_FEATURES;

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
/// Remaining time is only worth mentioning below this many days.
const END_DATE_WARN_DAYS: i64 = 30;
/// Below this many hours the remaining time is shown in hours.
const END_DATE_WARN_HOURS: i64 = 24;

/// Entitlement state of one feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    #[default]
    Off,
    Trial,
    On,
}

/// Billing period of a supporter tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierPeriod {
    Monthly,
    Yearly,
    Lifetime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseFeature {
    #[serde(default)]
    pub status: FeatureStatus,
    #[serde(default)]
    pub end_date: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseTier {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub end_date: Option<i64>,
    #[serde(default)]
    pub period: Option<TierPeriod>,
    /// Funds needed to renew or upgrade, keyed by period.
    #[serde(default)]
    pub funds_needed_by_period: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub hardware_id: String,
    #[serde(default)]
    pub confirmed_token: Option<bool>,
    #[serde(default)]
    pub tiers: BTreeMap<String, LicenseTier>,
    #[serde(default)]
    pub features: BTreeMap<String, LicenseFeature>,
}

impl License {
    /// Decodes a license record.  An empty object (no license yet) is `None`
    /// without a warning; any other mismatch is logged.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.as_object().map_or(true, |map| map.is_empty()) {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(license) => Some(license),
            Err(e) => {
                warn!("device license has an unexpected shape: {e}");
                None
            }
        }
    }

    /// Name of the currently active tier, if any.
    pub fn active_tier(&self) -> Option<&str> {
        self.tiers
            .iter()
            .find(|(_, tier)| tier.active)
            .map(|(name, _)| name.as_str())
    }
}

/// Returns `true` when `feature` is on or in trial and has not expired.
pub fn feature_enabled(license: Option<&License>, feature: &str, now_secs: i64) -> bool {
    let Some(feature) = license.and_then(|l| l.features.get(feature)) else {
        return false;
    };
    let active = matches!(feature.status, FeatureStatus::On | FeatureStatus::Trial);
    active && feature.end_date.map_or(true, |end| end > now_secs)
}

/// Seconds until the earliest unexpired trial among supporter-tier features.
pub fn trial_time_remaining(license: Option<&License>, now_secs: i64) -> Option<i64> {
    let license = license?;
    license
        .features
        .iter()
        .filter(|(name, _)| SUPPORTER_TIER_FEATURES.iter().any(|f| *f == name.as_str()))
        .filter(|(_, feature)| feature.status == FeatureStatus::Trial)
        .filter_map(|(_, feature)| feature.end_date)
        .filter(|end| *end >= now_secs)
        .min()
        .map(|end| end - now_secs)
}

/// Short human text for a remaining duration, or `None` when it is too far
/// away (30 days or more) or not positive.
pub fn time_remaining_text(seconds: i64) -> Option<String> {
    if seconds <= 0 {
        return None;
    }
    if seconds < SECONDS_PER_HOUR {
        return Some("less than an hour".to_string());
    }

    let hours = seconds / SECONDS_PER_HOUR;
    if hours < END_DATE_WARN_HOURS {
        return Some(if hours == 1 { "1 hour".to_string() } else { format!("{hours} hours") });
    }

    let days = seconds / SECONDS_PER_DAY;
    if days < END_DATE_WARN_DAYS {
        return Some(if days == 1 { "1 day".to_string() } else { format!("{days} days") });
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn sample_license() -> License {
        License::from_value(&json!({
            "hardwareId": "hw-1",
            "confirmedToken": true,
            "tiers": {
                "supporter": { "active": true, "endDate": NOW + 10 * SECONDS_PER_DAY, "period": "monthly" }
            },
            "features": {
                "sbs": { "status": "trial", "endDate": NOW + 2 * SECONDS_PER_HOUR },
                "smooth_follow": { "status": "trial", "endDate": NOW + 3 * SECONDS_PER_DAY },
                "expired": { "status": "on", "endDate": NOW - 1 },
                "forever": { "status": "on" }
            }
        }))
        .expect("license must decode")
    }

    #[test]
    fn test_from_value_decodes_camel_case_fields() {
        let license = sample_license();
        assert_eq!(license.hardware_id, "hw-1");
        assert_eq!(license.confirmed_token, Some(true));
        assert_eq!(license.active_tier(), Some("supporter"));
        assert_eq!(license.tiers["supporter"].period, Some(TierPeriod::Monthly));
    }

    #[test]
    fn test_from_value_empty_object_is_none() {
        assert_eq!(License::from_value(&json!({})), None);
    }

    #[test]
    fn test_from_value_wrong_shape_is_none() {
        assert_eq!(License::from_value(&json!({ "features": 3 })), None);
    }

    #[test]
    fn test_feature_enabled_respects_status_and_expiry() {
        let license = sample_license();
        assert!(feature_enabled(Some(&license), "sbs", NOW));
        assert!(feature_enabled(Some(&license), "forever", NOW));
        assert!(!feature_enabled(Some(&license), "expired", NOW));
        assert!(!feature_enabled(Some(&license), "missing", NOW));
        assert!(!feature_enabled(None, "sbs", NOW));
    }

    #[test]
    fn test_trial_time_remaining_picks_earliest_trial() {
        let license = sample_license();
        assert_eq!(trial_time_remaining(Some(&license), NOW), Some(2 * SECONDS_PER_HOUR));
    }

    #[test]
    fn test_trial_time_remaining_without_trials_is_none() {
        let license = License { hardware_id: "x".into(), ..License::default() };
        assert_eq!(trial_time_remaining(Some(&license), NOW), None);
    }

    #[test]
    fn test_time_remaining_text_buckets() {
        assert_eq!(time_remaining_text(0), None);
        assert_eq!(time_remaining_text(59 * 60).as_deref(), Some("less than an hour"));
        assert_eq!(time_remaining_text(SECONDS_PER_HOUR).as_deref(), Some("1 hour"));
        assert_eq!(time_remaining_text(5 * SECONDS_PER_HOUR).as_deref(), Some("5 hours"));
        assert_eq!(time_remaining_text(SECONDS_PER_DAY).as_deref(), Some("1 day"));
        assert_eq!(time_remaining_text(12 * SECONDS_PER_DAY).as_deref(), Some("12 days"));
        assert_eq!(time_remaining_text(45 * SECONDS_PER_DAY), None);
    }
}
