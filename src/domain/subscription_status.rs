use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Local mirror of the billing provider's subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    #[default]
    None,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::None => "none",
        }
    }

    /// Owners in these states receive the weekly report.
    pub fn receives_reports(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }

    /// `past_due` keeps access while the provider retries the payment. Any
    /// other state keeps access only until the stored end date.
    pub fn grants_access(&self, end_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            SubscriptionStatus::Active
            | SubscriptionStatus::Trialing
            | SubscriptionStatus::PastDue => true,
            SubscriptionStatus::Canceled | SubscriptionStatus::None => {
                end_date.map(|end| end > now).unwrap_or(false)
            }
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "none" => Ok(SubscriptionStatus::None),
            other => Err(format!("{} is not a known subscription status.", other)),
        }
    }
}
