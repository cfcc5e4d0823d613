//! # Policy
//!
//! The numeric knobs of the back office. Loaded from the environment by
//! `tally-service`; defaults match a single-store deployment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::Rate;

/// What a sale does with a coupon that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponPolicy {
    /// Proceed at full price, record no coupon.
    #[default]
    Lenient,
    /// Abort the sale with the coupon's error.
    Strict,
}

impl FromStr for CouponPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(CouponPolicy::Lenient),
            "strict" => Ok(CouponPolicy::Strict),
            other => Err(ValidationError::InvalidFormat {
                field: "coupon_policy".to_string(),
                reason: format!("'{other}' is not one of lenient, strict"),
            }),
        }
    }
}

/// Numeric policy shared by all pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Sales tax. Default 8%.
    pub tax_rate: Rate,

    /// Days between checkout and due date. Default 14.
    pub rental_period_days: i64,

    /// Late fee per day, as a share of the line's daily value. Default 10%.
    pub late_fee_rate: Rate,

    pub coupon_policy: CouponPolicy,

    /// Items at or below this quantity are "low stock". Default 10.
    pub low_stock_threshold: i64,

    /// Items at or below this quantity are "critical". Default 5.
    pub critical_stock_threshold: i64,

    /// Default length of the top-selling report. Default 10.
    pub top_selling_limit: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            tax_rate: Rate::from_bps(800),
            rental_period_days: 14,
            late_fee_rate: Rate::from_bps(1000),
            coupon_policy: CouponPolicy::Lenient,
            low_stock_threshold: 10,
            critical_stock_threshold: 5,
            top_selling_limit: 10,
        }
    }
}

impl Policy {
    pub fn with_tax_rate(mut self, rate: Rate) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_rental_period_days(mut self, days: i64) -> Self {
        self.rental_period_days = days;
        self
    }

    pub fn with_late_fee_rate(mut self, rate: Rate) -> Self {
        self.late_fee_rate = rate;
        self
    }

    pub fn with_coupon_policy(mut self, policy: CouponPolicy) -> Self {
        self.coupon_policy = policy;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}
