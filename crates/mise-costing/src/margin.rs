//! Margin and sell-price arithmetic over a computed cost.
//!
//! All figures are net of VAT: a policy flagged `vat: true` has its
//! sell price divided out by the configured rate before any margin
//! arithmetic, and the reported `sell_price` is that net figure.
//! Ingredient purchase costs are trade prices, already net.

use crate::cost::CostError;
use mise_core::catalog::CostingPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived pricing figures for one recipe. Monetary fields are integer
/// minor currency units; `margin_percent` is rounded to the nearest
/// whole point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginResult {
    pub sell_price: i64,
    pub cost: i64,
    pub margin_percent: i64,
    pub profit: i64,
}

impl fmt::Display for MarginResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sell {}p, cost {}p, profit {}p ({}% margin)",
            self.sell_price, self.cost, self.profit, self.margin_percent
        )
    }
}

/// Compute margin figures for `cost` under the given costing policy.
///
/// `FixedPrice` takes the (net) sell price as given; `TargetMargin`
/// derives `sell = round(cost / (1 − percent/100))`. The policy enum
/// makes "neither a sell price nor a target margin" unrepresentable;
/// the remaining invalid-costing cases — a target margin of 100% or
/// more, a non-positive net sell price, a negative cost — fail with
/// [`CostError::InvalidCosting`].
pub fn compute_margin(
    cost: i64,
    policy: &CostingPolicy,
    vat_rate: f64,
) -> Result<MarginResult, CostError> {
    if cost < 0 {
        return Err(CostError::InvalidCosting {
            reason: format!("cost must not be negative (got {cost})"),
        });
    }

    let net_sell = match *policy {
        CostingPolicy::FixedPrice { sell_price, vat } => {
            let sell = sell_price as f64;
            if vat { sell / (1.0 + vat_rate / 100.0) } else { sell }
        }
        CostingPolicy::TargetMargin { percent, vat: _ } => {
            if percent >= 100.0 {
                return Err(CostError::InvalidCosting {
                    reason: format!("target margin must be below 100% (got {percent}%)"),
                });
            }
            // Derived prices are net by construction; the vat flag only
            // matters when the reporting layer grosses the price back up.
            cost as f64 / (1.0 - percent / 100.0)
        }
    };

    let sell_price = net_sell.round() as i64;
    if sell_price <= 0 {
        return Err(CostError::InvalidCosting {
            reason: format!("sell price must be positive (got {sell_price})"),
        });
    }

    let margin_percent = (100.0 * (sell_price - cost) as f64 / sell_price as f64).round() as i64;
    Ok(MarginResult {
        sell_price,
        cost,
        margin_percent,
        profit: sell_price - cost,
    })
}
