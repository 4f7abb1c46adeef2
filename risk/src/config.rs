//! Per-user risk limits.

use matchbook::Money;

/// Risk limits applied to one user's orders.
///
/// All monetary limits are [`Money`] values (scale 4). `leverage_limit` is a
/// scale-4 ratio reserved for margin support; the gate does not read it yet,
/// but it is persisted and editable like the rest.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RiskLimits {
    /// Max notional value of a single order
    pub max_order_size: Money,
    /// Max notional value of the projected position after the order
    pub max_position_size: Money,
    /// Max realized loss per UTC day before new orders are refused
    pub max_daily_loss: Money,
    /// Max fills per UTC day
    pub max_daily_trades: u32,
    /// Max simultaneously open (pending or part-filled) orders
    pub max_open_orders: u32,
    /// Max gross leverage ratio (1.0000 = cash account)
    pub leverage_limit: Money,
    /// When false, every order is admitted unchecked
    pub enabled: bool,
}

impl RiskLimits {
    /// Validate the limits. Returns `Err` with a description if any numeric
    /// field is non-positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_order_size <= Money::ZERO {
            return Err(format!(
                "max_order_size must be positive, got {}",
                self.max_order_size
            ));
        }
        if self.max_position_size <= Money::ZERO {
            return Err(format!(
                "max_position_size must be positive, got {}",
                self.max_position_size
            ));
        }
        if self.max_daily_loss <= Money::ZERO {
            return Err(format!(
                "max_daily_loss must be positive, got {}",
                self.max_daily_loss
            ));
        }
        if self.max_daily_trades == 0 {
            return Err("max_daily_trades must be positive".to_string());
        }
        if self.max_open_orders == 0 {
            return Err("max_open_orders must be positive".to_string());
        }
        if self.leverage_limit <= Money::ZERO {
            return Err(format!(
                "leverage_limit must be positive, got {}",
                self.leverage_limit
            ));
        }
        Ok(())
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: Money(5_000_0000),     // 5 000.00
            max_position_size: Money(10_000_0000), // 10 000.00
            max_daily_loss: Money(5_000_0000),     // 5 000.00
            max_daily_trades: 100,
            max_open_orders: 50,
            leverage_limit: Money(1_0000), // 1.0
            enabled: true,
        }
    }
}
