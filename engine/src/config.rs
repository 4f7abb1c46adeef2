//! Engine configuration: defaults seeded on a user's first activity.

use matchbook::Money;
use matchbook_risk::RiskLimits;

/// Engine-wide defaults.
///
/// A portfolio and a risk-limit row are created from these the first time a
/// user touches the engine; both can be edited afterwards.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Cash (and initial buying power) seeded into a new portfolio
    pub initial_cash: Money,
    /// Risk limits applied to users without an explicit row
    pub default_limits: RiskLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: Money(100_000_0000), // 100 000.00
            default_limits: RiskLimits::default(),
        }
    }
}
