//! Objective variants for the dispatch model.
//!
//! | Variant | Feed-in weight | Discharge cost |
//! |---------|----------------|----------------|
//! | `SubstationPower` | 1 | - |
//! | `SubstationPowerWithDischargeCost` | 1 | yes |
//! | `CostMinimize` | price | - |
//! | `CostMinimizeWithDischargeCost` | price | yes |
//! | `PowerFlow` | 0 | - |
//!
//! Every variant except `PowerFlow` also penalises simultaneous charging and
//! discharging through the conversion losses
//! `α·Σ[(1−η_c)·P_c + (1/η_d − 1)·P_d]`. Discharge cost is `price/2` per kWh
//! of storage discharge and `price/3` per kWh of flexible-load discharge.

use std::fmt;
use std::str::FromStr;

use dopf_core::StorageParams;
use serde::{Deserialize, Serialize};

/// Weight of the simultaneous charge/discharge suppression term.
pub const SIMULTANEOUS_PENALTY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    SubstationPower,
    SubstationPowerWithDischargeCost,
    CostMinimize,
    #[default]
    CostMinimizeWithDischargeCost,
    PowerFlow,
}

/// Linear cost coefficients of one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodCosts {
    pub feed_in: f64,
    pub storage_charge: f64,
    pub storage_discharge: f64,
    pub flex_charge: f64,
    pub flex_discharge: f64,
}

impl ObjectiveKind {
    pub const ALL: [ObjectiveKind; 5] = [
        ObjectiveKind::SubstationPower,
        ObjectiveKind::SubstationPowerWithDischargeCost,
        ObjectiveKind::CostMinimize,
        ObjectiveKind::CostMinimizeWithDischargeCost,
        ObjectiveKind::PowerFlow,
    ];

    pub fn prices_feed_in(self) -> bool {
        matches!(
            self,
            ObjectiveKind::CostMinimize | ObjectiveKind::CostMinimizeWithDischargeCost
        )
    }

    pub fn charges_discharge(self) -> bool {
        matches!(
            self,
            ObjectiveKind::SubstationPowerWithDischargeCost
                | ObjectiveKind::CostMinimizeWithDischargeCost
        )
    }

    /// Cost coefficients for a period with energy price `price`.
    pub fn period_costs(self, price: f64, storage: &StorageParams) -> PeriodCosts {
        if self == ObjectiveKind::PowerFlow {
            return PeriodCosts {
                feed_in: 0.0,
                storage_charge: 0.0,
                storage_discharge: 0.0,
                flex_charge: 0.0,
                flex_discharge: 0.0,
            };
        }

        let feed_in = if self.prices_feed_in() { price } else { 1.0 };
        let (storage_dis_cost, flex_dis_cost) = if self.charges_discharge() {
            (price / 2.0, price / 3.0)
        } else {
            (0.0, 0.0)
        };

        PeriodCosts {
            feed_in,
            storage_charge: SIMULTANEOUS_PENALTY * (1.0 - storage.charge_efficiency),
            storage_discharge: SIMULTANEOUS_PENALTY * (1.0 / storage.discharge_efficiency - 1.0)
                + storage_dis_cost,
            flex_charge: 0.0,
            flex_discharge: flex_dis_cost,
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectiveKind::SubstationPower => "substation_power",
            ObjectiveKind::SubstationPowerWithDischargeCost => "substation_power_with_discharge_cost",
            ObjectiveKind::CostMinimize => "cost_minimize",
            ObjectiveKind::CostMinimizeWithDischargeCost => "cost_minimize_with_discharge_cost",
            ObjectiveKind::PowerFlow => "power_flow",
        };
        f.write_str(name)
    }
}

impl FromStr for ObjectiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ObjectiveKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == normalized)
            .ok_or_else(|| format!("Unknown objective: {}", s))
    }
}
