use serde::{Deserialize, Serialize};
use strum::Display;

pub const MEGAWATT_HOURS_PER_GIGAWATT_HOUR: u32 = 1_000;
pub const MONTHS_PER_YEAR: usize = 12;

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum EnergyUnit {
    #[strum(serialize = "GWh")]
    #[serde(rename = "GWh")]
    GigawattHours,
    #[strum(serialize = "MWh")]
    #[serde(rename = "MWh")]
    MegawattHours,
}

impl EnergyUnit {
    fn megawatt_hours(&self) -> f64 {
        match self {
            EnergyUnit::GigawattHours => MEGAWATT_HOURS_PER_GIGAWATT_HOUR as f64,
            EnergyUnit::MegawattHours => 1.,
        }
    }

    /// Factor that converts a value in this unit into `target`.
    pub fn factor_to(&self, target: EnergyUnit) -> f64 {
        if *self == target {
            1.
        } else {
            self.megawatt_hours() / target.megawatt_hours()
        }
    }
}
