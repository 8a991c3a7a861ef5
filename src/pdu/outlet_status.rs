use std::str::FromStr;

use anyhow::{Error, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletStatus {
    On,
    Off,
}

impl OutletStatus {
    pub const ALL: [OutletStatus; 2] = [OutletStatus::On, OutletStatus::Off];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutletStatus::On => "On",
            OutletStatus::Off => "Off",
        }
    }
}

impl FromStr for OutletStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On" => Ok(OutletStatus::On),
            "Off" => Ok(OutletStatus::Off),
            _ => bail!("unknown outlet status: {}", s),
        }
    }
}
