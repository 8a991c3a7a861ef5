use std::str::FromStr;

use anyhow::{Error, bail};

/// Device-level measurement keys published by the PDU firmware in
/// `<field key="..." value="..."/>` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    KWattHrsTotal,
    KWattHrsA,
    RealPowerTotal,
    RealPowerA,
    VoltsA,
    VoltPkA,
    AmpsA,
    AmpsPkA,
    ApPowerA,
    PwrFactorPercentA,
}

impl FieldKey {
    pub const ALL: [FieldKey; 10] = [
        FieldKey::KWattHrsTotal,
        FieldKey::KWattHrsA,
        FieldKey::RealPowerTotal,
        FieldKey::RealPowerA,
        FieldKey::VoltsA,
        FieldKey::VoltPkA,
        FieldKey::AmpsA,
        FieldKey::AmpsPkA,
        FieldKey::ApPowerA,
        FieldKey::PwrFactorPercentA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::KWattHrsTotal => "KWatt-hrs-Total",
            FieldKey::KWattHrsA => "KWatt-hrs-A",
            FieldKey::RealPowerTotal => "RealPower-Total",
            FieldKey::RealPowerA => "RealPower-A",
            FieldKey::VoltsA => "Volts-A",
            FieldKey::VoltPkA => "Volt-Pk-A",
            FieldKey::AmpsA => "Amps-A",
            FieldKey::AmpsPkA => "Amps-Pk-A",
            FieldKey::ApPowerA => "ApPower-A",
            FieldKey::PwrFactorPercentA => "Pwr-Factor%-A",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            FieldKey::KWattHrsTotal => "pdu_kwh_total",
            FieldKey::KWattHrsA => "pdu_kwh",
            FieldKey::RealPowerTotal => "pdu_realpower_total",
            FieldKey::RealPowerA => "pdu_realpower",
            FieldKey::VoltsA => "pdu_volts",
            FieldKey::VoltPkA => "pdu_volts_peak",
            FieldKey::AmpsA => "pdu_amps",
            FieldKey::AmpsPkA => "pdu_amps_peak",
            FieldKey::ApPowerA => "pdu_apparent_power",
            FieldKey::PwrFactorPercentA => "pdu_power_factor_percent",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            FieldKey::KWattHrsTotal => "Total device KWh",
            FieldKey::KWattHrsA => "Device KWh",
            FieldKey::RealPowerTotal => "Device total real power",
            FieldKey::RealPowerA => "Device real power",
            FieldKey::VoltsA => "Device voltage",
            FieldKey::VoltPkA => "Device peak voltage",
            FieldKey::AmpsA => "Device amperage",
            FieldKey::AmpsPkA => "Device peak amperage",
            FieldKey::ApPowerA => "Device apparent power",
            FieldKey::PwrFactorPercentA => "Power factor percentage",
        }
    }
}

impl FromStr for FieldKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KWatt-hrs-Total" => Ok(FieldKey::KWattHrsTotal),
            "KWatt-hrs-A" => Ok(FieldKey::KWattHrsA),
            "RealPower-Total" => Ok(FieldKey::RealPowerTotal),
            "RealPower-A" => Ok(FieldKey::RealPowerA),
            "Volts-A" => Ok(FieldKey::VoltsA),
            "Volt-Pk-A" => Ok(FieldKey::VoltPkA),
            "Amps-A" => Ok(FieldKey::AmpsA),
            "Amps-Pk-A" => Ok(FieldKey::AmpsPkA),
            "ApPower-A" => Ok(FieldKey::ApPowerA),
            "Pwr-Factor%-A" => Ok(FieldKey::PwrFactorPercentA),
            _ => bail!("unknown field key: {}", s),
        }
    }
}
