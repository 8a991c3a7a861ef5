use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use prometheus::{Encoder as _, Gauge, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::pdu::{DEVICE_LABELS, DeviceLabels, Field, FieldKey, OUTLET_LABELS, Outlet, OutletStatus};

mod status_set;

pub use status_set::OutletStatusSet;

const OUTLET_STATUS_NAME: &str = "pdu_outlet_status";

/// Where a polling cycle lost data. Used as the `kind` label of
/// `pdu_poll_errors_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
    Device,
    Field,
    Outlet,
    Status,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Parse => "parse",
            ErrorKind::Device => "device",
            ErrorKind::Field => "field",
            ErrorKind::Outlet => "outlet",
            ErrorKind::Status => "status",
        }
    }
}

/// Every instrument the exporter publishes, registered once at startup.
///
/// Shared between the polling loop (writer) and the scrape handler (reader).
/// Individual series updates are atomic; a scrape taken mid-cycle can see a
/// mix of this cycle's and the previous cycle's values.
pub struct PduMetrics {
    registry: Registry,

    pub(crate) device: IndexMap<FieldKey, GaugeVec>,

    pub(crate) outlet_amps: GaugeVec,

    pub(crate) outlet_kwh_total: GaugeVec,

    pub(crate) outlet_watts: GaugeVec,

    pub(crate) outlet_status: OutletStatusSet,

    pub(crate) up: IntGauge,

    pub(crate) last_success_timestamp_seconds: Gauge,

    pub(crate) poll_duration_seconds: Gauge,

    pub(crate) poll_errors: IntCounterVec,
}

impl PduMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let mut device = IndexMap::with_capacity(FieldKey::ALL.len());
        for key in FieldKey::ALL {
            let gauge = register(
                &registry,
                GaugeVec::new(Opts::new(key.metric_name(), key.help()), &DEVICE_LABELS),
            )?;
            device.insert(key, gauge);
        }

        let outlet_amps = register(
            &registry,
            GaugeVec::new(Opts::new("pdu_outlet_amps", "Outlet amperage"), &OUTLET_LABELS),
        )?;
        let outlet_kwh_total = register(
            &registry,
            GaugeVec::new(
                Opts::new("pdu_outlet_kwh_total", "Outlet total KWh"),
                &OUTLET_LABELS,
            ),
        )?;
        let outlet_watts = register(
            &registry,
            GaugeVec::new(Opts::new("pdu_outlet_watts", "Outlet watts"), &OUTLET_LABELS),
        )?;

        let outlet_status = register(
            &registry,
            OutletStatusSet::new(OUTLET_STATUS_NAME, "Outlet status"),
        )?;

        let up = register(
            &registry,
            IntGauge::new(
                "pdu_up",
                "Whether the last poll fetched and parsed a status document",
            ),
        )?;
        let last_success_timestamp_seconds = register(
            &registry,
            Gauge::new(
                "pdu_last_success_timestamp_seconds",
                "Unix time of the last poll that published a status document",
            ),
        )?;
        let poll_duration_seconds = register(
            &registry,
            Gauge::new(
                "pdu_poll_duration_seconds",
                "Wall-clock duration of the last poll",
            ),
        )?;
        let poll_errors = register(
            &registry,
            IntCounterVec::new(
                Opts::new("pdu_poll_errors_total", "Errors encountered while polling"),
                &["kind"],
            ),
        )?;

        Ok(Self {
            registry,
            device,
            outlet_amps,
            outlet_kwh_total,
            outlet_watts,
            outlet_status,
            up,
            last_success_timestamp_seconds,
            poll_duration_seconds,
            poll_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_device_field(&self, device: &DeviceLabels, field: &Field) {
        if let Some(gauge) = self.device.get(&field.key) {
            gauge
                .with_label_values(&device.label_values())
                .set(field.value);
        }
    }

    /// Writes the outlet's numeric readings and returns how many gauges
    /// were set.
    pub fn set_outlet_readings(&self, device: &DeviceLabels, outlet: &Outlet) -> usize {
        let labels = outlet.label_values(device);
        let readings = [
            (&self.outlet_amps, outlet.amps),
            (&self.outlet_kwh_total, outlet.kwatthrs),
            (&self.outlet_watts, outlet.watts),
        ];
        for (gauge, value) in readings {
            gauge.with_label_values(&labels).set(value);
        }
        readings.len()
    }

    pub fn set_outlet_status(&self, device: &DeviceLabels, outlet: &Outlet, status: OutletStatus) {
        self.outlet_status
            .set(outlet.label_values(device).map(str::to_owned), status);
    }

    /// The state currently exposed for an outlet, if one was ever set.
    pub fn outlet_status(&self, device: &DeviceLabels, outlet: &Outlet) -> Option<OutletStatus> {
        self.outlet_status
            .get(&outlet.label_values(device).map(str::to_owned))
    }

    pub fn record_success(&self, at: DateTime<Utc>) {
        self.up.set(1);
        self.last_success_timestamp_seconds
            .set(at.timestamp_millis() as f64 / 1000.0);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.up.set(0);
        self.record_error(kind);
    }

    pub fn record_error(&self, kind: ErrorKind) {
        self.poll_errors.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn set_poll_duration(&self, seconds: f64) {
        self.poll_duration_seconds.set(seconds);
    }

    /// Renders every registered instrument in the Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("failed to encode metrics")?;
        String::from_utf8(buffer).context("encoded metrics are not valid UTF-8")
    }
}

fn register<M>(registry: &Registry, metric: prometheus::Result<M>) -> Result<M>
where
    M: prometheus::core::Collector + Clone + 'static,
{
    let metric = metric.context("failed to create metric")?;
    registry
        .register(Box::new(metric.clone()))
        .context("failed to register metric")?;
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceLabels {
        DeviceLabels {
            id: "1".to_owned(),
            r#type: "pdu".to_owned(),
        }
    }

    fn outlet() -> Outlet {
        Outlet {
            name: "router".to_owned(),
            num: "2".to_owned(),
            url: "/outlet/2".to_owned(),
            amps: 0.3,
            kwatthrs: 4.5,
            watts: 35.0,
            status: "On".to_owned(),
        }
    }

    #[test]
    fn declares_one_gauge_per_field_key() {
        let metrics = PduMetrics::new().unwrap();
        assert_eq!(metrics.device.len(), FieldKey::ALL.len());
    }

    #[test]
    fn device_field_lands_on_its_gauge() {
        let metrics = PduMetrics::new().unwrap();
        metrics.set_device_field(
            &device(),
            &Field {
                key: FieldKey::VoltsA,
                value: 229.8,
            },
        );

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"pdu_volts{id="1",type="pdu"} 229.8"#));
    }

    #[test]
    fn outlet_readings_report_their_write_count() {
        let metrics = PduMetrics::new().unwrap();
        assert_eq!(metrics.set_outlet_readings(&device(), &outlet()), 3);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"pdu_outlet_amps{id="1",name="router",num="2",type="pdu",url="/outlet/2"} 0.3"#));
        assert!(text.contains(r#"pdu_outlet_kwh_total{id="1",name="router",num="2",type="pdu",url="/outlet/2"} 4.5"#));
        assert!(text.contains(r#"pdu_outlet_watts{id="1",name="router",num="2",type="pdu",url="/outlet/2"} 35"#));
    }

    #[test]
    fn outlet_status_is_exposed_as_state_set() {
        let metrics = PduMetrics::new().unwrap();
        metrics.set_outlet_status(&device(), &outlet(), OutletStatus::Off);

        let text = metrics.encode().unwrap();
        assert!(text.contains(
            r#"pdu_outlet_status{id="1",name="router",num="2",pdu_outlet_status="Off",type="pdu",url="/outlet/2"} 1"#
        ));
        assert!(text.contains(
            r#"pdu_outlet_status{id="1",name="router",num="2",pdu_outlet_status="On",type="pdu",url="/outlet/2"} 0"#
        ));
        assert_eq!(
            metrics.outlet_status(&device(), &outlet()),
            Some(OutletStatus::Off)
        );
    }

    #[test]
    fn failure_clears_up_and_counts_kind() {
        let metrics = PduMetrics::new().unwrap();
        metrics.record_success(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        assert_eq!(metrics.up.get(), 1);
        assert_eq!(metrics.last_success_timestamp_seconds.get(), 1_700_000_000.0);

        metrics.record_failure(ErrorKind::Fetch);
        assert_eq!(metrics.up.get(), 0);
        assert_eq!(metrics.poll_errors.with_label_values(&["fetch"]).get(), 1);
        assert_eq!(metrics.last_success_timestamp_seconds.get(), 1_700_000_000.0);
    }
}
