//! The fetch, parse and publish cycle.
//!
//! A cycle only ever writes instruments; series that disappear from the PDU
//! document keep their last value. Errors are handled at the smallest scope
//! that contains them: a bad outlet is skipped, a bad device is skipped, and
//! an unreachable PDU or unparsable document skips the cycle.

use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result, anyhow};
use chrono::Utc;
use roxmltree::{Document, Node, ParsingOptions};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::{
    fetcher::Fetch,
    metrics::{ErrorKind, PduMetrics},
    pdu::{DeviceLabels, Field, Outlet},
};

/// Instrument writes performed by one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub devices: usize,

    pub device_gauges: usize,

    pub outlet_gauges: usize,

    pub outlet_states: usize,

    pub skipped_devices: usize,

    pub skipped_outlets: usize,
}

pub struct Exporter<F> {
    fetcher: F,
    metrics: Arc<PduMetrics>,
    polling_interval: Duration,
}

impl<F: Fetch> Exporter<F> {
    pub fn new(fetcher: F, metrics: Arc<PduMetrics>, polling_interval: Duration) -> Self {
        Self {
            fetcher,
            metrics,
            polling_interval,
        }
    }

    pub fn metrics(&self) -> &PduMetrics {
        &self.metrics
    }

    /// Polls forever. The interval is slept after each cycle finishes, so
    /// the effective period is the cycle duration plus the interval.
    pub async fn run(&self) {
        loop {
            let start = Instant::now();
            self.process().await;
            let elapsed = start.elapsed();

            self.metrics.set_poll_duration(elapsed.as_secs_f64());
            info!("process completed in {:.2}s", elapsed.as_secs_f64());

            sleep(self.polling_interval).await;
        }
    }

    /// Runs one cycle. Returns `None` when no document was published, in
    /// which case no PDU instrument was touched.
    pub async fn process(&self) -> Option<CycleStats> {
        info!("starting process");

        let body = match self.fetcher.fetch().await {
            Ok(body) => body,
            Err(err) => {
                warn!("failed to fetch PDU status document: {err:#}");
                self.metrics.record_failure(ErrorKind::Fetch);
                return None;
            }
        };

        match self.process_document(&body) {
            Ok(stats) => {
                self.metrics.record_success(Utc::now());
                Some(stats)
            }
            Err(err) => {
                warn!("failed to process PDU status document: {err:#}");
                self.metrics.record_failure(ErrorKind::Parse);
                None
            }
        }
    }

    /// Parses a status document and publishes every device and outlet in it.
    ///
    /// Fails only when the document itself is unusable, before any
    /// instrument is written.
    pub fn process_document(&self, body: &str) -> Result<CycleStats> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(body, options).context("failed to parse XML")?;
        let devices = document
            .root_element()
            .children()
            .find(|n| n.has_tag_name("devices"))
            .ok_or_else(|| anyhow!("document has no <devices> element"))?;

        let mut stats = CycleStats::default();
        for device in devices.children().filter(Node::is_element) {
            match DeviceLabels::from_node(device) {
                Ok(labels) => self.process_device(device, &labels, &mut stats),
                Err(err) => {
                    warn!("skipping device: {err:#}");
                    self.metrics.record_error(ErrorKind::Device);
                    stats.skipped_devices += 1;
                }
            }
        }

        Ok(stats)
    }

    fn process_device(&self, device: Node<'_, '_>, labels: &DeviceLabels, stats: &mut CycleStats) {
        debug!(device_id = %labels.id, device_type = %labels.r#type, "processing device");
        stats.devices += 1;

        for node in device.children().filter(|n| n.has_tag_name("field")) {
            match Field::from_node(node) {
                Ok(Some(field)) => {
                    self.metrics.set_device_field(labels, &field);
                    stats.device_gauges += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(device_id = %labels.id, "skipping field: {err:#}");
                    self.metrics.record_error(ErrorKind::Field);
                }
            }
        }

        let Some(outlets) = device.children().find(|n| n.has_tag_name("outlets")) else {
            debug!(device_id = %labels.id, "device has no outlets");
            return;
        };

        for node in outlets.children().filter(Node::is_element) {
            self.process_outlet(node, labels, stats);
        }
    }

    fn process_outlet(&self, node: Node<'_, '_>, device: &DeviceLabels, stats: &mut CycleStats) {
        let outlet_num = node.attribute("num").unwrap_or("?");
        debug!(device_id = %device.id, outlet_num, "processing outlet");

        let outlet = match Outlet::from_node(node) {
            Ok(outlet) => outlet,
            Err(err) => {
                warn!(device_id = %device.id, outlet_num, "skipping outlet: {err:#}");
                self.metrics.record_error(ErrorKind::Outlet);
                stats.skipped_outlets += 1;
                return;
            }
        };

        stats.outlet_gauges += self.metrics.set_outlet_readings(device, &outlet);

        match outlet.status.parse() {
            Ok(status) => {
                self.metrics.set_outlet_status(device, &outlet, status);
                stats.outlet_states += 1;
            }
            Err(err) => {
                warn!(device_id = %device.id, outlet_num, "leaving outlet status unchanged: {err:#}");
                self.metrics.record_error(ErrorKind::Status);
            }
        }
    }
}
