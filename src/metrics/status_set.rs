use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use indexmap::IndexMap;
use prometheus::{
    core::{Collector, Desc},
    proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType},
};
use tracing::warn;

use crate::pdu::{OUTLET_LABELS, OutletStatus};

pub type OutletKey = [String; 5];

/// Enum-style instrument holding one [`OutletStatus`] per outlet label set.
///
/// Rendered as one series per state with the state in a label named after
/// the metric, 1 for the current state and 0 for the others. Every series of
/// an outlet is built from the same locked snapshot, so a scrape always sees
/// exactly one state set.
#[derive(Clone)]
pub struct OutletStatusSet {
    desc: Desc,
    states: Arc<Mutex<IndexMap<OutletKey, OutletStatus>>>,
}

impl OutletStatusSet {
    pub fn new(name: &str, help: &str) -> prometheus::Result<Self> {
        let mut labels: Vec<String> = OUTLET_LABELS.iter().map(|l| l.to_string()).collect();
        labels.push(name.to_owned());

        let desc = Desc::new(name.to_owned(), help.to_owned(), labels, HashMap::new())?;

        Ok(Self {
            desc,
            states: Arc::new(Mutex::new(IndexMap::new())),
        })
    }

    pub fn set(&self, key: OutletKey, status: OutletStatus) {
        let Ok(mut states) = self.states.lock() else {
            warn!("outlet status lock poisoned, dropping update");
            return;
        };
        states.insert(key, status);
    }

    pub fn get(&self, key: &OutletKey) -> Option<OutletStatus> {
        self.states.lock().ok()?.get(key).copied()
    }

    fn series(&self, key: &OutletKey, state: OutletStatus, current: OutletStatus) -> Metric {
        let mut pairs: Vec<LabelPair> = OUTLET_LABELS
            .iter()
            .zip(key)
            .map(|(name, value)| label_pair(name, value))
            .collect();
        pairs.push(label_pair(&self.desc.fq_name, state.as_str()));
        pairs.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let mut gauge = Gauge::default();
        gauge.set_value(if state == current { 1.0 } else { 0.0 });

        let mut metric = Metric::default();
        metric.set_label(pairs.into());
        metric.set_gauge(gauge);
        metric
    }
}

impl Collector for OutletStatusSet {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = match self.states.lock() {
            Ok(states) => states.clone(),
            Err(_) => {
                warn!("outlet status lock poisoned, skipping collection");
                return Vec::new();
            }
        };

        let metrics: Vec<Metric> = snapshot
            .iter()
            .flat_map(|(key, &current)| {
                OutletStatus::ALL
                    .into_iter()
                    .map(move |state| self.series(key, state, current))
            })
            .collect();

        let mut family = MetricFamily::default();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_field_type(MetricType::GAUGE);
        family.set_metric(metrics.into());
        vec![family]
    }
}

fn label_pair(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_owned());
    pair.set_value(value.to_owned());
    pair
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        thread,
    };

    use super::*;

    fn key() -> OutletKey {
        ["fan", "4", "/outlet/4", "1", "pdu"].map(str::to_owned)
    }

    fn state_sum(set: &OutletStatusSet) -> Option<f64> {
        let families = set.collect();
        let metrics: Vec<&Metric> = families.iter().flat_map(|f| f.get_metric()).collect();
        if metrics.is_empty() {
            return None;
        }
        Some(metrics.iter().map(|m| m.get_gauge().get_value()).sum())
    }

    #[test]
    fn latest_state_replaces_previous() {
        let set = OutletStatusSet::new("pdu_outlet_status", "Outlet status").unwrap();
        assert_eq!(set.get(&key()), None);

        set.set(key(), OutletStatus::On);
        set.set(key(), OutletStatus::Off);

        assert_eq!(set.get(&key()), Some(OutletStatus::Off));
        assert_eq!(state_sum(&set), Some(1.0));
    }

    #[test]
    fn concurrent_collect_sees_exactly_one_state() {
        let set = OutletStatusSet::new("pdu_outlet_status", "Outlet status").unwrap();
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..20_000 {
                    let status = if i % 2 == 0 {
                        OutletStatus::On
                    } else {
                        OutletStatus::Off
                    };
                    set.set(key(), status);
                }
                done.store(true, Ordering::Release);
            });

            let mut reads = 0;
            while !done.load(Ordering::Acquire) || reads < 1_000 {
                if let Some(sum) = state_sum(&set) {
                    assert_eq!(sum, 1.0, "outlet exposed with {sum} active states");
                }
                reads += 1;
            }
        });
    }
}
