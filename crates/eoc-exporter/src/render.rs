//! Prometheus rendering of collected metric tuples.
//!
//! Every scrape gets its own [`Registry`]: metric families are created on
//! first use from the tuple's descriptor and discarded with the response.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use prometheus::{CounterVec, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use eoc_api::metrics::{self, Desc, MetricKind};
use eoc_api::{MetricSink, Sample, SessionClient};

/// Content type of the rendered exposition.
pub fn content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}

/// Buffers the tuples of one collection so a failed collection exposes
/// nothing but `up = 0`.
#[derive(Debug, Default)]
pub struct ScrapeBuffer {
    samples: Vec<Sample>,
}

impl MetricSink for ScrapeBuffer {
    fn record(&mut self, sample: Sample) {
        self.samples.push(sample);
    }
}

impl ScrapeBuffer {
    /// Close the buffer with the outcome of the collection.
    pub fn finish(mut self, ok: bool) -> Vec<Sample> {
        if !ok {
            self.samples.clear();
        }
        self.samples.insert(0, metrics::up(ok));
        self.samples
    }
}

/// Collect `client` once. The error, if any, is returned next to the
/// samples so callers can both expose `up = 0` and report the reason.
pub async fn scrape(
    target: &str,
    client: &SessionClient,
) -> (Vec<Sample>, Result<(), eoc_api::Error>) {
    let mut buffer = ScrapeBuffer::default();
    let result = client.collect(&mut buffer).await;
    if let Err(err) = &result {
        warn!(controller = target, error = %err, "scrape failed");
    }
    (buffer.finish(result.is_ok()), result)
}

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

/// Render samples in the Prometheus text format.
pub fn render(samples: &[Sample]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let mut families: HashMap<&'static str, Family> = HashMap::new();

    for sample in samples {
        let family = match families.entry(sample.desc.name) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let family = family_for(sample.desc)?;
                match &family {
                    Family::Gauge(vec) => registry.register(Box::new(vec.clone()))?,
                    Family::Counter(vec) => registry.register(Box::new(vec.clone()))?,
                }
                entry.insert(family)
            }
        };

        let labels: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
        match family {
            Family::Gauge(vec) => vec.get_metric_with_label_values(&labels)?.set(sample.value),
            Family::Counter(vec) => vec.get_metric_with_label_values(&labels)?.inc_by(sample.value),
        }
    }

    TextEncoder::new().encode_to_string(&registry.gather())
}

fn family_for(desc: &Desc) -> Result<Family, prometheus::Error> {
    let opts = Opts::new(desc.name, desc.help);
    Ok(match desc.kind {
        MetricKind::Gauge => Family::Gauge(GaugeVec::new(opts, desc.labels)?),
        MetricKind::Counter => Family::Counter(CounterVec::new(opts, desc.labels)?),
    })
}
