//! Prometheus registry for `/metrics`
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    calculations: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let calculations = IntCounterVec::new(
            Opts::new("proposta_calculations_total", "Calculations served, by domain and outcome"),
            &["domain", "outcome"],
        )?;
        registry.register(Box::new(calculations.clone()))?;
        Ok(Self {
            registry,
            calculations,
        })
    }

    pub fn record(&self, domain: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.calculations.with_label_values(&[domain, outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
