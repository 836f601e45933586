use prometheus::{opts, IntCounterVec, Registry, TextEncoder};

/// Payment counters scraped from `/metrics`
pub struct Metrics {
    registry: Registry,
    /// Labels: `outcome` (created, rejected)
    initiations: IntCounterVec,
    /// Labels: `status` (COMPLETED, FAILED, error)
    verifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let initiations = IntCounterVec::new(
            opts!("roam_payment_initiations_total", "Payment initiation attempts"),
            &["outcome"],
        )?;
        let verifications = IntCounterVec::new(
            opts!("roam_payment_verifications_total", "Payment verification results"),
            &["status"],
        )?;

        registry.register(Box::new(initiations.clone()))?;
        registry.register(Box::new(verifications.clone()))?;

        Ok(Self { registry, initiations, verifications })
    }

    pub fn record_initiation(&self, outcome: &str) {
        self.initiations.with_label_values(&[outcome]).inc();
    }

    pub fn record_verification(&self, status: &str) {
        self.verifications.with_label_values(&[status]).inc();
    }

    pub fn export(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
