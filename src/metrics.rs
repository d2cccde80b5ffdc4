use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

// ============================================================================
// Metrics - Prometheus counters for the commerce flow
// ============================================================================
//
// Scraped via GET /metrics on the main server. Counters only; the flow has
// no long-running work worth a histogram.
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub checkout_failures: IntCounterVec,
    pub promo_redemptions: IntCounterVec,
    pub emails_sent: IntCounterVec,
    pub emails_failed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Orders successfully created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let checkout_failures = IntCounterVec::new(
            Opts::new("checkout_failures_total", "Checkout attempts rejected before the commit point"),
            &["reason"],
        )?;
        registry.register(Box::new(checkout_failures.clone()))?;

        let promo_redemptions = IntCounterVec::new(
            Opts::new("promo_redemptions_total", "Promo redeem attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(promo_redemptions.clone()))?;

        let emails_sent = IntCounterVec::new(
            Opts::new("emails_sent_total", "Transactional emails delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(emails_sent.clone()))?;

        let emails_failed = IntCounterVec::new(
            Opts::new("emails_failed_total", "Transactional emails that failed after retries"),
            &["kind"],
        )?;
        registry.register(Box::new(emails_failed.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            checkout_failures,
            promo_redemptions,
            emails_sent,
            emails_failed,
        })
    }

    /// Registry handle for the /metrics endpoint.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout_failure(&self, reason: &str) {
        self.checkout_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_promo_redemption(&self, outcome: &str) {
        self.promo_redemptions.with_label_values(&[outcome]).inc();
    }

    pub fn record_email(&self, kind: &str, success: bool) {
        if success {
            self.emails_sent.with_label_values(&[kind]).inc();
        } else {
            self.emails_failed.with_label_values(&[kind]).inc();
        }
    }
}
