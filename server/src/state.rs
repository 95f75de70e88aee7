use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::UpstreamConfig;

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    pub upstream: Arc<UpstreamConfig>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    region_info_requests_total: AtomicU64,
    general_info_requests_total: AtomicU64,
    upstream_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub region_info_requests_total: u64,
    pub general_info_requests_total: u64,
    pub upstream_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            region_info_requests_total: self.region_info_requests_total.load(Ordering::Relaxed),
            general_info_requests_total: self
                .general_info_requests_total
                .load(Ordering::Relaxed),
            upstream_failures_total: self.upstream_failures_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_region_info_request(&self) {
        self.region_info_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_general_info_request(&self) {
        self.general_info_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_failure(&self) {
        self.upstream_failures_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(upstream: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("regioni/", env!("CARGO_PKG_VERSION")))
            .timeout(upstream.request_timeout)
            .connect_timeout(upstream.connect_timeout)
            .build()?;
        Ok(Self {
            http_client,
            upstream: Arc::new(upstream),
            observability: Arc::new(ObservabilityCounters::default()),
        })
    }
}
