//! Fault reporting sinks.

use esobox_core::fault::{Fault, FaultReporter, NoopFaultReporter};
use std::sync::Arc;

/// Writes faults to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaultReporter;

impl FaultReporter for TracingFaultReporter {
    fn report(&self, fault: &Fault) {
        tracing::error!(
            session_id = %fault.session_id,
            language = %fault.language,
            "[FaultReporter] {}\n{}",
            fault.message,
            fault.detail
        );
    }
}

/// POSTs faults as JSON to a collection endpoint.
///
/// Each report is sent on its own task; delivery failures are logged and
/// dropped.
#[derive(Debug, Clone)]
pub struct HttpFaultReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFaultReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl FaultReporter for HttpFaultReporter {
    fn report(&self, fault: &Fault) {
        TracingFaultReporter.report(fault);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("[FaultReporter] No runtime, fault not sent");
            return;
        };

        let request = self.client.post(&self.endpoint).json(fault);
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => tracing::debug!("[FaultReporter] Fault sent to {}", endpoint),
                Err(e) => tracing::warn!("[FaultReporter] Failed to send fault: {}", e),
            }
        });
    }
}

/// Picks the reporter for a deployment: nothing in local mode, HTTP when an
/// endpoint is configured, the log otherwise.
pub fn reporter_for(local: bool, endpoint: Option<&str>) -> Arc<dyn FaultReporter> {
    match (local, endpoint) {
        (true, _) => Arc::new(NoopFaultReporter),
        (false, Some(endpoint)) => Arc::new(HttpFaultReporter::new(endpoint)),
        (false, None) => Arc::new(TracingFaultReporter),
    }
}
