use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("aemassist.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("aemassist.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("aemassist.client.request_duration_seconds");
pub(crate) static CLIENT_BLOB_BYTES: Moments = Moments::new("aemassist.client.blob_bytes");

pub(crate) static CHAT_SENDS: Counter = Counter::new("aemassist.chat.sends");
pub(crate) static CHAT_SENDS_REJECTED: Counter = Counter::new("aemassist.chat.sends_rejected");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("aemassist.chat.failures");

pub(crate) static PAGE_QUERIES: Counter = Counter::new("aemassist.pages.queries");
pub(crate) static PAGE_SELECTIONS_PRUNED: Counter =
    Counter::new("aemassist.pages.selections_pruned");
pub(crate) static COMPLIANCE_CHECKS: Counter = Counter::new("aemassist.compliance.checks");
pub(crate) static COMPLIANCE_PAGES: Moments = Moments::new("aemassist.compliance.pages_per_check");

pub(crate) static WORKFLOW_STARTS: Counter = Counter::new("aemassist.workflow.starts");
pub(crate) static WORKFLOW_START_ERRORS: Counter = Counter::new("aemassist.workflow.start_errors");

pub(crate) static MODE_SWITCHES: Counter = Counter::new("aemassist.dashboard.mode_switches");
pub(crate) static MODE_SUGGESTIONS: Counter = Counter::new("aemassist.dashboard.mode_suggestions");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_moments(&CLIENT_BLOB_BYTES);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_SENDS_REJECTED);
    collector.register_counter(&CHAT_FAILURES);

    collector.register_counter(&PAGE_QUERIES);
    collector.register_counter(&PAGE_SELECTIONS_PRUNED);
    collector.register_counter(&COMPLIANCE_CHECKS);
    collector.register_moments(&COMPLIANCE_PAGES);

    collector.register_counter(&WORKFLOW_STARTS);
    collector.register_counter(&WORKFLOW_START_ERRORS);

    collector.register_counter(&MODE_SWITCHES);
    collector.register_counter(&MODE_SUGGESTIONS);
}
