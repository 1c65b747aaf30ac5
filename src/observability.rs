use biometrics::{Collector, Counter, Moments};

pub(crate) static QUERIES: Counter = Counter::new("assistant.queries");
pub(crate) static QUERY_FRAGMENTS: Counter = Counter::new("assistant.query.fragments");
pub(crate) static PROVIDER_ERRORS: Counter = Counter::new("assistant.provider.errors");
pub(crate) static CONTEXT_READ_ERRORS: Counter = Counter::new("assistant.context.read_errors");
pub(crate) static STREAM_TTFF: Moments = Moments::new("assistant.stream.ttff_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("assistant.stream.duration_seconds");

pub(crate) static SHELL_RUNS: Counter = Counter::new("assistant.shell.runs");
pub(crate) static SHELL_FAILURES: Counter = Counter::new("assistant.shell.failures");
pub(crate) static SHELL_DURATION: Moments = Moments::new("assistant.shell.duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("assistant.session.turns");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&QUERIES);
    collector.register_counter(&QUERY_FRAGMENTS);
    collector.register_counter(&PROVIDER_ERRORS);
    collector.register_counter(&CONTEXT_READ_ERRORS);
    collector.register_moments(&STREAM_TTFF);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SHELL_RUNS);
    collector.register_counter(&SHELL_FAILURES);
    collector.register_moments(&SHELL_DURATION);

    collector.register_counter(&SESSION_TURNS);
}
