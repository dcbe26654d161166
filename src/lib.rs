//! Device performance counter collection for a compute API interception layer.
//!
//! A [`Session`] wraps a metrics discovery backend.  Once initialized, it creates command queues
//! that carry performance counter payloads, reads counter reports back either per event or from
//! a continuous hardware stream, dumps every report to a CSV file, and aggregates per-event
//! reports by call site for an end-of-run summary.
pub mod cl;

mod aggregate;
mod backend;
mod configuration;
mod dispatch;
mod dump;
mod poller;
mod properties;
mod queue;
mod report;
mod session;
mod value;

#[cfg(test)]
mod testing;

pub use self::{
    aggregate::{Aggregate, Aggregations, CallSite},
    backend::{BackendFactory, BackendParams, MetricReport, MetricsBackend},
    configuration::{Configuration, SamplingMode},
    dispatch::{Dispatch, PerfCountersQueue},
    dump::{dump_path, DumpHeader, DumpSink, DUMP_FILE_PREFIX},
    poller::StreamPoller,
    properties::translate_properties,
    queue::QueueError,
    report::write_report,
    session::{Session, STREAM_SOURCE, STREAM_TIMER_PERIOD_NS},
    value::TypedValue,
};
