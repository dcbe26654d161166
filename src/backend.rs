use crate::value::TypedValue;
use std::path::PathBuf;

/// Parameters handed to the metrics backend when constructing it.
#[derive(Clone, Debug, Default)]
pub struct BackendParams {
    /// Name or path of the metrics discovery library.
    pub lib_name: String,

    /// Symbol name of the metric set to collect.
    pub metric_set: String,

    /// Optional custom metrics definition file.
    pub metrics_file: Option<PathBuf>,

    /// Whether to compute max values alongside each metric.
    pub include_max_values: bool,
}

/// Metric values converted from one or more raw counter reports.
///
/// `values` and `max_values` are positionally aligned with [`MetricsBackend::metric_names`], and
/// `io_values` with [`MetricsBackend::io_measurement_names`].  `max_values` is empty unless max
/// values were requested, and `io_values` is only populated for stream reports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricReport {
    pub values: Vec<TypedValue>,
    pub max_values: Vec<TypedValue>,
    pub io_values: Vec<TypedValue>,
}

impl MetricReport {
    /// Whether the conversion produced any metric values.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

/// A constructed metrics discovery session.
///
/// Every call is fallible from the caller's perspective; implementations report failure through
/// return values and never panic across this boundary.
pub trait MetricsBackend: Send {
    /// Opens the continuous sample stream.
    ///
    /// `timer_period_ns` is the sampling period, `buffer_size` is the stream buffer size in bytes
    /// (zero for the device maximum), and `pid` scopes sampling to a process (zero for all).
    fn open_stream(&mut self, timer_period_ns: u32, buffer_size: u32, pid: u32) -> bool;

    /// Activates the selected metric set on the device.
    fn activate_metric_set(&mut self) -> bool;

    /// Gets the configuration id the driver understands for the active metric set.
    fn metrics_configuration(&self) -> u32;

    /// Gets the size, in bytes, of one per-command query report.
    fn query_report_size(&self) -> usize;

    /// Converts `count` raw query reports stored back to back in `data`.
    fn metrics_from_reports(&mut self, count: u32, data: &[u8]) -> MetricReport;

    /// Pulls pending reports from the stream into the saved report buffer.
    ///
    /// Returns `true` if a new report is ready to be converted.
    fn save_reports_from_stream(&mut self) -> bool;

    /// Converts the saved stream reports.  `io_values` is left empty.
    fn metrics_from_saved_reports(&mut self) -> MetricReport;

    /// Gets the I/O measurement values for the saved stream reports.
    fn io_measurement_info(&mut self) -> Vec<TypedValue>;

    /// Discards the saved stream reports that have already been delivered.
    fn reset_saved_reports(&mut self);

    /// Gets the symbol names of the metrics in the selected metric set.
    fn metric_names(&self) -> Vec<String>;

    /// Gets the units of the metrics in the selected metric set.
    fn metric_units(&self) -> Vec<String>;

    /// Gets the symbol names of the stream I/O measurements.
    fn io_measurement_names(&self) -> Vec<String> { Vec::new() }

    /// Gets the units of the stream I/O measurements.
    fn io_measurement_units(&self) -> Vec<String> { Vec::new() }
}

/// Constructs metrics backends in one of the two sampling modes.
///
/// Returns `None` when the backend library, the metric set or the metrics file is unavailable.
pub trait BackendFactory: Send + Sync {
    /// Creates a backend for event-based sampling.
    fn create_event_based(&self, params: &BackendParams) -> Option<Box<dyn MetricsBackend>>;

    /// Creates a backend for time-based sampling.
    fn create_time_based(&self, params: &BackendParams) -> Option<Box<dyn MetricsBackend>>;
}
