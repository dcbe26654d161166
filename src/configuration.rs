use crate::{
    backend::{BackendFactory, BackendParams},
    dispatch::Dispatch,
    session::Session,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// How counters are sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingMode {
    /// Counters are captured per command and read back from each completed event.
    EventBased,

    /// Counters are captured continuously by the hardware and drained from a stream.
    TimeBased,
}

/// A configuration builder for `Session`.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub(crate) lib_name: String,
    pub(crate) metric_set: String,
    pub(crate) metrics_file: Option<PathBuf>,
    pub(crate) report_max: bool,
    pub(crate) event_based: bool,
    pub(crate) time_based: bool,
    pub(crate) per_event_timing: bool,
    pub(crate) dump_directory: PathBuf,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            lib_name: String::new(),
            metric_set: "ComputeBasic".to_owned(),
            metrics_file: None,
            report_max: false,
            event_based: false,
            time_based: false,
            per_event_timing: false,
            dump_directory: PathBuf::from("."),
        }
    }
}

impl Configuration {
    /// Creates a new `Configuration` with default values.
    pub fn new() -> Configuration { Default::default() }

    /// Sets the name or path of the metrics discovery library.
    ///
    /// Defaults to an empty string, which lets the backend pick its platform default.
    pub fn lib_name(mut self, lib_name: &str) -> Self {
        self.lib_name = lib_name.to_owned();
        self
    }

    /// Sets the symbol name of the metric set to collect.
    ///
    /// Defaults to `ComputeBasic`.  The name is also part of the dump file name.
    pub fn metric_set(mut self, metric_set: &str) -> Self {
        self.metric_set = metric_set.to_owned();
        self
    }

    /// Sets a custom metrics definition file.
    pub fn metrics_file<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.metrics_file = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Sets whether max values are computed and dumped next to each metric.
    ///
    /// Defaults to `false`.
    pub fn report_max(mut self, report_max: bool) -> Self {
        self.report_max = report_max;
        self
    }

    /// Enables or disables event-based sampling.
    ///
    /// Exactly one of event-based and time-based sampling must be enabled by the time the session
    /// initializes.
    pub fn event_based_sampling(mut self, enabled: bool) -> Self {
        self.event_based = enabled;
        self
    }

    /// Enables or disables time-based sampling.
    pub fn time_based_sampling(mut self, enabled: bool) -> Self {
        self.time_based = enabled;
        self
    }

    /// Selects a sampling mode, clearing the other one.
    pub fn sampling_mode(self, mode: SamplingMode) -> Self {
        self.event_based_sampling(mode == SamplingMode::EventBased)
            .time_based_sampling(mode == SamplingMode::TimeBased)
    }

    /// Sets whether the end-of-run summary of per-call-site averages is produced.
    ///
    /// Defaults to `false`.  Only meaningful with event-based sampling.
    pub fn per_event_timing(mut self, enabled: bool) -> Self {
        self.per_event_timing = enabled;
        self
    }

    /// Sets the directory the metric dump file is written into.
    ///
    /// Defaults to the current directory.  Missing directories are created when the dump file is
    /// first opened.
    pub fn dump_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dump_directory = path.as_ref().to_path_buf();
        self
    }

    /// Gets the configured sampling mode.
    ///
    /// Returns `None` if neither or both modes are enabled.
    pub fn mode(&self) -> Option<SamplingMode> {
        match (self.event_based, self.time_based) {
            (true, false) => Some(SamplingMode::EventBased),
            (false, true) => Some(SamplingMode::TimeBased),
            _ => None,
        }
    }

    pub(crate) fn backend_params(&self) -> BackendParams {
        BackendParams {
            lib_name: self.lib_name.clone(),
            metric_set: self.metric_set.clone(),
            metrics_file: self.metrics_file.clone(),
            include_max_values: self.report_max,
        }
    }

    /// Create a `Session` based on this configuration.
    ///
    /// Nothing is initialized until [`Session::initialize`] is called.
    pub fn build(self, factory: Box<dyn BackendFactory>, dispatch: Arc<dyn Dispatch>) -> Session {
        Session::from_config(self, factory, dispatch)
    }
}
