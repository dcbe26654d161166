use crate::{
    aggregate::Aggregations,
    backend::{BackendFactory, MetricsBackend},
    cl::{status_name, Event, PlatformId, CL_PROFILING_COMMAND_PERFCOUNTERS_INTEL, CL_SUCCESS},
    configuration::{Configuration, SamplingMode},
    dispatch::{Dispatch, PerfCountersQueue},
    dump::{dump_path, DumpHeader, DumpSink},
    report::write_report,
};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::{
    cell::RefCell,
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Sampling period of the hardware stream in time-based mode.
pub const STREAM_TIMER_PERIOD_NS: u32 = 10 * 1_000_000;

/// Source label of rows drained from the hardware stream.
pub const STREAM_SOURCE: &str = "TBS";

thread_local! {
    static REPORT_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::new());
}

pub(crate) struct State {
    pub(crate) backend: Option<Box<dyn MetricsBackend>>,
    metric_names: Arc<[String]>,
    dump: Option<DumpSink<BufWriter<File>>>,
}

/// Performance counter session for one intercepted process.
///
/// A `Session` owns the metrics backend, the metric dump and the aggregation table.  It is meant
/// to be created once by the interception layer and shared by every thread issuing API calls.
/// Nothing happens until [`Session::initialize`] runs, and every operation degrades to a no-op if
/// the backend could not be constructed.
pub struct Session {
    pub(crate) config: Configuration,
    factory: Box<dyn BackendFactory>,
    pub(crate) dispatch: Arc<dyn Dispatch>,
    initialized: AtomicBool,
    pub(crate) state: Mutex<State>,
    extensions: Mutex<HashMap<PlatformId, Option<Arc<dyn PerfCountersQueue>>, FnvBuildHasher>>,
    aggregations: Mutex<Aggregations>,
}

impl Session {
    pub(crate) fn from_config(
        config: Configuration, factory: Box<dyn BackendFactory>, dispatch: Arc<dyn Dispatch>,
    ) -> Session {
        Session {
            config,
            factory,
            dispatch,
            initialized: AtomicBool::new(false),
            state: Mutex::new(State {
                backend: None,
                metric_names: Arc::from(Vec::new()),
                dump: None,
            }),
            extensions: Mutex::new(HashMap::default()),
            aggregations: Mutex::new(Aggregations::new()),
        }
    }

    /// Gets a builder to configure a `Session` instance with.
    pub fn builder() -> Configuration { Configuration::default() }

    /// Gets the configuration this session was built from.
    pub fn config(&self) -> &Configuration { &self.config }

    /// Whether the metrics backend has been constructed.
    pub fn is_initialized(&self) -> bool { self.initialized.load(Ordering::Acquire) }

    /// Gets the path of the metric dump.
    pub fn dump_path(&self) -> PathBuf { dump_path(&self.config.dump_directory, &self.config.metric_set) }

    /// Constructs the metrics backend, if it does not exist yet.
    ///
    /// In time-based mode the hardware stream is opened right after construction.  The metric
    /// dump is created on the first successful construction.  Construction failures are logged
    /// and retried on the next call.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not enable exactly one sampling mode.
    pub fn initialize(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        let mode = match self.config.mode() {
            Some(mode) => mode,
            None => panic!("exactly one of event-based or time-based sampling must be enabled"),
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;

        // Another thread may have finished while we waited on the lock.
        if state.backend.is_some() {
            return;
        }

        let params = self.config.backend_params();
        let backend = match mode {
            SamplingMode::EventBased => self.factory.create_event_based(&params),
            SamplingMode::TimeBased => self.factory.create_time_based(&params),
        };

        let mut backend = match backend {
            Some(backend) => backend,
            None => {
                warn!("metrics discovery failed to initialize");
                return;
            },
        };
        info!("metrics discovery initialized ({:?}, metric set {})", mode, self.config.metric_set);

        if mode == SamplingMode::TimeBased && !backend.open_stream(STREAM_TIMER_PERIOD_NS, 0, 0) {
            warn!("metrics discovery: couldn't open the metric stream");
        }

        state.metric_names = backend.metric_names().into();

        if state.dump.is_none() {
            let header = DumpHeader {
                metric_names: state.metric_names.to_vec(),
                metric_units: backend.metric_units(),
                io_names: backend.io_measurement_names(),
                io_units: backend.io_measurement_units(),
                include_max_values: self.config.report_max,
            };

            let path = self.dump_path();
            match DumpSink::create(&path, &header) {
                Ok(dump) => {
                    debug!("writing metric dump to {}", path.display());
                    state.dump = Some(dump);
                },
                Err(e) => warn!("couldn't create metric dump {}: {}", path.display(), e),
            }
        }

        state.backend = Some(backend);
        self.initialized.store(true, Ordering::Release);
    }

    /// Resolves the performance counter queue extension for a platform.
    ///
    /// Resolution happens once per platform, and its outcome is remembered either way.
    pub(crate) fn perf_counters_queue(&self, platform: PlatformId) -> Option<Arc<dyn PerfCountersQueue>> {
        let mut extensions = self.extensions.lock();
        let dispatch = &self.dispatch;
        extensions
            .entry(platform)
            .or_insert_with(|| dispatch.perf_counters_queue(platform))
            .clone()
    }

    /// Drains every pending report from the hardware stream into the metric dump.
    ///
    /// Keeps converting until the backend has nothing left, so no samples stay behind when this
    /// returns.  Stream data is dumped but never aggregated.  Must only be called in time-based
    /// mode.
    ///
    /// Returns the number of report batches drained.
    pub fn drain_stream(&self) -> usize {
        debug_assert_eq!(
            self.config.mode(),
            Some(SamplingMode::TimeBased),
            "stream drained without time-based sampling"
        );

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let backend = match state.backend.as_mut() {
            Some(backend) => backend,
            None => return 0,
        };

        let mut batches = 0;
        while backend.save_reports_from_stream() {
            let mut report = backend.metrics_from_saved_reports();
            report.io_values = backend.io_measurement_info();

            if let Some(dump) = state.dump.as_mut() {
                if let Err(e) = dump.write_report(STREAM_SOURCE, &report) {
                    warn!("couldn't write stream metrics: {}", e);
                }
            }

            backend.reset_saved_reports();
            batches += 1;
        }

        if batches > 0 {
            debug!("drained {} report batches from the metric stream", batches);
        }

        batches
    }

    /// Reads the performance counter report of a completed event.
    ///
    /// The converted values are dumped and aggregated under `name`.  Driver failures are logged
    /// and leave the aggregation table untouched.  Must only be called in event-based mode.
    ///
    /// Returns `true` if a report was aggregated.
    pub fn extract_event_counters(&self, name: &str, event: Event) -> bool {
        debug_assert_eq!(
            self.config.mode(),
            Some(SamplingMode::EventBased),
            "event counters read without event-based sampling"
        );

        let report_size = match self.state.lock().backend.as_ref() {
            Some(backend) => backend.query_report_size(),
            None => return false,
        };

        REPORT_BUFFER.with(|buffer| {
            let mut buffer = buffer.borrow_mut();
            buffer.clear();
            buffer.resize(report_size, 0);

            let (status, written) =
                self.dispatch
                    .event_profiling_info(event, CL_PROFILING_COMMAND_PERFCOUNTERS_INTEL, &mut buffer[..]);
            if status != CL_SUCCESS {
                warn!(
                    "couldn't get MDAPI data! clGetEventProfilingInfo returned '{}' ({:08X})",
                    status_name(status),
                    status
                );
                return false;
            }

            debug_assert_eq!(written, report_size, "event report size mismatch");
            if written != report_size {
                error!(
                    "event report for {} is {} bytes, expected {}; dropping it",
                    name, written, report_size
                );
                return false;
            }

            self.record_event_report(name, &buffer[..])
        })
    }

    fn record_event_report(&self, name: &str, data: &[u8]) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let backend = match state.backend.as_mut() {
            Some(backend) => backend,
            None => return false,
        };

        let report = backend.metrics_from_reports(1, data);
        if report.is_empty() {
            return false;
        }

        if let Some(dump) = state.dump.as_mut() {
            if let Err(e) = dump.write_report(name, &report) {
                warn!("couldn't write metrics for {}: {}", name, e);
            }
        }

        // The aggregation lock is never taken while the session lock is held.
        let metric_names = Arc::clone(&state.metric_names);
        drop(guard);

        self.aggregations
            .lock()
            .aggregate(name, &metric_names, &report.values);
        true
    }

    /// Runs `f` against the aggregation table.
    ///
    /// Event extraction blocks while `f` runs.  `f` must not read the aggregations again, either
    /// through this method or through [`Session::report`].
    pub fn with_aggregations<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Aggregations) -> R,
    {
        f(&self.aggregations.lock())
    }

    /// Writes the summary of per-call-site metric averages.
    ///
    /// Writes nothing unless per-event timing and event-based sampling are both enabled and at
    /// least one report was aggregated.
    pub fn report<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if !self.config.per_event_timing || self.config.mode() != Some(SamplingMode::EventBased) {
            return Ok(());
        }

        write_report(&self.aggregations.lock(), w)
    }
}
