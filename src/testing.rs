//! Test doubles for the metrics backend and the driver.
use crate::{
    backend::{BackendFactory, BackendParams, MetricReport, MetricsBackend},
    cl::{
        cl_command_queue_properties, cl_int, cl_profiling_info, cl_uint, CommandQueue, Context, DeviceId, Event,
        PlatformId, CL_INVALID_EVENT, CL_PROFILING_COMMAND_PERFCOUNTERS_INTEL, CL_SUCCESS,
    },
    configuration::SamplingMode,
    dispatch::{Dispatch, PerfCountersQueue},
    value::TypedValue,
};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tempfile::TempDir;

pub(crate) fn init_logging() { let _ = env_logger::builder().is_test(true).try_init(); }

/// Gets an empty scratch directory, removed when the guard drops.
pub(crate) fn temp_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("devperf-{}-", name))
        .tempdir()
        .expect("failed to create scratch directory")
}

pub(crate) fn handle(id: usize) -> *mut libc::c_void { id as *mut libc::c_void }

pub(crate) fn event(id: usize) -> Event { Event(handle(id)) }

/// Encodes counter values the way `MockBackend` decodes query reports.
pub(crate) fn encode(values: &[u64]) -> Vec<u8> { values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect() }

pub(crate) fn stream_report(values: &[u64]) -> MetricReport {
    MetricReport {
        values: values.iter().map(|v| TypedValue::U64(*v)).collect(),
        max_values: Vec::new(),
        io_values: vec![TypedValue::U32(0)],
    }
}

/// Counts overlapping entries into the span between metric set activation and queue creation.
#[derive(Default)]
pub(crate) struct CriticalSection {
    busy: AtomicBool,
    pub overlaps: AtomicUsize,
}

impl CriticalSection {
    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn leave(&self) {
        // Widen the window so unserialized callers would collide.
        thread::sleep(Duration::from_millis(1));
        self.busy.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct MockState {
    pub names: Vec<String>,
    pub units: Vec<String>,
    pub mode: Option<SamplingMode>,
    pub params: Option<BackendParams>,
    pub constructions: usize,
    pub open_stream_ok: bool,
    pub streams_opened: Vec<(u32, u32, u32)>,
    pub activate_ok: bool,
    pub activations: usize,
    pub configuration: u32,
    pub stream: VecDeque<MetricReport>,
    pub saved: Option<MetricReport>,
    pub resets: usize,
    pub critical: Option<Arc<CriticalSection>>,
}

impl Default for MockState {
    fn default() -> MockState {
        MockState {
            names: vec!["GpuTime".to_owned(), "EuActive".to_owned()],
            units: vec!["ns".to_owned(), "percent".to_owned()],
            mode: None,
            params: None,
            constructions: 0,
            open_stream_ok: true,
            streams_opened: Vec::new(),
            activate_ok: true,
            activations: 0,
            configuration: 42,
            stream: VecDeque::new(),
            saved: None,
            resets: 0,
            critical: None,
        }
    }
}

pub(crate) struct MockBackend {
    state: Arc<Mutex<MockState>>,
    include_max_values: bool,
}

impl MetricsBackend for MockBackend {
    fn open_stream(&mut self, timer_period_ns: u32, buffer_size: u32, pid: u32) -> bool {
        let mut state = self.state.lock();
        state.streams_opened.push((timer_period_ns, buffer_size, pid));
        state.open_stream_ok
    }

    fn activate_metric_set(&mut self) -> bool {
        let mut state = self.state.lock();
        state.activations += 1;
        if let Some(critical) = state.critical.as_ref() {
            critical.enter();
        }
        state.activate_ok
    }

    fn metrics_configuration(&self) -> u32 { self.state.lock().configuration }

    fn query_report_size(&self) -> usize { self.state.lock().names.len() * 8 }

    fn metrics_from_reports(&mut self, count: u32, data: &[u8]) -> MetricReport {
        assert_eq!(count, 1);

        let values: Vec<TypedValue> = data
            .chunks(8)
            .filter(|chunk| chunk.len() == 8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                TypedValue::U64(u64::from_le_bytes(raw))
            })
            .collect();

        let max_values = if self.include_max_values { values.clone() } else { Vec::new() };
        MetricReport {
            values,
            max_values,
            io_values: Vec::new(),
        }
    }

    fn save_reports_from_stream(&mut self) -> bool {
        let mut state = self.state.lock();
        let next = state.stream.pop_front();
        match next {
            Some(report) => {
                state.saved = Some(report);
                true
            },
            None => false,
        }
    }

    fn metrics_from_saved_reports(&mut self) -> MetricReport {
        let mut report = self.state.lock().saved.clone().unwrap_or_default();
        report.io_values.clear();
        report
    }

    fn io_measurement_info(&mut self) -> Vec<TypedValue> {
        self.state
            .lock()
            .saved
            .as_ref()
            .map(|saved| saved.io_values.clone())
            .unwrap_or_default()
    }

    fn reset_saved_reports(&mut self) {
        let mut state = self.state.lock();
        state.saved = None;
        state.resets += 1;
    }

    fn metric_names(&self) -> Vec<String> { self.state.lock().names.clone() }

    fn metric_units(&self) -> Vec<String> { self.state.lock().units.clone() }

    fn io_measurement_names(&self) -> Vec<String> { vec!["ReportsLost".to_owned()] }

    fn io_measurement_units(&self) -> Vec<String> { vec!["reports".to_owned()] }
}

pub(crate) struct MockFactory {
    pub state: Arc<Mutex<MockState>>,
    pub available: Arc<Mutex<bool>>,
}

impl MockFactory {
    pub fn new() -> MockFactory {
        MockFactory {
            state: Arc::new(Mutex::new(MockState::default())),
            available: Arc::new(Mutex::new(true)),
        }
    }

    fn create(&self, mode: SamplingMode, params: &BackendParams) -> Option<Box<dyn MetricsBackend>> {
        if !*self.available.lock() {
            return None;
        }

        let mut state = self.state.lock();
        state.constructions += 1;
        state.mode = Some(mode);
        state.params = Some(params.clone());

        Some(Box::new(MockBackend {
            state: Arc::clone(&self.state),
            include_max_values: params.include_max_values,
        }))
    }
}

impl BackendFactory for MockFactory {
    fn create_event_based(&self, params: &BackendParams) -> Option<Box<dyn MetricsBackend>> {
        self.create(SamplingMode::EventBased, params)
    }

    fn create_time_based(&self, params: &BackendParams) -> Option<Box<dyn MetricsBackend>> {
        self.create(SamplingMode::TimeBased, params)
    }
}

pub(crate) struct MockQueue {
    pub result: Result<usize, cl_int>,
    pub calls: Mutex<Vec<(cl_command_queue_properties, cl_uint)>>,
    pub critical: Option<Arc<CriticalSection>>,
}

impl MockQueue {
    pub fn new(result: Result<usize, cl_int>) -> Arc<MockQueue> {
        Arc::new(MockQueue {
            result,
            calls: Mutex::new(Vec::new()),
            critical: None,
        })
    }

    pub fn with_critical(result: Result<usize, cl_int>, critical: Arc<CriticalSection>) -> Arc<MockQueue> {
        Arc::new(MockQueue {
            result,
            calls: Mutex::new(Vec::new()),
            critical: Some(critical),
        })
    }
}

impl PerfCountersQueue for MockQueue {
    fn create(
        &self, _context: Context, _device: DeviceId, properties: cl_command_queue_properties, configuration: cl_uint,
    ) -> Result<CommandQueue, cl_int> {
        self.calls.lock().push((properties, configuration));
        if let Some(critical) = self.critical.as_ref() {
            critical.leave();
        }
        self.result.map(|id| CommandQueue(handle(id)))
    }
}

/// What the driver does when asked for an event's counter report.
#[derive(Clone)]
pub(crate) enum EventReply {
    Report(Vec<u8>),
    Truncated(Vec<u8>),
    Fail(cl_int),
}

pub(crate) struct MockDispatch {
    pub queue: Option<Arc<MockQueue>>,
    pub resolutions: AtomicUsize,
    pub events: Mutex<HashMap<usize, EventReply>>,
}

impl MockDispatch {
    pub fn new(queue: Option<Arc<MockQueue>>) -> Arc<MockDispatch> {
        Arc::new(MockDispatch {
            queue,
            resolutions: AtomicUsize::new(0),
            events: Mutex::new(HashMap::new()),
        })
    }

    pub fn reply(&self, id: usize, reply: EventReply) { self.events.lock().insert(id, reply); }
}

impl Dispatch for MockDispatch {
    fn platform_for_device(&self, _device: DeviceId) -> PlatformId { PlatformId(handle(0x1)) }

    fn perf_counters_queue(&self, _platform: PlatformId) -> Option<Arc<dyn PerfCountersQueue>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.queue.clone().map(|queue| queue as Arc<dyn PerfCountersQueue>)
    }

    fn event_profiling_info(&self, event: Event, param_name: cl_profiling_info, out: &mut [u8]) -> (cl_int, usize) {
        assert_eq!(param_name, CL_PROFILING_COMMAND_PERFCOUNTERS_INTEL);

        let reply = self.events.lock().get(&(event.0 as usize)).cloned();
        match reply {
            Some(EventReply::Report(data)) => {
                if data.len() > out.len() {
                    return (crate::cl::CL_INVALID_VALUE, 0);
                }
                out[..data.len()].copy_from_slice(&data);
                (CL_SUCCESS, data.len())
            },
            Some(EventReply::Truncated(data)) => {
                let len = data.len().min(out.len());
                out[..len].copy_from_slice(&data[..len]);
                (CL_SUCCESS, len)
            },
            Some(EventReply::Fail(code)) => (code, 0),
            None => (CL_INVALID_EVENT, 0),
        }
    }
}
