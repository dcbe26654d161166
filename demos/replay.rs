//! Replays synthetic counter reports through a `Session` and prints the summary.
//!
//! There is no real device behind this: a small software backend stands in for metrics
//! discovery, and a fake driver hands out reports for made-up events.
#[macro_use]
extern crate log;

use devperf::{
    cl::{
        cl_command_queue_properties, cl_int, cl_profiling_info, cl_uint, CommandQueue, Context, DeviceId, Event,
        PlatformId, CL_SUCCESS,
    },
    BackendFactory, BackendParams, Dispatch, MetricReport, MetricsBackend, PerfCountersQueue, SamplingMode, Session,
    StreamPoller, TypedValue,
};
use getopts::Options;
use std::{
    env, io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

const METRICS: &[(&str, &str)] = &[("GpuTime", "ns"), ("EuActive", "percent"), ("EuStall", "percent")];

fn synthetic(seed: u64) -> Vec<TypedValue> {
    vec![
        TypedValue::U64(1_000 + (seed * 7919) % 500),
        TypedValue::F32(40.0 + (seed % 20) as f32),
        TypedValue::F32(5.0 + (seed % 5) as f32),
    ]
}

struct ReplayBackend {
    pending: u64,
    next: u64,
}

impl MetricsBackend for ReplayBackend {
    fn open_stream(&mut self, timer_period_ns: u32, _buffer_size: u32, _pid: u32) -> bool {
        info!("replay stream opened with a {}ns period", timer_period_ns);
        true
    }

    fn activate_metric_set(&mut self) -> bool { true }

    fn metrics_configuration(&self) -> u32 { 1 }

    fn query_report_size(&self) -> usize { 8 }

    fn metrics_from_reports(&mut self, _count: u32, data: &[u8]) -> MetricReport {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&data[..8]);
        MetricReport {
            values: synthetic(u64::from_le_bytes(raw)),
            ..Default::default()
        }
    }

    fn save_reports_from_stream(&mut self) -> bool { self.pending > 0 }

    fn metrics_from_saved_reports(&mut self) -> MetricReport {
        self.next += 1;
        MetricReport {
            values: synthetic(self.next),
            ..Default::default()
        }
    }

    fn io_measurement_info(&mut self) -> Vec<TypedValue> { vec![TypedValue::U32(0)] }

    fn reset_saved_reports(&mut self) { self.pending = self.pending.saturating_sub(1); }

    fn metric_names(&self) -> Vec<String> { METRICS.iter().map(|(name, _)| name.to_string()).collect() }

    fn metric_units(&self) -> Vec<String> { METRICS.iter().map(|(_, unit)| unit.to_string()).collect() }

    fn io_measurement_names(&self) -> Vec<String> { vec!["ReportsLost".to_owned()] }

    fn io_measurement_units(&self) -> Vec<String> { vec!["reports".to_owned()] }
}

struct ReplayFactory {
    stream_reports: u64,
}

impl BackendFactory for ReplayFactory {
    fn create_event_based(&self, _params: &BackendParams) -> Option<Box<dyn MetricsBackend>> {
        Some(Box::new(ReplayBackend { pending: 0, next: 0 }))
    }

    fn create_time_based(&self, _params: &BackendParams) -> Option<Box<dyn MetricsBackend>> {
        Some(Box::new(ReplayBackend {
            pending: self.stream_reports,
            next: 0,
        }))
    }
}

struct ReplayQueue {
    next: AtomicU64,
}

impl PerfCountersQueue for ReplayQueue {
    fn create(
        &self, _context: Context, _device: DeviceId, _properties: cl_command_queue_properties, _configuration: cl_uint,
    ) -> Result<CommandQueue, cl_int> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(CommandQueue(id as usize as *mut _))
    }
}

struct ReplayDriver {
    queue: Arc<ReplayQueue>,
}

impl Dispatch for ReplayDriver {
    fn platform_for_device(&self, _device: DeviceId) -> PlatformId { PlatformId(1 as *mut _) }

    fn perf_counters_queue(&self, _platform: PlatformId) -> Option<Arc<dyn PerfCountersQueue>> {
        Some(self.queue.clone() as Arc<dyn PerfCountersQueue>)
    }

    fn event_profiling_info(&self, event: Event, _param_name: cl_profiling_info, out: &mut [u8]) -> (cl_int, usize) {
        let seed = (event.0 as usize as u64).to_le_bytes();
        out[..8].copy_from_slice(&seed);
        (CL_SUCCESS, 8)
    }
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

pub fn opts() -> Options {
    let mut opts = Options::new();

    opts.optopt("m", "mode", "sampling mode: ebs or tbs", "MODE");
    opts.optopt("n", "events", "number of events or stream reports to replay", "INTEGER");
    opts.optopt("d", "dump-dir", "directory to write the metric dump into", "PATH");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = opts();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            error!("Failed to parse command line args: {}", f);
            return;
        },
    };

    if matches.opt_present("help") {
        print_usage(program, &opts);
        return;
    }

    let mode = match matches.opt_str("mode").as_deref() {
        None | Some("ebs") => SamplingMode::EventBased,
        Some("tbs") => SamplingMode::TimeBased,
        Some(other) => {
            error!("unknown sampling mode '{}'", other);
            return;
        },
    };
    let count = matches
        .opt_str("events")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(64);
    let dump_dir = matches
        .opt_str("dump-dir")
        .unwrap_or_else(|| env::temp_dir().join("devperf").to_string_lossy().into_owned());

    let driver = Arc::new(ReplayDriver {
        queue: Arc::new(ReplayQueue { next: AtomicU64::new(0x1000) }),
    });
    let session = Arc::new(
        Session::builder()
            .metric_set("ComputeBasic")
            .sampling_mode(mode)
            .per_event_timing(true)
            .dump_directory(&dump_dir)
            .build(Box::new(ReplayFactory { stream_reports: count }), driver),
    );
    session.initialize();

    match session.create_command_queue(Context(1 as *mut _), DeviceId(1 as *mut _), 0) {
        Ok(queue) => info!("created counter queue {:?}", queue),
        Err(e) => error!("couldn't create counter queue: {}", e),
    }

    match mode {
        SamplingMode::EventBased => {
            let kernels = ["vector_add", "reduce", "transpose"];
            for i in 1..=count {
                let name = kernels[(i as usize) % kernels.len()];
                session.extract_event_counters(name, Event(i as usize as *mut _));
            }
        },
        SamplingMode::TimeBased => {
            let poller = match StreamPoller::spawn(Arc::clone(&session), Duration::from_millis(10)) {
                Ok(poller) => poller,
                Err(e) => {
                    error!("couldn't start the stream poller: {}", e);
                    return;
                },
            };
            thread::sleep(Duration::from_millis(50));
            poller.stop();
        },
    }

    println!("metric dump written to {}", session.dump_path().display());
    if let Err(e) = session.report(&mut io::stdout()) {
        error!("couldn't write report: {}", e);
    }
}
