use crate::cl::{
    cl_command_queue_properties, cl_int, cl_profiling_info, cl_uint, CommandQueue, Context, DeviceId, Event, PlatformId,
};
use std::sync::Arc;

/// The driver extension that creates command queues carrying performance counter payloads.
pub trait PerfCountersQueue: Send + Sync {
    /// Creates a queue bound to the metrics `configuration`.
    ///
    /// On failure, returns the driver's status code.
    fn create(
        &self, context: Context, device: DeviceId, properties: cl_command_queue_properties, configuration: cl_uint,
    ) -> Result<CommandQueue, cl_int>;
}

/// Entry points into the underlying driver.
pub trait Dispatch: Send + Sync {
    /// Gets the platform a device belongs to.
    fn platform_for_device(&self, device: DeviceId) -> PlatformId;

    /// Resolves the performance counter queue extension for a platform.
    ///
    /// Returns `None` when the platform does not expose it.
    fn perf_counters_queue(&self, platform: PlatformId) -> Option<Arc<dyn PerfCountersQueue>>;

    /// Queries profiling info for a completed event into `out`.
    ///
    /// Returns the driver status and the number of bytes the driver wrote.
    fn event_profiling_info(&self, event: Event, param_name: cl_profiling_info, out: &mut [u8]) -> (cl_int, usize);
}
