use crate::{
    cl::{
        cl_command_queue_properties, cl_int, cl_queue_properties, status_name, CommandQueue, Context, DeviceId,
        CL_INVALID_OPERATION, CL_INVALID_QUEUE_PROPERTIES,
    },
    properties::translate_properties,
    session::Session,
};
use log::{info, warn};
use std::{error, fmt};

/// Errors during performance counter queue creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The property list named a property with no legacy bitfield equivalent.
    UnsupportedProperty,

    /// The platform does not expose the performance counter queue extension.
    ExtensionUnavailable,

    /// The metrics backend has not been constructed.
    NotInitialized,

    /// The metrics backend could not activate the metric set.
    ActivationFailed,

    /// The driver failed to create the queue.
    Driver(cl_int),
}

impl QueueError {
    /// Gets a driver status code to report to the application for this error.
    pub fn code(&self) -> cl_int {
        match *self {
            QueueError::Driver(code) => code,
            QueueError::UnsupportedProperty => CL_INVALID_QUEUE_PROPERTIES,
            _ => CL_INVALID_OPERATION,
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QueueError::UnsupportedProperty => write!(f, "unsupported queue property"),
            QueueError::ExtensionUnavailable => write!(f, "clCreatePerfCountersCommandQueueINTEL is unavailable"),
            QueueError::NotInitialized => write!(f, "metrics discovery is not initialized"),
            QueueError::ActivationFailed => write!(f, "couldn't activate metric set"),
            QueueError::Driver(code) => write!(f, "driver returned {} ({})", status_name(code), code),
        }
    }
}

impl error::Error for QueueError {}

impl Session {
    /// Creates a command queue that collects performance counters for the active metric set.
    ///
    /// Metric set activation, the configuration read and the driver call happen under the session
    /// lock, so concurrent callers on any device or context are serialized.
    pub fn create_command_queue(
        &self, context: Context, device: DeviceId, properties: cl_command_queue_properties,
    ) -> Result<CommandQueue, QueueError> {
        let platform = self.dispatch.platform_for_device(device);
        let extension = self.perf_counters_queue(platform);

        let mut state = self.state.lock();

        let extension = match extension {
            Some(extension) => extension,
            None => {
                warn!("couldn't get pointer to clCreatePerfCountersCommandQueueINTEL");
                return Err(QueueError::ExtensionUnavailable);
            },
        };

        let backend = match state.backend.as_mut() {
            Some(backend) => backend,
            None => {
                warn!("metrics discovery is not initialized");
                return Err(QueueError::NotInitialized);
            },
        };

        if !backend.activate_metric_set() {
            warn!("metrics discovery: couldn't activate metric set");
            return Err(QueueError::ActivationFailed);
        }

        let configuration = backend.metrics_configuration();
        info!(
            "calling clCreatePerfCountersCommandQueueINTEL with configuration {}",
            configuration
        );

        match extension.create(context, device, properties, configuration) {
            Ok(queue) => {
                info!("clCreatePerfCountersCommandQueueINTEL succeeded");
                Ok(queue)
            },
            Err(code) => {
                warn!(
                    "clCreatePerfCountersCommandQueueINTEL returned {} ({})",
                    status_name(code),
                    code
                );
                Err(QueueError::Driver(code))
            },
        }
    }

    /// Creates a performance counter queue from a zero-terminated property list.
    ///
    /// The list is translated to a legacy properties bitfield first.  If it holds a property the
    /// bitfield cannot express, no queue is created and nothing else happens.
    pub fn create_command_queue_with_properties(
        &self, context: Context, device: DeviceId, properties: Option<&[cl_queue_properties]>,
    ) -> Result<CommandQueue, QueueError> {
        match translate_properties(properties) {
            Some(bitfield) => self.create_command_queue(context, device, bitfield),
            None => Err(QueueError::UnsupportedProperty),
        }
    }
}
