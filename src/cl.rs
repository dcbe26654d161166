//! Driver ABI types used at the interception boundary.
#![allow(non_camel_case_types)]

use libc::c_void;

pub type cl_int = i32;
pub type cl_uint = u32;
pub type cl_ulong = u64;
pub type cl_bitfield = cl_ulong;
pub type cl_properties = cl_ulong;
pub type cl_command_queue_properties = cl_bitfield;
pub type cl_queue_properties = cl_properties;
pub type cl_profiling_info = cl_uint;

pub const CL_SUCCESS: cl_int = 0;
pub const CL_DEVICE_NOT_FOUND: cl_int = -1;
pub const CL_DEVICE_NOT_AVAILABLE: cl_int = -2;
pub const CL_OUT_OF_RESOURCES: cl_int = -5;
pub const CL_OUT_OF_HOST_MEMORY: cl_int = -6;
pub const CL_PROFILING_INFO_NOT_AVAILABLE: cl_int = -7;
pub const CL_INVALID_VALUE: cl_int = -30;
pub const CL_INVALID_DEVICE: cl_int = -33;
pub const CL_INVALID_CONTEXT: cl_int = -34;
pub const CL_INVALID_QUEUE_PROPERTIES: cl_int = -35;
pub const CL_INVALID_EVENT: cl_int = -58;
pub const CL_INVALID_OPERATION: cl_int = -59;

pub const CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE: cl_command_queue_properties = 1 << 0;
pub const CL_QUEUE_PROFILING_ENABLE: cl_command_queue_properties = 1 << 1;

pub const CL_QUEUE_PROPERTIES: cl_queue_properties = 0x1093;
pub const CL_QUEUE_PRIORITY_KHR: cl_queue_properties = 0x1096;
pub const CL_QUEUE_THROTTLE_KHR: cl_queue_properties = 0x1097;

/// Selects the raw performance counter report attached to a completed event.
pub const CL_PROFILING_COMMAND_PERFCOUNTERS_INTEL: cl_profiling_info = 0x407F;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub *mut c_void);

        // Driver handles are opaque tokens that the driver itself synchronizes.
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}

        impl $name {
            /// Whether this is the null handle.
            pub fn is_null(&self) -> bool { self.0.is_null() }
        }
    };
}

handle!(
    /// Opaque platform handle.
    PlatformId
);
handle!(
    /// Opaque context handle.
    Context
);
handle!(
    /// Opaque device handle.
    DeviceId
);
handle!(
    /// Opaque command queue handle.
    CommandQueue
);
handle!(
    /// Opaque event handle.
    Event
);

/// Gets the symbolic name of a driver status code.
pub fn status_name(code: cl_int) -> &'static str {
    match code {
        CL_SUCCESS => "CL_SUCCESS",
        CL_DEVICE_NOT_FOUND => "CL_DEVICE_NOT_FOUND",
        CL_DEVICE_NOT_AVAILABLE => "CL_DEVICE_NOT_AVAILABLE",
        CL_OUT_OF_RESOURCES => "CL_OUT_OF_RESOURCES",
        CL_OUT_OF_HOST_MEMORY => "CL_OUT_OF_HOST_MEMORY",
        CL_PROFILING_INFO_NOT_AVAILABLE => "CL_PROFILING_INFO_NOT_AVAILABLE",
        CL_INVALID_VALUE => "CL_INVALID_VALUE",
        CL_INVALID_DEVICE => "CL_INVALID_DEVICE",
        CL_INVALID_CONTEXT => "CL_INVALID_CONTEXT",
        CL_INVALID_QUEUE_PROPERTIES => "CL_INVALID_QUEUE_PROPERTIES",
        CL_INVALID_EVENT => "CL_INVALID_EVENT",
        CL_INVALID_OPERATION => "CL_INVALID_OPERATION",
        _ => "<Unknown>",
    }
}
