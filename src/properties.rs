use crate::cl::{
    cl_command_queue_properties, cl_queue_properties, CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE, CL_QUEUE_PRIORITY_KHR,
    CL_QUEUE_PROFILING_ENABLE, CL_QUEUE_PROPERTIES, CL_QUEUE_THROTTLE_KHR,
};

/// Converts a zero-terminated list of queue property pairs into a legacy properties bitfield.
///
/// Returns `None` if the list names a property, or a property value, that has no bitfield
/// equivalent.  Priority and throttle hints are informational and are dropped.
///
/// The list must be terminated by a zero key.  If the slice runs out first, the end of the slice
/// is treated as the terminator.
pub fn translate_properties(properties: Option<&[cl_queue_properties]>) -> Option<cl_command_queue_properties> {
    let mut bitfield = 0;

    let properties = match properties {
        Some(properties) => properties,
        None => return Some(bitfield),
    };

    for pair in properties.chunks(2) {
        let key = pair[0];
        if key == 0 {
            break;
        }

        let value = match pair.get(1) {
            Some(value) => *value,
            None => break,
        };

        match key {
            CL_QUEUE_PROPERTIES => {
                if !is_supported_queue_properties(value) {
                    return None;
                }
                bitfield |= value;
            },
            CL_QUEUE_PRIORITY_KHR | CL_QUEUE_THROTTLE_KHR => {},
            _ => return None,
        }
    }

    Some(bitfield)
}

fn is_supported_queue_properties(value: cl_queue_properties) -> bool {
    value & !(CL_QUEUE_PROFILING_ENABLE | CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE) == 0
}
