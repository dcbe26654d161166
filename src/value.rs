use std::fmt::{self, Display};

/// A metric value as produced by the metrics backend.
///
/// Each value carries its native type, which determines how it is summed and averaged.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    /// An unsigned 32-bit counter or derived value.
    U32(u32),

    /// An unsigned 64-bit counter or derived value.
    U64(u64),

    /// A floating point derived value, such as a percentage or a rate.
    F32(f32),

    /// A flag.
    ///
    /// Flags aggregate as `U64` values of 0 or 1, so their mean reads as "how many calls had the
    /// flag set", truncated.
    Bool(bool),

    /// A string value.
    ///
    /// Strings can be dumped but never aggregate.
    Text(String),
}

impl TypedValue {
    /// Gets the zero value used to seed a running sum of this value's type.
    ///
    /// Returns `None` for values that do not aggregate.
    pub(crate) fn zero(&self) -> Option<TypedValue> {
        match self {
            TypedValue::U32(_) => Some(TypedValue::U32(0)),
            TypedValue::U64(_) | TypedValue::Bool(_) => Some(TypedValue::U64(0)),
            TypedValue::F32(_) => Some(TypedValue::F32(0.0)),
            TypedValue::Text(_) => None,
        }
    }

    /// Adds `other` to this running sum.
    ///
    /// Integer sums wrap rather than overflow.  Values whose type does not match the sum are
    /// ignored, and `false` is returned.
    pub(crate) fn accumulate(&mut self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::U32(sum), TypedValue::U32(v)) => *sum = sum.wrapping_add(*v),
            (TypedValue::U64(sum), TypedValue::U64(v)) => *sum = sum.wrapping_add(*v),
            (TypedValue::U64(sum), TypedValue::Bool(v)) => *sum = sum.wrapping_add(*v as u64),
            (TypedValue::F32(sum), TypedValue::F32(v)) => *sum += *v,
            _ => return false,
        }

        true
    }

    /// Divides this sum by `count`, using the division native to the value's type.
    pub(crate) fn mean(&self, count: u64) -> TypedValue {
        if count == 0 {
            return self.clone();
        }

        match self {
            TypedValue::U32(sum) => TypedValue::U32((u64::from(*sum) / count) as u32),
            TypedValue::U64(sum) => TypedValue::U64(*sum / count),
            TypedValue::F32(sum) => TypedValue::F32(*sum / count as f32),
            other => other.clone(),
        }
    }
}

/// Renders a float with six significant digits, dropping trailing zeros, in the style of C's `%g`.
fn significant(v: f32) -> String {
    const DIGITS: i32 = 6;

    if v == 0.0 || !v.is_finite() {
        return v.to_string();
    }

    // Round first, so the exponent reflects values like 999999.5 rolling over.
    let scientific = format!("{:.*e}", (DIGITS - 1) as usize, v);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_owned()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Pass the formatter through so width and alignment apply to the value.
        match self {
            TypedValue::U32(v) => Display::fmt(v, f),
            TypedValue::U64(v) => Display::fmt(v, f),
            TypedValue::F32(v) => f.pad(&significant(*v)),
            TypedValue::Bool(v) => Display::fmt(&(*v as u8), f),
            TypedValue::Text(v) => f.pad(v),
        }
    }
}
