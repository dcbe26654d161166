use crate::aggregate::Aggregations;
use std::io::{self, Write};

const NAME_WIDTH: usize = 44;
const CALLS_WIDTH: usize = 6;

/// Writes the end-of-run summary of per-call-site metric averages.
///
/// Columns come from the metric order of the first call site, each as wide as its metric name.
/// Every call site is assumed to report the same metrics in that order.  Writes nothing when the
/// table is empty.
pub fn write_report<W: Write>(aggregations: &Aggregations, w: &mut W) -> io::Result<()> {
    let first = match aggregations.call_sites().next() {
        Some(first) => first,
        None => return Ok(()),
    };

    let mut header = String::new();
    let mut widths = Vec::new();
    for (name, _) in first.metrics() {
        header.push_str(name);
        header.push_str(", ");
        widths.push(name.len());
    }

    writeln!(w)?;
    writeln!(w, "Device Performance Counter Timing: (Average metric per enqueue)")?;
    write!(
        w,
        "{:>nw$}, {:>cw$}, {}",
        "FunctionName",
        "Calls",
        header,
        nw = NAME_WIDTH,
        cw = CALLS_WIDTH
    )?;

    for call_site in aggregations.call_sites() {
        writeln!(w)?;
        write!(
            w,
            "{:>nw$}, {:>cw$}, ",
            call_site.name(),
            call_site.calls(),
            nw = NAME_WIDTH,
            cw = CALLS_WIDTH
        )?;

        for (i, (_, aggregate)) in call_site.metrics().enumerate() {
            let width = widths.get(i).cloned().unwrap_or(0);
            write!(w, "{:>width$}, ", aggregate.mean(), width = width)?;
        }
    }

    writeln!(w)
}
