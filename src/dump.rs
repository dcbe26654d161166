use crate::backend::MetricReport;
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// File name prefix of the metric dump.
pub const DUMP_FILE_PREFIX: &str = "clintercept_perfcounter_dump";

/// Gets the path of the metric dump for a metric set.
pub fn dump_path(directory: &Path, metric_set: &str) -> PathBuf {
    directory.join(format!("{}_{}.csv", DUMP_FILE_PREFIX, metric_set))
}

/// Column headers of the metric dump.
#[derive(Clone, Debug, Default)]
pub struct DumpHeader {
    pub metric_names: Vec<String>,
    pub metric_units: Vec<String>,
    pub io_names: Vec<String>,
    pub io_units: Vec<String>,
    pub include_max_values: bool,
}

/// CSV file receiving every converted metric report, unaggregated.
///
/// The two header rows are written when the file is created, so every data row that follows has
/// a matching column layout.
pub struct DumpSink<W: Write> {
    writer: W,
}

impl DumpSink<BufWriter<File>> {
    /// Creates the dump file at `path`, creating missing directories and truncating any
    /// existing file.
    pub fn create(path: &Path, header: &DumpHeader) -> io::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "dump path has no parent directory"))?;
        fs::create_dir_all(parent)?;

        let file = File::create(path)?;
        DumpSink::new(BufWriter::new(file), header)
    }
}

impl<W: Write> DumpSink<W> {
    /// Wraps `writer` and writes the header rows into it.
    pub fn new(writer: W, header: &DumpHeader) -> io::Result<Self> {
        let mut sink = DumpSink { writer };
        sink.write_header(header)?;
        Ok(sink)
    }

    fn write_header(&mut self, header: &DumpHeader) -> io::Result<()> {
        write!(self.writer, "name,")?;
        for name in &header.metric_names {
            write!(self.writer, "{},", name)?;
        }
        if header.include_max_values {
            for name in &header.metric_names {
                write!(self.writer, "max_{},", name)?;
            }
        }
        for name in &header.io_names {
            write!(self.writer, "{},", name)?;
        }
        writeln!(self.writer)?;

        write!(self.writer, ",")?;
        for unit in &header.metric_units {
            write!(self.writer, "{},", unit)?;
        }
        if header.include_max_values {
            for unit in &header.metric_units {
                write!(self.writer, "{},", unit)?;
            }
        }
        for unit in &header.io_units {
            write!(self.writer, "{},", unit)?;
        }
        writeln!(self.writer)?;

        self.writer.flush()
    }

    /// Writes one report as a row labeled with `source`.
    pub fn write_report(&mut self, source: &str, report: &MetricReport) -> io::Result<()> {
        write!(self.writer, "{},", source)?;
        let values = report.values.iter().chain(&report.max_values).chain(&report.io_values);
        for value in values {
            write!(self.writer, "{},", value)?;
        }
        writeln!(self.writer)?;

        self.writer.flush()
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W { &self.writer }
}
