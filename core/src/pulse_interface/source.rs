use crate::prelude::{BeamError, BeamResult};
use crate::pulse_interface::{OpsInfo, Pulse};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Supplier of a sequential pulse stream.
///
/// `Ok(None)` means the stream is exhausted. Errors are fatal for the
/// reader that owns the source.
pub trait PulseSource {
    fn next_pulse(&mut self) -> BeamResult<Option<Pulse>>;

    /// Operating parameters currently in force.
    fn ops_info(&self) -> &OpsInfo;
}

/// Pulse source backed by an in-memory list.
pub struct VecPulseSource {
    ops: OpsInfo,
    pulses: VecDeque<Pulse>,
}

impl VecPulseSource {
    pub fn new(ops: OpsInfo, pulses: Vec<Pulse>) -> Self {
        Self {
            ops,
            pulses: pulses.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pulses.len()
    }
}

impl PulseSource for VecPulseSource {
    fn next_pulse(&mut self) -> BeamResult<Option<Pulse>> {
        Ok(self.pulses.pop_front())
    }

    fn ops_info(&self) -> &OpsInfo {
        &self.ops
    }
}

/// Reads a JSON-lines pulse stream: the first record is the `OpsInfo`,
/// every following record one `Pulse`.
pub struct JsonLinesPulseSource<R: BufRead> {
    reader: R,
    ops: OpsInfo,
    line: String,
    line_num: usize,
}

impl JsonLinesPulseSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> BeamResult<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|err| {
            BeamError::Source(format!("opening {}: {}", path_ref.display(), err))
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: BufRead> JsonLinesPulseSource<R> {
    pub fn from_reader(reader: R) -> BeamResult<Self> {
        let mut source = Self {
            reader,
            ops: OpsInfo::default(),
            line: String::new(),
            line_num: 0,
        };
        if !source.read_record()? {
            return Err(BeamError::Source("pulse stream has no header".into()));
        }
        source.ops = serde_json::from_str(source.line.trim()).map_err(|err| {
            BeamError::Source(format!("line {}: bad ops info: {}", source.line_num, err))
        })?;
        Ok(source)
    }

    /// Loads the next non-blank line into `self.line`.
    fn read_record(&mut self) -> BeamResult<bool> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            self.line_num += 1;
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead> PulseSource for JsonLinesPulseSource<R> {
    fn next_pulse(&mut self) -> BeamResult<Option<Pulse>> {
        if !self.read_record()? {
            return Ok(None);
        }
        let pulse = serde_json::from_str(self.line.trim()).map_err(|err| {
            BeamError::Source(format!("line {}: bad pulse: {}", self.line_num, err))
        })?;
        Ok(Some(pulse))
    }

    fn ops_info(&self) -> &OpsInfo {
        &self.ops
    }
}

/// Writes a stream readable by `JsonLinesPulseSource`.
pub fn write_pulse_stream<W: Write>(
    mut writer: W,
    ops: &OpsInfo,
    pulses: &[Pulse],
) -> BeamResult<()> {
    serde_json::to_writer(&mut writer, ops)?;
    writer.write_all(b"\n")?;
    for pulse in pulses {
        serde_json::to_writer(&mut writer, pulse)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
