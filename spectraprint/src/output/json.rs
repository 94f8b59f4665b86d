use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tsbeam::spectra::SpectraRecord;

/// Appends `SpectraRecord`s to a JSON-lines file.
pub struct JsonLinesWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonLinesWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let file = File::create(&path)
            .with_context(|| format!("creating spectra stream {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, record: &SpectraRecord) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .with_context(|| format!("encoding record for {}", self.path.display()))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))
    }
}
