//! Output sinks for matched tracks.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::OutputFormat;
use crate::library::Track;

pub trait TrackSink {
    fn add_track(&mut self, track: &Track) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

fn open_writer(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write + Send>>> {
    let inner: Box<dyn Write + Send> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Sink: Failed to create {:?}", path))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    Ok(BufWriter::new(inner))
}

/// One JSON object per line.
pub struct JsonlSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl JsonlSink {
    pub fn new(path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            writer: open_writer(path)?,
        })
    }
}

impl TrackSink for JsonlSink {
    fn add_track(&mut self, track: &Track) -> Result<()> {
        serde_json::to_writer(&mut self.writer, track)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// A single JSON array, written as tracks arrive.
pub struct JsonSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    count: usize,
}

impl JsonSink {
    pub fn new(path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            writer: open_writer(path)?,
            count: 0,
        })
    }
}

impl TrackSink for JsonSink {
    fn add_track(&mut self, track: &Track) -> Result<()> {
        self.writer
            .write_all(if self.count == 0 { b"[\n" } else { b",\n" })?;
        serde_json::to_writer_pretty(&mut self.writer, track)?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.count == 0 {
            self.writer.write_all(b"[")?;
        }
        self.writer.write_all(b"\n]\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn init_sink(format: OutputFormat, path: Option<&Path>) -> Result<Box<dyn TrackSink>> {
    match path {
        Some(path) => tracing::info!("Sink: {:?} -> {:?}", format, path),
        None => tracing::info!("Sink: {:?} -> stdout", format),
    }
    Ok(match format {
        OutputFormat::Jsonl => Box::new(JsonlSink::new(path)?),
        OutputFormat::Json => Box::new(JsonSink::new(path)?),
    })
}
