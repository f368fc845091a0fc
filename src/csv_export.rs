use csv::Writer;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Per-generation summary row written to the statistics CSV.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub generation: u32,
    pub ticks: u64,
    pub reason: &'static str,
    pub best_score: u32,
    pub best_score_ever: u32,
    pub mean_fitness: f64,
    pub max_fitness: f64,
    pub survivors: usize,
}

/// Buffered CSV writer for per-generation statistics.
pub struct BufferedCsvExporter {
    path: PathBuf,
    buffer: Vec<GenerationRecord>,
    buffer_size: usize,
}

impl BufferedCsvExporter {
    pub fn new(path: &Path, buffer_size: usize) -> Self {
        Self {
            path: path.to_owned(),
            buffer: Vec::with_capacity(buffer_size),
            buffer_size,
        }
    }

    pub fn add_record(&mut self, record: GenerationRecord) -> Result<(), Box<dyn Error>> {
        self.buffer.push(record);

        if self.buffer.len() >= self.buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Box<dyn Error>> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let file_exists = self.path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = Writer::from_writer(file);

        // Write header if file is new
        if !file_exists {
            writer.write_record([
                "generation",
                "ticks",
                "reason",
                "best_score",
                "best_score_ever",
                "mean_fitness",
                "max_fitness",
                "survivors",
            ])?;
        }

        for record in &self.buffer {
            writer.write_record([
                record.generation.to_string(),
                record.ticks.to_string(),
                record.reason.to_string(),
                record.best_score.to_string(),
                record.best_score_ever.to_string(),
                record.mean_fitness.to_string(),
                record.max_fitness.to_string(),
                record.survivors.to_string(),
            ])?;
        }

        writer.flush()?;
        self.buffer.clear();

        Ok(())
    }

    pub fn finish(mut self) -> Result<(), Box<dyn Error>> {
        self.flush()?;
        Ok(())
    }
}
