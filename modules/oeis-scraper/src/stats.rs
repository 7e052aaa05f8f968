use std::time::Duration;

/// Stats from one pipeline run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub processed: usize,
    pub triples_extracted: usize,
    pub triples_written: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub write_duration: Duration,
    pub total_duration: Duration,
}

impl RunStats {
    /// Average wall-clock seconds per processed identifier.
    /// Zero when nothing was processed.
    pub fn avg_secs_per_id(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.total_duration.as_secs_f64() / self.processed as f64
        }
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Pipeline Run Complete ===")?;
        writeln!(f, "Sequences processed: {}", self.processed)?;
        writeln!(f, "Triples extracted:   {}", self.triples_extracted)?;
        writeln!(f, "Triples written:     {}", self.triples_written)?;
        writeln!(f, "Batches:             {}", self.batches)?;
        if self.failed_batches > 0 {
            writeln!(f, "Failed batches:      {}", self.failed_batches)?;
        }
        writeln!(f, "Write time:          {:.2}s", self.write_duration.as_secs_f64())?;
        writeln!(f, "Total time:          {:.2}s", self.total_duration.as_secs_f64())?;
        writeln!(f, "Avg per sequence:    {:.2}s", self.avg_secs_per_id())?;
        Ok(())
    }
}
