use std::io::{self, Write};

use crate::types::{BenchRun, Comparison, CostObservation};

/// Receives observations as the driver records them.
pub trait ObservationSink {
    fn record(&mut self, observation: &CostObservation) -> io::Result<()>;
}

impl ObservationSink for Vec<CostObservation> {
    fn record(&mut self, observation: &CostObservation) -> io::Result<()> {
        self.push(observation.clone());
        Ok(())
    }
}

/// Writes one human-readable line per observation.
pub struct ConsoleReporter<W> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl ConsoleReporter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ObservationSink for ConsoleReporter<W> {
    fn record(&mut self, observation: &CostObservation) -> io::Result<()> {
        writeln!(self.out, "{}", format_observation(observation))?;
        self.out.flush()
    }
}

pub fn format_observation(observation: &CostObservation) -> String {
    format!(
        "Gas used for {} with {} {}: {}",
        observation.operation, observation.size, observation.unit, observation.gas_used
    )
}

pub fn to_json(run: &BenchRun) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(run)
}

pub fn to_markdown(comparisons: &[Comparison]) -> String {
    let mut md = String::new();

    md.push_str("## Gas benchmark summary\n\n");

    if comparisons.is_empty() {
        md.push_str("No baseline/optimized pairs recorded.\n");
        return md;
    }

    md.push_str("| Workload | Size | Baseline gas | Optimized gas | Delta | Change |\n");
    md.push_str("|----------|------|--------------|---------------|-------|--------|\n");
    for c in comparisons {
        md.push_str(&format!(
            "| {} | {} {} | {} | {} | {:+} | {:+.1}% |\n",
            c.workload, c.size, c.unit, c.baseline_gas, c.optimized_gas, c.delta, c.change_percent
        ));
    }

    md
}
