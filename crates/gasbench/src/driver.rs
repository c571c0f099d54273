//! Enumerates sizes × variants and runs every scenario in order.
//!
//! Each scenario is self-contained: fresh inputs (unless [`InputPolicy::PerSize`]
//! is chosen), fresh contract instances, one estimate, one submission. The
//! first failure aborts the whole run.

use std::{iter::StepBy, ops::RangeInclusive};

use tracing::{Instrument, info, info_span};

use crate::{
    error::BenchError,
    generator::{InputBatch, InputGenerator},
    invoker::{GasMargin, OperationCall, invoke},
    ledger::Ledger,
    provisioner::ArtifactStore,
    report::ObservationSink,
    types::{BenchRun, CostObservation, Variant},
    workload::Workload,
};

/// Inclusive, ascending range of input sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    start: usize,
    end: usize,
    step: usize,
}

impl SizeRange {
    pub(crate) const STAKING: SizeRange = SizeRange {
        start: 100,
        end: 1000,
        step: 100,
    };
    pub(crate) const PAYEES: SizeRange = SizeRange {
        start: 100,
        end: 500,
        step: 100,
    };

    pub fn new(start: usize, end: usize, step: usize) -> Result<Self, BenchError> {
        if start == 0 || step == 0 || start > end {
            return Err(BenchError::InvalidSizeRange { start, end, step });
        }
        Ok(Self { start, end, step })
    }

    /// A size override given as optional bounds. All three bounds or none;
    /// `None` keeps each workload's own sizes.
    pub fn from_bounds(
        start: Option<usize>,
        end: Option<usize>,
        step: Option<usize>,
    ) -> Result<Option<Self>, BenchError> {
        match (start, end, step) {
            (None, None, None) => Ok(None),
            (Some(start), Some(end), Some(step)) => Self::new(start, end, step).map(Some),
            _ => Err(BenchError::PartialSizeRange),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn sizes(&self) -> StepBy<RangeInclusive<usize>> {
        (self.start..=self.end).step_by(self.step)
    }
}

/// How input batches are shared between the variants of one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
    /// Every scenario draws its own batch.
    #[default]
    PerScenario,
    /// Baseline and optimized of a size run on the same batch.
    PerSize,
}

/// One (workload, variant, size) combination with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub workload: Workload,
    pub variant: Variant,
    pub batch: InputBatch,
}

impl Scenario {
    pub fn new(workload: Workload, variant: Variant, batch: InputBatch) -> Self {
        Self {
            workload,
            variant,
            batch,
        }
    }

    pub fn size(&self) -> usize {
        self.batch.len()
    }

    pub fn operation(&self) -> String {
        self.variant.operation_name(self.workload.operation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Benchmark {
    pub workload: Workload,
    pub sizes: SizeRange,
    pub margin: GasMargin,
    pub input_policy: InputPolicy,
}

impl Benchmark {
    /// The workload with its built-in sizes and margin.
    pub fn new(workload: Workload) -> Self {
        Self {
            workload,
            sizes: workload.default_sizes(),
            margin: workload.gas_margin(),
            input_policy: InputPolicy::default(),
        }
    }

    pub fn with_sizes(mut self, sizes: SizeRange) -> Self {
        self.sizes = sizes;
        self
    }

    pub fn with_margin(mut self, margin: GasMargin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_input_policy(mut self, input_policy: InputPolicy) -> Self {
        self.input_policy = input_policy;
        self
    }

    /// Fails when the target contract lacks either variant of the operation.
    pub fn check_operations(&self, artifacts: &ArtifactStore) -> Result<(), BenchError> {
        let target = artifacts.get(self.workload.target_contract())?;
        for variant in Variant::ALL {
            let operation = variant.operation_name(self.workload.operation());
            if !target.has_function(&operation) {
                return Err(BenchError::UnknownOperation {
                    contract: target.name.clone(),
                    operation,
                });
            }
        }
        for contract in self.workload.contracts() {
            artifacts.get(contract)?;
        }
        Ok(())
    }
}

/// Runs every scenario of `benchmark`, handing each observation to `sink` as
/// soon as it is recorded.
pub async fn run(
    ledger: &dyn Ledger,
    artifacts: &ArtifactStore,
    generator: &mut InputGenerator,
    benchmark: &Benchmark,
    sink: &mut dyn ObservationSink,
) -> Result<Vec<CostObservation>, BenchError> {
    benchmark.check_operations(artifacts)?;

    let workload = benchmark.workload;
    let kind = workload.input_kind();
    let mut observations = Vec::new();

    for size in benchmark.sizes.sizes() {
        let shared = match benchmark.input_policy {
            InputPolicy::PerSize => Some(generator.generate(size, kind)?),
            InputPolicy::PerScenario => None,
        };

        for variant in Variant::ALL {
            let batch = match &shared {
                Some(batch) => batch.clone(),
                None => generator.generate(size, kind)?,
            };
            let scenario = Scenario::new(workload, variant, batch);
            let observation = run_scenario(ledger, artifacts, &scenario, benchmark.margin).await?;
            sink.record(&observation)?;
            observations.push(observation);
        }
    }

    Ok(observations)
}

pub async fn run_scenario(
    ledger: &dyn Ledger,
    artifacts: &ArtifactStore,
    scenario: &Scenario,
    margin: GasMargin,
) -> Result<CostObservation, BenchError> {
    let operation = scenario.operation();
    let span = info_span!(
        "scenario",
        workload = %scenario.workload,
        operation = %operation,
        size = scenario.size()
    );

    async move {
        info!("Running scenario");
        let provisioned = scenario
            .workload
            .provision(ledger, artifacts, &scenario.batch)
            .await?;
        let call = OperationCall::from_artifact(
            artifacts.get(scenario.workload.target_contract())?,
            &operation,
            provisioned.call_args,
        )?;
        let invocation = invoke(ledger, &provisioned.target, &call, margin).await?;
        info!(gas_used = invocation.gas_used, "Scenario finished");

        Ok(CostObservation {
            workload: scenario.workload.name().to_string(),
            variant: scenario.variant,
            operation,
            size: scenario.size(),
            unit: scenario.workload.unit().to_string(),
            input_shape: scenario.batch.shape(),
            estimated_gas: invocation.estimated_gas,
            budget: invocation.budget,
            gas_used: invocation.gas_used,
        })
    }
    .instrument(span)
    .await
}

/// Runs `benchmarks` one after another into a single [`BenchRun`].
pub async fn run_all(
    ledger: &dyn Ledger,
    artifacts: &ArtifactStore,
    generator: &mut InputGenerator,
    benchmarks: &[Benchmark],
    sink: &mut dyn ObservationSink,
) -> Result<BenchRun, BenchError> {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let mut observations = Vec::new();
    for benchmark in benchmarks {
        observations.extend(run(ledger, artifacts, generator, benchmark, sink).await?);
    }
    Ok(BenchRun {
        timestamp,
        workloads: benchmarks
            .iter()
            .map(|benchmark| benchmark.workload.name().to_string())
            .collect(),
        observations,
    })
}
