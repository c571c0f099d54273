use crate::{
    error::BenchError,
    types::{Comparison, CostObservation, Variant},
};

/// Pairs each baseline observation with the optimized observation of the same
/// workload and size. Sizes without both variants are skipped.
///
/// Each optimized observation is paired at most once, in recording order, so a
/// workload that ran twice yields one comparison per run.
pub fn compare(observations: &[CostObservation]) -> Result<Vec<Comparison>, BenchError> {
    let mut comparisons = Vec::new();
    let mut paired = vec![false; observations.len()];

    for baseline in observations
        .iter()
        .filter(|o| o.variant == Variant::Baseline)
    {
        let Some(index) = observations.iter().enumerate().position(|(i, o)| {
            !paired[i]
                && o.variant == Variant::Optimized
                && o.workload == baseline.workload
                && o.size == baseline.size
        }) else {
            continue;
        };
        paired[index] = true;
        let optimized = &observations[index];

        if optimized.input_shape != baseline.input_shape {
            return Err(BenchError::IncomparableShapes {
                workload: baseline.workload.clone(),
                size: baseline.size,
                baseline: baseline.input_shape,
                optimized: optimized.input_shape,
            });
        }

        let delta = i128::from(optimized.gas_used) - i128::from(baseline.gas_used);
        let change_percent = if baseline.gas_used == 0 {
            0.0
        } else {
            (delta as f64 / baseline.gas_used as f64) * 100.0
        };

        comparisons.push(Comparison {
            workload: baseline.workload.clone(),
            size: baseline.size,
            unit: baseline.unit.clone(),
            baseline_gas: baseline.gas_used,
            optimized_gas: optimized.gas_used,
            delta,
            change_percent,
        });
    }

    Ok(comparisons)
}
