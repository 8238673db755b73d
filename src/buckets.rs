//! Dissolve-delay bucketing: groups neuron/maturity records into nine fixed
//! year ranges by their dissolve delay in months.

use crate::errors::MetricsError;

/// Fixed-point scale of raw ledger amounts.
pub const E8S_PER_TOKEN: f64 = 100_000_000.0;

/// Labels of the nine half-open intervals `[0,12) .. [96,inf)`, in months.
/// Shared by every bucketed category so all subtrees line up.
pub const BUCKET_LABELS: [&str; 9] = [
    "0-1 years",
    "1-2 years",
    "2-3 years",
    "3-4 years",
    "4-5 years",
    "5-6 years",
    "6-7 years",
    "7-8 years",
    "8+ years",
];

/// One raw record from a governance-metrics endpoint, amount still in e8s.
#[derive(Debug, Clone, Copy)]
pub struct BucketRecord {
    pub dissolve_delay_months: i64,
    pub amount_e8s: u64,
}

/// Index into [`BUCKET_LABELS`] for a dissolve delay. Negative delays are a
/// contract violation and rejected rather than misclassified.
pub fn bucket_index(months: i64) -> Result<usize, MetricsError> {
    if months < 0 {
        return Err(MetricsError::UnknownBucketKey { months });
    }
    Ok(((months / 12) as usize).min(BUCKET_LABELS.len() - 1))
}

/// Sum record amounts per range, scaled to whole tokens. The output always
/// carries all nine ranges (zero when empty) so downstream sums are total.
pub fn aggregate(records: &[BucketRecord]) -> Result<[f64; 9], MetricsError> {
    let mut out = [0.0; 9];
    for record in records {
        let idx = bucket_index(record.dissolve_delay_months)?;
        out[idx] += record.amount_e8s as f64 / E8S_PER_TOKEN;
    }
    Ok(out)
}
