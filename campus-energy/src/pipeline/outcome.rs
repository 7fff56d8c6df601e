use std::collections::BTreeMap;

use energy_model::domain::Reading;

use super::{RejectReason, RejectedRow};

/// Result of one ingestion run: the clean set in file order plus the
/// rejection list.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub readings: Vec<Reading>,
    pub rejected: Vec<RejectedRow>,
    /// Readings whose `(building_id, timestamp)` was already seen.
    pub duplicates: usize,
    pub rows_read: usize,
    pub files_read: usize,
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    let len = s.len() as u32;
    hasher.update(&len.to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_f64(hasher: &mut blake3::Hasher, v: f64) {
    hasher.update(&v.to_bits().to_le_bytes());
}

impl IngestOutcome {
    pub fn accepted(&self) -> usize {
        self.readings.len()
    }

    pub fn rejection_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.rejected {
            *counts.entry(r.reason).or_insert(0) += 1;
        }
        counts
    }

    /// blake3 digest over the clean set, in order. Two runs over the same
    /// input produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut h = blake3::Hasher::new();
        for r in &self.readings {
            hash_str(&mut h, r.building_id());
            h.update(&r.timestamp().assume_utc().unix_timestamp_nanos().to_le_bytes());
            hash_f64(&mut h, r.usage_kwh());
        }
        h.finalize().to_hex().to_string()
    }
}
