use std::fmt;

use serde::Serialize;

/// Counters for one enrichment pass.
///
/// Kept separate so operators can tell "no lineage found" (empty responses)
/// from "service unreachable" (transport failures).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    pub query_objects: usize,
    pub batches: usize,
    pub rows: usize,
    pub derived: usize,
    pub dropped_rows: usize,
    pub empty_responses: usize,
    pub decode_failures: usize,
    pub transport_failures: usize,
}

impl EnrichmentStats {
    /// Every batch failed before the service answered.
    #[must_use]
    pub const fn service_unreachable(&self) -> bool {
        self.batches > 0 && self.transport_failures == self.batches
    }

    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.transport_failures > 0 || self.decode_failures > 0
    }
}

impl fmt::Display for EnrichmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities in {} batches, {} rows, {} derived, {} dropped, \
             {} empty, {} undecodable, {} unreachable",
            self.query_objects,
            self.batches,
            self.rows,
            self.derived,
            self.dropped_rows,
            self.empty_responses,
            self.decode_failures,
            self.transport_failures
        )
    }
}
