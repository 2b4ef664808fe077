use std::fmt;

use drawsync_schemas::DrawRecord;
use serde::{Deserialize, Serialize};

/// Minimum count of distinct agreeing mirrors for a value to be trusted.
pub const AGREEMENT_THRESHOLD: usize = 2;

/// Exact-match fingerprint of a record:
/// `draw_no|n1,n2,n3,n4,n5,n6|bonus|YYYY-MM-DD` over the sorted numbers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one consensus decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusOutcome {
    pub draw_no: u32,
    pub signature: Signature,
    /// The first-seen record carrying the winning signature.
    pub record: DrawRecord,
    /// Distinct mirrors that produced the winning signature.
    pub support: usize,
    /// `support >= AGREEMENT_THRESHOLD`.
    pub agreed: bool,
    /// Names of the supporting mirrors, in input order.
    pub sources: Vec<String>,
}

impl ConsensusOutcome {
    pub fn summary(&self) -> ConsensusSummary {
        ConsensusSummary {
            draw_no: self.draw_no,
            signature: self.signature.clone(),
            support: self.support,
            agreed: self.agreed,
            sources: self.sources.clone(),
        }
    }
}

/// Serializable digest of a [`ConsensusOutcome`] for health reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    pub draw_no: u32,
    pub signature: Signature,
    pub support: usize,
    pub agreed: bool,
    pub sources: Vec<String>,
}
