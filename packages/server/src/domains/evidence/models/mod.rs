pub mod document;
pub mod evidence;

pub use document::{EvidenceDocument, NewEvidenceDocument};
pub use evidence::{Evidence, EvidenceChanges, EvidenceStatus, EvidenceType, NewEvidence};
