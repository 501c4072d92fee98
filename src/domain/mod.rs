//! Domain vocabulary: the note record, speech events and layer contracts.

pub mod traits;
pub mod types;
