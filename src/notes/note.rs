pub use crate::domain::types::Note;
