/// Cumulative transcript assembled from recognition results.
///
/// Results are addressed by slot index; a newer result for an existing slot
/// replaces it (interim → final). The text is every slot concatenated in
/// index order, without separators: engines carry their own spacing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    segments: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` for slot `index`.
    ///
    /// Slots skipped over stay empty until filled.
    pub fn apply(&mut self, index: usize, text: &str) {
        if index >= self.segments.len() {
            self.segments.resize(index + 1, String::new());
        }
        self.segments[index] = text.to_string();
    }

    pub fn text(&self) -> String {
        self.segments.concat()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
