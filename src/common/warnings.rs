use serde::Serialize;

/// Non-fatal degradations collected over a run (missing bands, failed windows, ...).
/// Every entry is also emitted as a `tracing` warning when recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self { Self::default() }

    /// Record a warning raised by `stage`.
    pub fn push(&mut self, stage: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stage = stage, "{message}");
        self.0.push(format!("[{stage}] {message}"));
    }

    #[inline] pub fn len(&self) -> usize { self.0.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }
}
