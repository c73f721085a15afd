use serde::{Deserialize, Serialize};

/// Outcome of checking a record batch before transformation.
///
/// `is_valid` is false only for structural failures; everything else lowers
/// `confidence` or adds warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub confidence: f64,
}

impl ValidationResult {
    /// A passing result with the given confidence and no messages.
    pub fn valid(confidence: f64) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            confidence,
        }
    }

    /// A structural failure: invalid, confidence 0, one error.
    pub fn structural_failure(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Adds a warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Adds a warning and scales confidence by `factor`.
    pub fn warn_scaled(&mut self, warning: impl Into<String>, factor: f64) {
        self.warn(warning);
        self.confidence *= factor;
    }

    /// Marks the result as structurally failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.confidence = 0.0;
        self.errors.push(error.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
