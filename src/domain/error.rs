//! Domain error types.

/// A parse error with position information for script parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with the offending source line and a caret under the
    /// error column.
    pub fn display_with_context(&self, input: &str) -> String {
        let position = self.position.min(input.len());
        let line_start = input[..position].rfind('\n').map_or(0, |i| i + 1);
        let line_end = input[position..]
            .find('\n')
            .map_or(input.len(), |i| position + i);
        let line_no = input[..line_start].matches('\n').count() + 1;
        let column = input[line_start..position].chars().count();
        let caret = " ".repeat(column) + "^";
        format!(
            "line {line_no}: {line}\n{pad}{caret}\n{err}",
            line = &input[line_start..line_end],
            pad = " ".repeat(format!("line {line_no}: ").len()),
            err = self
        )
    }
}

/// Top-level error type for periodsim.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown model kind '{name}' (known: {known})")]
    UnknownModel { name: String, known: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cannot read {path}: {reason}")]
    DataRead { path: String, reason: String },

    #[error(transparent)]
    ScriptParse(#[from] ParseError),

    #[error("script error: {reason}")]
    ScriptRuntime { reason: String },

    #[error("variable '{name}' must be {expected}, found {found}")]
    ExtractionType {
        name: String,
        expected: String,
        found: String,
    },

    #[error("model '{model}' failed: {reason}")]
    ModelComputation { model: String, reason: String },

    #[error("{chart} chart requires variables not present: {}", missing.join(", "))]
    ChartPrecondition { chart: String, missing: Vec<String> },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SimError> for std::process::ExitCode {
    fn from(err: &SimError) -> Self {
        let code: u8 = match err {
            SimError::Io(_) | SimError::DataRead { .. } | SimError::Export { .. } => 1,
            SimError::UnknownModel { .. }
            | SimError::ConfigParse { .. }
            | SimError::ConfigMissing { .. }
            | SimError::ConfigInvalid { .. } => 2,
            SimError::ScriptParse(_) | SimError::ScriptRuntime { .. } => 4,
            SimError::ModelComputation { .. } => 5,
            SimError::ExtractionType { .. } => 6,
            SimError::ChartPrecondition { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
