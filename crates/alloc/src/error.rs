use thiserror::Error;

/// Fatal engine errors. Any of these aborts the run; totals are never partial.
#[derive(Debug, Error)]
pub enum AllocError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (bad prefix, out-of-range thresholds, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Missing required column in the ledger CSV.
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    /// A field value in the ledger CSV could not be parsed.
    #[error("row {row}, leg '{leg_id}': cannot parse {field} '{value}'")]
    FieldParse {
        row: usize,
        leg_id: String,
        field: &'static str,
        value: String,
    },

    /// A leg record is missing a field the engine requires.
    #[error("leg '{leg_id}': missing required field '{field}'")]
    MissingField { leg_id: String, field: &'static str },

    /// The same leg id appears more than once in the input.
    #[error("duplicate leg id '{0}'")]
    DuplicateLeg(String),

    /// An FTL order reached allocation without a market-touching main leg.
    #[error("order '{order_id}': FTL group has no market-touching main leg")]
    GrouperInvariant { order_id: String },

    /// A sharded worker thread panicked.
    #[error("allocation worker {0} panicked")]
    WorkerPanicked(usize),

    /// IO / CSV reader error.
    #[error("IO error: {0}")]
    Io(String),
}

impl AllocError {
    /// True for errors raised by input validation rather than config or IO.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::DuplicateLeg(_) | Self::GrouperInvariant { .. }
        )
    }
}
