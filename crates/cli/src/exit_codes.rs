//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                           |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args)                            |
//! | 3    | Runtime error (unreadable file, bad CSV, write error) |
//! | 4    | Invalid config                                        |
//! | 5    | Input validation failed, run aborted                  |
//! | 6    | Reconciliation warnings present (`--strict` only)     |

use lanebook_alloc::AllocError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Ledger or config file could not be read, parsed or written.
pub const EXIT_RUNTIME: u8 = 3;

/// Config parse or validation error.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Validation mode rejected the input; no totals were produced.
pub const EXIT_VALIDATION: u8 = 5;

/// `--strict` and at least one reconciliation warning was collected.
pub const EXIT_WARNINGS: u8 = 6;

/// Map an engine error to its exit code.
pub fn alloc_exit_code(err: &AllocError) -> u8 {
    match err {
        AllocError::ConfigParse(_) | AllocError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        AllocError::MissingField { .. }
        | AllocError::DuplicateLeg(_)
        | AllocError::GrouperInvariant { .. } => EXIT_VALIDATION,
        AllocError::MissingColumn { .. } | AllocError::FieldParse { .. } | AllocError::Io(_) => {
            EXIT_RUNTIME
        }
        AllocError::WorkerPanicked(_) => EXIT_ERROR,
    }
}
