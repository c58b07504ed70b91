use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("cannot allocate {requested} bytes for a prepared template")]
    Alloc { requested: usize },

    #[error("prepared template size overflows usize")]
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// Negative return from the C formatter.
    #[error("formatter rejected the template (code {0})")]
    Format(i32),

    #[error("cannot allocate {requested} bytes for formatted output")]
    Alloc { requested: usize },

    #[error("formatter wrote {written} bytes, expected {expected}")]
    Truncated { expected: usize, written: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintError {
    #[error("prepare: {0}")]
    Prepare(#[from] PrepareError),

    #[error("emit: {0}")]
    Emit(#[from] EmitError),
}

pub type Result<T> = std::result::Result<T, PrintError>;
