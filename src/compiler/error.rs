//! Compilation errors.

/// Structural problems in a value column's part list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("column spec has no column part")]
    MissingColumn,

    #[error("column spec has more than one column part")]
    MultipleColumns,

    #[error("column spec has more than one alias part")]
    MultipleAliases,

    #[error("column spec has more than one aggregate or percentile part")]
    MultipleReducers,

    #[error("column spec has more than one window part of the same kind")]
    MultipleWindows,

    #[error("column spec combines a window part with a moving_window part")]
    ConflictingWindows,
}

/// Errors that can occur during compilation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid query shape: {0}")]
    InvalidQueryShape(ShapeError),

    #[error("Invalid query shape in select column {index}: {shape}")]
    InvalidSelectColumn { index: usize, shape: ShapeError },
}

impl CompileError {
    /// The underlying shape problem.
    pub fn shape(&self) -> ShapeError {
        match self {
            CompileError::InvalidQueryShape(shape) => *shape,
            CompileError::InvalidSelectColumn { shape, .. } => *shape,
        }
    }

    pub(crate) fn at_column(self, index: usize) -> Self {
        CompileError::InvalidSelectColumn {
            index,
            shape: self.shape(),
        }
    }
}

impl From<ShapeError> for CompileError {
    fn from(shape: ShapeError) -> Self {
        CompileError::InvalidQueryShape(shape)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
