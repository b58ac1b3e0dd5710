use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown order or a token that does not match it. The two are
    /// deliberately indistinguishable to callers.
    #[error("order not found")]
    OrderNotFound,

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::OrderNotFound => "ORDER_NOT_FOUND",
            AppError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}
