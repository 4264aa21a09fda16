use thiserror::Error;

pub type PitResult<T> = Result<T, ModerationError>;

/// Errors raised by the pit engine. None of them are fatal to the bot; each is
/// recovered at the operation boundary.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Bad input, rejected before any ledger mutation.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A DM or log message could not be delivered. Never rolls back the ledger.
    #[error("notification delivery failed: {0}")]
    NotificationDelivery(String),

    /// The suspension flag could not be flipped, e.g. missing permissions.
    #[error("could not update suspension state: {0}")]
    ExternalState(String),

    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ModerationError {
    /// Whether the error is the caller's fault and can be shown back to them as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}
