use std::borrow::Cow;

/// Errors raised by a [`Store`](crate::Store) and its cells.
#[arbor_derive::arbor_error]
pub enum StoreError {
    /// The change feed needs room for at least one transaction.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A computed was read again while its own derivation was running.
    #[error("Cycle detected{}: {message}", format_context(.context))]
    Cycle { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
