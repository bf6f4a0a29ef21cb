use arbor_reactive::StoreError;
use std::borrow::Cow;

/// Errors raised while defining, constructing or using model instances.
///
/// Construction errors describe schema-definition bugs, not data conditions;
/// nothing is retried.
#[arbor_derive::arbor_error]
pub enum ModelError {
    /// The snapshot is not a plain object, is already managed, or names an undeclared key.
    #[error("Invalid snapshot{}: {message}", format_context(.context))]
    InvalidSnapshot { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A value expected to be primitive is not.
    #[error("Expected a primitive value{}: got {message}", format_context(.context))]
    InvalidPrimitive { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A computed base-model field declares a setter.
    #[error("Computed field '{key}' must not declare a setter{}", format_context(.context))]
    InvalidComputedField { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A base-model field holds something that cannot be materialized.
    #[error("Invalid base model field '{key}'{}: {message}", format_context(.context))]
    InvalidBaseModelField {
        key: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// The name is not part of the sealed field set.
    #[error("Unknown field '{key}'{}", format_context(.context))]
    UnknownField { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Computed fields cannot be assigned.
    #[error("Field '{key}' is read-only{}", format_context(.context))]
    ReadOnlyField { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Data read as a method or a method read as data.
    #[error("Invalid access to field '{key}'{}: {message}", format_context(.context))]
    InvalidAccess {
        key: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// The reactive store could not be configured.
    #[error("Store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    /// Invariant violations and errors raised by user actions.
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
