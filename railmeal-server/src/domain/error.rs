//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from store/IO errors and from eligibility rejections.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Passenger details are incomplete or malformed
    #[error("invalid passenger details: {0}")]
    InvalidPassenger(&'static str),

    /// The cart has no lines with a positive quantity
    #[error("cart is empty")]
    EmptyCart,
}
