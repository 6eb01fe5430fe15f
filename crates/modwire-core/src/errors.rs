use miette::Diagnostic;
use thiserror::Error;

/// Fatal resolver errors.
///
/// Per-module problems (unresolved mandatory requirements, uneliminated
/// use-constraint violations) are not errors: they are collected in the
/// resolution report alongside whatever wiring was achieved. An error from
/// this enum aborts the whole resolve and never returns a partial wiring.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    /// The round or fixpoint iteration bound was exceeded. The bounds are
    /// derived from the total candidate count, which monotonic disabling
    /// cannot outrun, so hitting one indicates a resolver defect.
    #[error("internal resolver error: {message}")]
    #[diagnostic(help("this indicates a defect in the resolver, not in the input resources"))]
    Internal { message: String },

    /// The cancellation signal was observed between rounds.
    #[error("resolve cancelled during round {round}")]
    Cancelled { round: usize },
}

/// Convenience alias for resolver results.
pub type ResolverResult<T> = Result<T, ResolverError>;
