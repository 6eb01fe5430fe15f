use modwire_core::errors::ResolverError;

#[test]
fn internal_error_display() {
    let err = ResolverError::Internal {
        message: "fixpoint bound exceeded".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "internal resolver error: fixpoint bound exceeded"
    );
}

#[test]
fn cancelled_error_display() {
    let err = ResolverError::Cancelled { round: 3 };
    assert_eq!(err.to_string(), "resolve cancelled during round 3");
}
