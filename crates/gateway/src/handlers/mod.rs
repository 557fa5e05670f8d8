//! API handlers module

pub mod affiliation;
pub mod health;
pub mod search;

use quyca_common::errors::{AppError, Result};
use quyca_common::hierarchy::Tier;
use quyca_common::metrics::RequestMetrics;

/// Parse the `{typ}` path segment of routes that require a known tier
pub(crate) fn parse_tier(typ: &str) -> Result<Tier> {
    typ.parse::<Tier>().map_err(|message| AppError::InvalidFormat { message })
}

/// Status code recorded for a handler outcome
pub(crate) fn status_of<T>(result: &Result<T>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    }
}

/// Record the request, rejected input included, and hand the result back
pub(crate) fn observe<T>(metrics: RequestMetrics, result: Result<T>) -> Result<T> {
    metrics.finish(status_of(&result));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_maps_errors() {
        let ok: Result<()> = Ok(());
        assert_eq!(status_of(&ok), 200);

        let missing: Result<()> = Err(AppError::AffiliationNotFound { id: "x".into() });
        assert_eq!(status_of(&missing), 404);

        let down: Result<()> = Err(AppError::CollaboratorUnavailable {
            collaborator: "work_counter".into(),
            message: "timed out".into(),
        });
        assert_eq!(status_of(&down), 503);
    }

    #[test]
    fn test_rejected_input_is_observed_as_400() {
        let rejected = async {
            parse_tier("journal")?;
            Ok::<(), AppError>(())
        };
        let result = observe(
            RequestMetrics::start("GET", "/search/affiliations/{typ}"),
            tokio_test::block_on(rejected),
        );
        assert_eq!(status_of(&result), 400);
        assert!(matches!(result, Err(AppError::InvalidFormat { .. })));
    }

    #[test]
    fn test_parse_tier_accepts_synonyms() {
        assert_eq!(parse_tier("Education").unwrap(), Tier::Institution);
        assert_eq!(parse_tier("group").unwrap(), Tier::Group);
    }

    #[test]
    fn test_parse_tier_rejects_unknown() {
        let err = parse_tier("journal").unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
