use axum::Router;

use crate::AppState;
use crate::error::AppError;
use crate::models::DonationStatus;

pub mod admin;
pub mod auth;
pub mod causes;
pub mod donations;
pub mod seed;
pub mod uploads;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::auth_routes())
        .merge(causes::cause_routes())
        .merge(donations::donation_routes())
        .merge(uploads::upload_routes())
        .merge(seed::seed_routes())
        .nest("/admin", admin::admin_routes())
}

/// `None`, `""` and `"all"` select every status.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<DonationStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(AppError::Validation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_values() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("pending")).unwrap(),
            Some(DonationStatus::Pending)
        );
        assert!(parse_status_filter(Some("approved")).is_err());
    }
}
