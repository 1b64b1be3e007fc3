use axum::{
    extract::{Path, State},
    Json,
};

use crate::{services::serviceability::ServiceabilityStatus, AppState};

/// Whether delivery is offered for a pincode. Lookup failures report the
/// pincode as not serviceable rather than erroring.
#[utoipa::path(
    get,
    path = "/api/v1/serviceability/{pincode}",
    params(("pincode" = String, Path, description = "Delivery postal code")),
    responses((status = 200, description = "Serviceability for the pincode", body = ServiceabilityStatus)),
    tag = "Serviceability"
)]
pub async fn check_pincode(
    State(state): State<AppState>,
    Path(pincode): Path<String>,
) -> Json<ServiceabilityStatus> {
    Json(state.services.serviceability.check(&pincode).await)
}
