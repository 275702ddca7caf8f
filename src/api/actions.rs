use crate::auth::auth::AuthUser;
use crate::perm::{visible_actions, ACTION_CATALOG};
use actix_web::{HttpResponse, Responder};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ActionItem {
    #[schema(example = "Add/Update Attendance")]
    pub label: String,
    #[schema(example = "/attendanceupdate")]
    pub route: String,
}

#[derive(Serialize, ToSchema)]
pub struct ActionListResponse {
    pub data: Vec<ActionItem>,
}

/// Navigation entries visible to the caller's role, in catalog order.
#[utoipa::path(
    get,
    path = "/api/v1/actions",
    responses(
        (status = 200, description = "Actions visible to the caller", body = ActionListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Actions"
)]
pub async fn list_actions(auth: AuthUser) -> impl Responder {
    let data = visible_actions(auth.role, ACTION_CATALOG)
        .into_iter()
        .map(|action| ActionItem {
            label: action.label.to_string(),
            route: action.route.to_string(),
        })
        .collect::<Vec<_>>();

    HttpResponse::Ok().json(ActionListResponse { data })
}
