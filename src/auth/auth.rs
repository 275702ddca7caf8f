use crate::config::Config;
use crate::models::Claims;
use crate::perm::{resolve_role, PermissionContext, Role};
use actix_web::{dev::Payload, error::ErrorUnauthorized, web::Data, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

/// The authenticated session, extracted once per request. This is the
/// session store of the permission resolver: handlers take the role
/// from here and pass it into the `perm` functions explicitly.
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )))
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        // Unknown role names degrade to Employee-level visibility
        // rather than failing the request.
        let role = resolve_role(Some(&data.claims.role));

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    /// Salary and payroll screens are MD/PD only.
    pub fn require_salary_role(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Md | Role::Pd) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("MD/PD only"))
        }
    }

    /// Audit log access is MD/PD only.
    pub fn require_audit_role(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Md | Role::Pd) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("MD/PD only"))
        }
    }

    /// Organization-wide employee data (show/update/delete) is MD/PD
    /// only.
    pub fn require_employee_data_role(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Md | Role::Pd) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("MD/PD only"))
        }
    }

    /// The caller must have `target` inside its subordinate scope.
    pub fn require_scope_over(&self, target: Role) -> actix_web::Result<()> {
        if crate::perm::can_manage(self.role, target) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(
                "Target role outside your scope",
            ))
        }
    }

    /// Permission context for record-level decisions, built fresh per
    /// request.
    pub fn ctx(&self) -> PermissionContext<'_> {
        PermissionContext::new(self.role, self.employee_id.as_deref())
    }
}
