use crate::api::actions::{ActionItem, ActionListResponse};
use crate::api::attendance::{
    AddAttendance, AttendanceFilter, AttendanceListResponse, RejectAttendance, UpdateAttendance,
};
use crate::api::audit::{AuditListResponse, AuditQuery};
use crate::api::employee::{EmployeeListResponse, EmployeeQuery, OnboardEmployee};
use crate::api::leave_request::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveType, RejectLeave,
};
use crate::api::payroll::{CreatePayroll, PaginatedPayrollResponse, PayrollQuery, UpdatePayroll};
use crate::api::request::{
    ActOnRequest, CreateRequest, RequestAction, RequestFilter, RequestListResponse, RequestType,
};
use crate::model::attendance::Attendance;
use crate::model::audit::AuditLog;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveRequest;
use crate::model::payroll::Payroll;
use crate::model::request::WorkflowRequest;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SparkHR API",
        version = "1.0.0",
        description = r#"
## SparkPro Employee Management System

This API powers the employee-management backend for SparkPro Fire
Controls: role-scoped search and onboarding, attendance and leave
review workflows, payroll, workflow requests and the audit trail.

### 🔹 Key Features
- **Role-scoped visibility**
  - Navigation actions, search scopes and row-level approve/reject
    controls all derive from one canonical role hierarchy
- **Attendance & Leave**
  - Pending records can be edited, approved, rejected (with a review
    comment) or deleted; approved/rejected records are locked
- **Employee Management**
  - Onboarding constrained to the caller's subordinate roles
- **Payroll & Requests**
  - Payroll generation (MD/PD), advance-salary and other workflow
    requests with an approver inbox

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication**. What a
caller can see and do is decided by their role's subordinate scope.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::actions::list_actions,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::delete_leave,

        crate::api::attendance::add_attendance,
        crate::api::attendance::attendance_list,
        crate::api::attendance::update_attendance,
        crate::api::attendance::approve_attendance,
        crate::api::attendance::reject_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::employee::onboard_employee,
        crate::api::employee::get_employee,
        crate::api::employee::search_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,

        crate::api::request::create_request,
        crate::api::request::act_on_request,
        crate::api::request::request_list,

        crate::api::audit::list_audits,
        crate::api::audit::audits_by_entity
    ),
    components(
        schemas(
            ActionItem,
            ActionListResponse,
            AddAttendance,
            UpdateAttendance,
            RejectAttendance,
            AttendanceFilter,
            AttendanceListResponse,
            Attendance,
            AuditQuery,
            AuditListResponse,
            AuditLog,
            OnboardEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee,
            LeaveType,
            CreateLeave,
            RejectLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            PaginatedPayrollResponse,
            Payroll,
            RequestType,
            RequestAction,
            CreateRequest,
            ActOnRequest,
            RequestFilter,
            RequestListResponse,
            WorkflowRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Actions", description = "Role-filtered navigation catalog"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Request", description = "Workflow request APIs"),
        (name = "Audit", description = "Audit trail APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
