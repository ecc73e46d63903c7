use super::http_auth::{authenticate, require, require_self_or, ApiError};
use super::http_errors::{
    map_account_error, map_pass_error, map_report_error, map_schedule_error,
};
use super::http_parse::{
    parse_contact_method, parse_day, parse_duration_unit, parse_payment_method, parse_role,
};
use super::http_types::*;
use super::state::AppState;
use crate::application::{
    NewClass, NewPassDefinition, RegisterAccount, ReportWindow, UpdateAccount, UpdateClass,
    UpdatePassDefinition,
};
use crate::domain::{Capability, PassDuration, Role, Slot};
use axum::{
    extract::{Path, Query, State},
    http::{header::HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
        .route("/auth/profile", get(profile))
        .route("/accounts", get(list_accounts))
        .route("/accounts/next-id/:role", get(next_account_id))
        .route("/accounts/role/:role", get(list_accounts_by_role))
        .route("/accounts/:id", get(get_account).put(update_account).delete(delete_account))
        .route("/accounts/:id/promote/instructor", post(promote_instructor))
        .route("/accounts/:id/promote/manager", post(promote_manager))
        .route("/accounts/:id/demote", post(demote))
        .route("/classes", post(create_class).get(list_classes))
        .route("/classes/all", get(list_all_classes))
        .route("/classes/instructor/:id", get(instructor_classes))
        .route("/classes/:id", get(get_class).put(update_class).delete(delete_class))
        .route("/classes/:id/register", post(register_for_class))
        .route("/classes/:id/cancel", post(cancel_registration))
        .route("/classes/:id/attendance", post(mark_attendance).get(class_attendance))
        .route("/passes", post(create_pass).get(list_passes))
        .route("/passes/all", get(list_all_passes))
        .route("/passes/:id", get(get_pass).put(update_pass).delete(delete_pass))
        .route("/passes/:id/purchase", post(purchase_pass))
        .route("/my/passes", get(my_passes))
        .route("/my/passes/active", get(my_active_passes))
        .route("/my/passes/valid", get(has_valid_pass))
        .route("/reports/performance", get(performance_report))
        .route("/reports/instructor-performance", get(instructor_performance_report))
        .route("/reports/customer-attendance", get(customer_attendance_report))
        .route("/reports/general-attendance", get(general_attendance_report))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        register,
        login,
        logout,
        change_password,
        profile,
        list_accounts,
        next_account_id,
        list_accounts_by_role,
        get_account,
        update_account,
        delete_account,
        promote_instructor,
        promote_manager,
        demote,
        create_class,
        list_classes,
        list_all_classes,
        instructor_classes,
        get_class,
        update_class,
        delete_class,
        register_for_class,
        cancel_registration,
        mark_attendance,
        class_attendance,
        create_pass,
        list_passes,
        list_all_passes,
        get_pass,
        update_pass,
        delete_pass,
        purchase_pass,
        my_passes,
        my_active_passes,
        has_valid_pass,
        performance_report,
        instructor_performance_report,
        customer_attendance_report,
        general_attendance_report,
    ),
    components(schemas(
        HealthResponse,
        MessageResponse,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        ChangePasswordRequest,
        UpdateAccountRequest,
        PromoteInstructorRequest,
        PromoteManagerRequest,
        AccountResponse,
        NextIdResponse,
        InstructorProfileResponse,
        ManagerProfileResponse,
        SlotRequest,
        SlotResponse,
        CreateClassRequest,
        UpdateClassRequest,
        RegistrationResponse,
        ClassResponse,
        RegisterForClassRequest,
        AttendanceRequest,
        AttendeeResponse,
        AttendanceResponse,
        CreatePassRequest,
        UpdatePassRequest,
        PassDefinitionResponse,
        PurchaseRequest,
        OwnedPassResponse,
        ValidPassResponse,
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and credential management"),
        (name = "Accounts", description = "Account and role management"),
        (name = "Classes", description = "Class scheduling, registration and attendance"),
        (name = "Passes", description = "Pass definitions and purchases"),
        (name = "Reports", description = "Manager-only business reports"),
    ),
    info(
        title = "Yoga Track API",
        version = "0.1.0",
        description = "Yoga studio management: accounts, classes, passes, attendance and reports",
        license(name = "MIT OR Apache-2.0")
    )
)]
struct ApiDoc;

/// Health check endpoint
///
/// Verifies database connectivity and returns service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed: DB connectivity issue");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    error: Some("Database connectivity failed".to_string()),
                }),
            )
        }
    }
}

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

fn parse_slots(slots: Vec<SlotRequest>) -> Result<Vec<Slot>, ApiError> {
    slots
        .into_iter()
        .map(|s| {
            let day = parse_day(&s.day)
                .ok_or_else(|| bad_request(format!("Invalid day: {}", s.day)))?;
            Ok(Slot {
                day,
                time: s.time,
                duration_minutes: s.duration_minutes,
            })
        })
        .collect()
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid payload", body = Object),
        (status = 409, description = "Email already registered", body = Object)
    )
)]
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| bad_request(e.to_string().replace('\n', "; ")))?;
    let preferred_contact = parse_contact_method(&req.preferred_contact)
        .ok_or_else(|| bad_request(format!("Invalid contact method: {}", req.preferred_contact)))?;
    let role = parse_role(&req.role)
        .ok_or_else(|| bad_request(format!("Invalid role: {}", req.role)))?;

    let account = state
        .accounts
        .register(RegisterAccount {
            firstname: req.firstname,
            lastname: req.lastname,
            email: req.email,
            phone: req.phone,
            address: req.address,
            preferred_contact,
            role,
            password: req.password,
        })
        .await
        .map_err(|e| map_account_error(&e, "Failed to register account"))?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = Object)
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (token, account) = state
        .accounts
        .login(&req.email, &req.password)
        .await
        .map_err(|e| map_account_error(&e, "Failed to log in"))?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token,
            account: account.into(),
        }),
    ))
}

/// Log out
///
/// Tokens are stateless; this acknowledges the logout so clients can discard
/// theirs.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = Object)
    )
)]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short", body = Object),
        (status = 401, description = "Current password wrong", body = Object)
    )
)]
async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    state
        .accounts
        .change_password(&claims.sub, &req.current_password, &req.new_password)
        .await
        .map_err(|e| map_account_error(&e, "Failed to change password"))?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password changed".to_string(),
        }),
    ))
}

/// The caller's own account
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Caller's account", body = AccountResponse),
        (status = 401, description = "Not authenticated", body = Object)
    )
)]
async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    let account = state
        .accounts
        .get_account(&claims.sub)
        .await
        .map_err(|e| map_account_error(&e, "Failed to fetch profile"))?;

    Ok((StatusCode::OK, Json(AccountResponse::from(account))))
}

/// List all accounts (manager)
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "All accounts", body = [AccountResponse]),
        (status = 403, description = "Not a manager", body = Object)
    )
)]
async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;

    let accounts = state
        .accounts
        .list_accounts()
        .await
        .map_err(|e| map_account_error(&e, "Failed to list accounts"))?;
    let body: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Preview the ID the next account of a role would receive (manager)
#[utoipa::path(
    get,
    path = "/accounts/next-id/{role}",
    tag = "Accounts",
    params(("role" = String, Path, description = "client, instructor or manager")),
    responses(
        (status = 200, description = "Next ID", body = NextIdResponse),
        (status = 400, description = "Invalid role", body = Object)
    )
)]
async fn next_account_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;
    let role = parse_role(&role).ok_or_else(|| bad_request(format!("Invalid role: {}", role)))?;

    let next_id = state
        .accounts
        .next_account_id(role)
        .await
        .map_err(|e| map_account_error(&e, "Failed to compute next ID"))?;
    Ok((
        StatusCode::OK,
        Json(NextIdResponse {
            role: role.to_string(),
            next_id,
        }),
    ))
}

/// List accounts by role (manager)
#[utoipa::path(
    get,
    path = "/accounts/role/{role}",
    tag = "Accounts",
    params(("role" = String, Path, description = "client, instructor or manager")),
    responses(
        (status = 200, description = "Matching accounts", body = [AccountResponse]),
        (status = 400, description = "Invalid role", body = Object)
    )
)]
async fn list_accounts_by_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;
    let role = parse_role(&role).ok_or_else(|| bad_request(format!("Invalid role: {}", role)))?;

    let accounts = state
        .accounts
        .list_by_role(role)
        .await
        .map_err(|e| map_account_error(&e, "Failed to list accounts"))?;
    let body: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Fetch one account (self or manager)
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Account not found", body = Object)
    )
)]
async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require_self_or(&claims, &id, Capability::ManageAccounts)?;

    let account = state
        .accounts
        .get_account(&id)
        .await
        .map_err(|e| map_account_error(&e, "Failed to fetch account"))?;
    Ok((StatusCode::OK, Json(AccountResponse::from(account))))
}

/// Update contact fields (self or manager). Role and ID never change here.
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 404, description = "Account not found", body = Object),
        (status = 409, description = "Email already registered", body = Object)
    )
)]
async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require_self_or(&claims, &id, Capability::ManageAccounts)?;

    let preferred_contact = match req.preferred_contact {
        Some(raw) => Some(
            parse_contact_method(&raw)
                .ok_or_else(|| bad_request(format!("Invalid contact method: {}", raw)))?,
        ),
        None => None,
    };

    let account = state
        .accounts
        .update_account(
            &id,
            UpdateAccount {
                firstname: req.firstname,
                lastname: req.lastname,
                email: req.email,
                phone: req.phone,
                address: req.address,
                preferred_contact,
            },
        )
        .await
        .map_err(|e| map_account_error(&e, "Failed to update account"))?;
    Ok((StatusCode::OK, Json(AccountResponse::from(account))))
}

/// Delete an account (manager)
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 404, description = "Account not found", body = Object)
    )
)]
async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;

    state
        .accounts
        .delete_account(&id)
        .await
        .map_err(|e| map_account_error(&e, "Failed to delete account"))?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Account {} deleted", id),
        }),
    ))
}

/// Promote a client to instructor (manager)
#[utoipa::path(
    post,
    path = "/accounts/{id}/promote/instructor",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    request_body = PromoteInstructorRequest,
    responses(
        (status = 201, description = "Instructor profile created", body = InstructorProfileResponse),
        (status = 404, description = "Account not found", body = Object),
        (status = 409, description = "Already promoted", body = Object)
    )
)]
async fn promote_instructor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<PromoteInstructorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;

    let profile = state
        .accounts
        .promote_to_instructor(&id, req.specialties)
        .await
        .map_err(|e| map_account_error(&e, "Failed to promote account"))?;
    Ok((StatusCode::CREATED, Json(InstructorProfileResponse::from(profile))))
}

/// Promote a client to manager (manager)
#[utoipa::path(
    post,
    path = "/accounts/{id}/promote/manager",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    request_body = PromoteManagerRequest,
    responses(
        (status = 201, description = "Manager profile created", body = ManagerProfileResponse),
        (status = 404, description = "Account not found", body = Object),
        (status = 409, description = "Already promoted", body = Object)
    )
)]
async fn promote_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<PromoteManagerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;

    let profile = state
        .accounts
        .promote_to_manager(&id, req.department)
        .await
        .map_err(|e| map_account_error(&e, "Failed to promote account"))?;
    Ok((StatusCode::CREATED, Json(ManagerProfileResponse::from(profile))))
}

/// Revert an instructor or manager to client (manager)
#[utoipa::path(
    post,
    path = "/accounts/{id}/demote",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account demoted", body = MessageResponse),
        (status = 400, description = "Account is already a client", body = Object),
        (status = 404, description = "Account not found", body = Object)
    )
)]
async fn demote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageAccounts)?;

    let account = state
        .accounts
        .get_account(&id)
        .await
        .map_err(|e| map_account_error(&e, "Failed to fetch account"))?;

    match account.role {
        Role::Instructor => state
            .accounts
            .demote_instructor(&id)
            .await
            .map_err(|e| map_account_error(&e, "Failed to demote account"))?,
        Role::Manager => state
            .accounts
            .demote_manager(&id)
            .await
            .map_err(|e| map_account_error(&e, "Failed to demote account"))?,
        Role::Client => {
            return Err(bad_request("Account is already a client".to_string()));
        }
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Account {} demoted to client", id),
        }),
    ))
}

/// Schedule a new class (manager)
#[utoipa::path(
    post,
    path = "/classes",
    tag = "Classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Invalid payload", body = Object),
        (status = 409, description = "Instructor slot conflict, with alternatives", body = Object)
    )
)]
async fn create_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageClasses)?;
    let slots = parse_slots(req.slots)?;

    let class = state
        .classes
        .create_class(NewClass {
            name: req.name,
            class_type: req.class_type,
            description: req.description,
            instructor_id: req.instructor_id,
            slots,
            capacity: req.capacity,
        })
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to create class"))?;
    Ok((StatusCode::CREATED, Json(ClassResponse::from(class))))
}

/// List active classes
#[utoipa::path(
    get,
    path = "/classes",
    tag = "Classes",
    responses((status = 200, description = "Active classes", body = [ClassResponse]))
)]
async fn list_classes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;

    let classes = state
        .classes
        .list_active_classes()
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to list classes"))?;
    let body: Vec<ClassResponse> = classes.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// List every class, deactivated included (manager)
#[utoipa::path(
    get,
    path = "/classes/all",
    tag = "Classes",
    responses((status = 200, description = "All classes", body = [ClassResponse]))
)]
async fn list_all_classes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageClasses)?;

    let classes = state
        .classes
        .list_classes()
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to list classes"))?;
    let body: Vec<ClassResponse> = classes.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Classes taught by one instructor (self or manager)
#[utoipa::path(
    get,
    path = "/classes/instructor/{id}",
    tag = "Classes",
    params(("id" = String, Path, description = "Instructor account ID")),
    responses((status = 200, description = "Instructor's classes", body = [ClassResponse]))
)]
async fn instructor_classes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require_self_or(&claims, &id, Capability::ManageClasses)?;

    let classes = state
        .classes
        .instructor_classes(&id)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to list classes"))?;
    let body: Vec<ClassResponse> = classes.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Fetch one class
#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = ClassResponse),
        (status = 404, description = "Class not found", body = Object)
    )
)]
async fn get_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;

    let class = state
        .classes
        .get_class(&id)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to fetch class"))?;
    Ok((StatusCode::OK, Json(ClassResponse::from(class))))
}

/// Update a class (manager)
#[utoipa::path(
    put,
    path = "/classes/{id}",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Updated class", body = ClassResponse),
        (status = 404, description = "Class not found", body = Object),
        (status = 409, description = "Instructor slot conflict", body = Object)
    )
)]
async fn update_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageClasses)?;

    let slots = match req.slots {
        Some(slots) => Some(parse_slots(slots)?),
        None => None,
    };

    let class = state
        .classes
        .update_class(
            &id,
            UpdateClass {
                name: req.name,
                class_type: req.class_type,
                description: req.description.map(Some),
                slots,
                capacity: req.capacity,
            },
        )
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to update class"))?;
    Ok((StatusCode::OK, Json(ClassResponse::from(class))))
}

/// Deactivate a class (manager)
///
/// The roster and attendance history stay behind for reporting.
#[utoipa::path(
    delete,
    path = "/classes/{id}",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class deactivated", body = MessageResponse),
        (status = 404, description = "Class not found", body = Object)
    )
)]
async fn delete_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManageClasses)?;

    state
        .classes
        .deactivate_class(&id)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to deactivate class"))?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Class {} deactivated", id),
        }),
    ))
}

/// Register the caller for a class using one of their passes
#[utoipa::path(
    post,
    path = "/classes/{id}/register",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    request_body = RegisterForClassRequest,
    responses(
        (status = 200, description = "Registered", body = ClassResponse),
        (status = 400, description = "Pass invalid, duplicate registration or class full", body = Object),
        (status = 404, description = "Class not found", body = Object)
    )
)]
async fn register_for_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RegisterForClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::BookClasses)?;

    let class = state
        .classes
        .register_for_class(&id, &claims.sub, &req.owned_pass_id)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to register for class"))?;
    Ok((StatusCode::OK, Json(ClassResponse::from(class))))
}

/// Cancel the caller's registration
#[utoipa::path(
    post,
    path = "/classes/{id}/cancel",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Registration removed", body = ClassResponse),
        (status = 400, description = "Not registered", body = Object),
        (status = 404, description = "Class not found", body = Object)
    )
)]
async fn cancel_registration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::BookClasses)?;

    let class = state
        .classes
        .cancel_registration(&id, &claims.sub)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to cancel registration"))?;
    Ok((StatusCode::OK, Json(ClassResponse::from(class))))
}

/// Mark attendance for one date of the caller's own class
///
/// Candidates who are off the roster or whose pass has no sessions left are
/// dropped silently; the submitted list replaces any earlier one for the date.
#[utoipa::path(
    post,
    path = "/classes/{id}/attendance",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID")),
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceResponse),
        (status = 404, description = "Class not found or not taught by the caller", body = Object)
    )
)]
async fn mark_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::TakeAttendance)?;

    let submitted = req.attendees.len();
    let outcome = state
        .classes
        .mark_attendance(&id, &claims.sub, req.date, &req.attendees)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to record attendance"))?;
    Ok((
        StatusCode::OK,
        Json(AttendanceResponse {
            accepted: outcome.accepted,
            submitted,
            class: outcome.class.into(),
        }),
    ))
}

#[derive(Deserialize, Debug, IntoParams)]
struct AttendanceQuery {
    date: NaiveDate,
}

/// Attendance snapshot for one date
///
/// Instructors see only their own classes; managers see any class.
#[utoipa::path(
    get,
    path = "/classes/{id}/attendance",
    tag = "Classes",
    params(("id" = String, Path, description = "Class ID"), AttendanceQuery),
    responses(
        (status = 200, description = "Attendees for the date", body = [AttendeeResponse]),
        (status = 404, description = "Class not found", body = Object)
    )
)]
async fn class_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<AttendanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::TakeAttendance)?;
    let instructor_filter = match claims.role {
        Role::Manager => None,
        _ => Some(claims.sub.as_str()),
    };

    let attendees = state
        .classes
        .class_attendance(&id, query.date, instructor_filter)
        .await
        .map_err(|e| map_schedule_error(&e, "Failed to fetch attendance"))?;
    let body: Vec<AttendeeResponse> = attendees.iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Create a pass definition (manager)
#[utoipa::path(
    post,
    path = "/passes",
    tag = "Passes",
    request_body = CreatePassRequest,
    responses(
        (status = 201, description = "Pass definition created", body = PassDefinitionResponse),
        (status = 400, description = "Invalid payload", body = Object)
    )
)]
async fn create_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManagePasses)?;
    let unit = parse_duration_unit(&req.duration_unit)
        .ok_or_else(|| bad_request(format!("Invalid duration unit: {}", req.duration_unit)))?;

    let definition = state
        .passes
        .create_definition(
            NewPassDefinition {
                name: req.name,
                description: req.description,
                duration: PassDuration {
                    value: req.duration_value,
                    unit,
                },
                sessions: req.sessions,
                price: req.price,
            },
            &claims.sub,
        )
        .await
        .map_err(|e| map_pass_error(&e, "Failed to create pass"))?;
    Ok((StatusCode::CREATED, Json(PassDefinitionResponse::from(definition))))
}

/// List purchasable pass definitions
#[utoipa::path(
    get,
    path = "/passes",
    tag = "Passes",
    responses((status = 200, description = "Active definitions", body = [PassDefinitionResponse]))
)]
async fn list_passes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;

    let definitions = state
        .passes
        .list_active_definitions()
        .await
        .map_err(|e| map_pass_error(&e, "Failed to list passes"))?;
    let body: Vec<PassDefinitionResponse> = definitions.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// List every pass definition, deactivated included (manager)
#[utoipa::path(
    get,
    path = "/passes/all",
    tag = "Passes",
    responses((status = 200, description = "All definitions", body = [PassDefinitionResponse]))
)]
async fn list_all_passes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManagePasses)?;

    let definitions = state
        .passes
        .list_definitions()
        .await
        .map_err(|e| map_pass_error(&e, "Failed to list passes"))?;
    let body: Vec<PassDefinitionResponse> = definitions.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Fetch one pass definition
#[utoipa::path(
    get,
    path = "/passes/{id}",
    tag = "Passes",
    params(("id" = String, Path, description = "Pass definition ID")),
    responses(
        (status = 200, description = "Definition", body = PassDefinitionResponse),
        (status = 404, description = "Pass not found", body = Object)
    )
)]
async fn get_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;

    let definition = state
        .passes
        .get_definition(&id)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to fetch pass"))?;
    Ok((StatusCode::OK, Json(PassDefinitionResponse::from(definition))))
}

/// Update a pass definition (manager)
#[utoipa::path(
    put,
    path = "/passes/{id}",
    tag = "Passes",
    params(("id" = String, Path, description = "Pass definition ID")),
    request_body = UpdatePassRequest,
    responses(
        (status = 200, description = "Updated definition", body = PassDefinitionResponse),
        (status = 404, description = "Pass not found", body = Object)
    )
)]
async fn update_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdatePassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManagePasses)?;

    let duration = match (req.duration_value, req.duration_unit) {
        (None, None) => None,
        (value, unit) => {
            let current = state
                .passes
                .get_definition(&id)
                .await
                .map_err(|e| map_pass_error(&e, "Failed to fetch pass"))?
                .duration;
            let unit = match unit {
                Some(raw) => parse_duration_unit(&raw)
                    .ok_or_else(|| bad_request(format!("Invalid duration unit: {}", raw)))?,
                None => current.unit,
            };
            Some(PassDuration {
                value: value.unwrap_or(current.value),
                unit,
            })
        }
    };

    let definition = state
        .passes
        .update_definition(
            &id,
            UpdatePassDefinition {
                name: req.name,
                description: req.description.map(Some),
                duration,
                sessions: req.sessions,
                price: req.price,
            },
        )
        .await
        .map_err(|e| map_pass_error(&e, "Failed to update pass"))?;
    Ok((StatusCode::OK, Json(PassDefinitionResponse::from(definition))))
}

/// Deactivate a pass definition (manager)
#[utoipa::path(
    delete,
    path = "/passes/{id}",
    tag = "Passes",
    params(("id" = String, Path, description = "Pass definition ID")),
    responses(
        (status = 200, description = "Definition deactivated", body = MessageResponse),
        (status = 404, description = "Pass not found", body = Object)
    )
)]
async fn delete_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ManagePasses)?;

    state
        .passes
        .deactivate_definition(&id)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to deactivate pass"))?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Pass {} deactivated", id),
        }),
    ))
}

/// Purchase a pass for the caller
#[utoipa::path(
    post,
    path = "/passes/{id}/purchase",
    tag = "Passes",
    params(("id" = String, Path, description = "Pass definition ID")),
    request_body = PurchaseRequest,
    responses(
        (status = 201, description = "Pass purchased", body = OwnedPassResponse),
        (status = 400, description = "Invalid payment method", body = Object),
        (status = 404, description = "Pass not found or inactive", body = Object)
    )
)]
async fn purchase_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::BookClasses)?;
    let payment_method = parse_payment_method(&req.payment_method)
        .ok_or_else(|| bad_request(format!("Invalid payment method: {}", req.payment_method)))?;

    let pass = state
        .passes
        .purchase(&claims.sub, &id, payment_method)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to purchase pass"))?;
    Ok((StatusCode::CREATED, Json(OwnedPassResponse::from(pass))))
}

/// The caller's owned passes
#[utoipa::path(
    get,
    path = "/my/passes",
    tag = "Passes",
    responses((status = 200, description = "Owned passes", body = [OwnedPassResponse]))
)]
async fn my_passes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;

    let passes = state
        .passes
        .owned_passes(&claims.sub)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to list passes"))?;
    let body: Vec<OwnedPassResponse> = passes.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// The caller's usable passes (active, unexpired, sessions left)
#[utoipa::path(
    get,
    path = "/my/passes/active",
    tag = "Passes",
    responses((status = 200, description = "Usable passes", body = [OwnedPassResponse]))
)]
async fn my_active_passes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;

    let passes = state
        .passes
        .active_passes(&claims.sub)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to list passes"))?;
    let body: Vec<OwnedPassResponse> = passes.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(body)))
}

/// Whether the caller holds at least one usable pass
#[utoipa::path(
    get,
    path = "/my/passes/valid",
    tag = "Passes",
    responses((status = 200, description = "Validity flag", body = ValidPassResponse))
)]
async fn has_valid_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;

    let has_valid_pass = state
        .passes
        .has_valid_pass(&claims.sub)
        .await
        .map_err(|e| map_pass_error(&e, "Failed to check passes"))?;
    Ok((StatusCode::OK, Json(ValidPassResponse { has_valid_pass })))
}

/// Studio performance report (manager)
#[utoipa::path(
    get,
    path = "/reports/performance",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "New accounts and pass sales for the window", body = Object),
        (status = 403, description = "Not a manager", body = Object)
    )
)]
async fn performance_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ViewReports)?;
    let window = ReportWindow::resolve(query.year, query.month)
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;

    let report = state
        .reports
        .performance(window)
        .await
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;
    Ok((StatusCode::OK, Json(report)))
}

/// Instructor performance report (manager)
#[utoipa::path(
    get,
    path = "/reports/instructor-performance",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-instructor registrations and attendance", body = Object),
        (status = 403, description = "Not a manager", body = Object)
    )
)]
async fn instructor_performance_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ViewReports)?;
    let window = ReportWindow::resolve(query.year, query.month)
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;

    let report = state
        .reports
        .instructor_performance(window, query.instructor_id.as_deref())
        .await
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;
    Ok((StatusCode::OK, Json(report)))
}

/// Customer attendance report (manager)
#[utoipa::path(
    get,
    path = "/reports/customer-attendance",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-client scheduled vs attended", body = Object),
        (status = 403, description = "Not a manager", body = Object)
    )
)]
async fn customer_attendance_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ViewReports)?;
    let window = ReportWindow::resolve(query.year, query.month)
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;

    let report = state
        .reports
        .customer_attendance(window)
        .await
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;
    Ok((StatusCode::OK, Json(report)))
}

/// General attendance report (manager)
#[utoipa::path(
    get,
    path = "/reports/general-attendance",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-class and per-type attendance rollups", body = Object),
        (status = 403, description = "Not a manager", body = Object)
    )
)]
async fn general_attendance_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = authenticate(&headers, &state.config.jwt_secret)?;
    require(&claims, Capability::ViewReports)?;
    let window = ReportWindow::resolve(query.year, query.month)
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;

    let report = state
        .reports
        .general_attendance(window)
        .await
        .map_err(|e| map_report_error(&e, "Failed to build report"))?;
    Ok((StatusCode::OK, Json(report)))
}
