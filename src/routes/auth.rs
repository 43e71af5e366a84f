use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{authenticate_credentials, basic_validator, hash_password, new_id, AuthUser},
    error::{field_errors, ApiError},
    models::{CustomerRow, CustomerView},
    state::AppState,
};

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct ProfileUpdateRequest {
    name: Option<String>,
    phone: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(web::resource("/register").route(web::post().to(register)))
            .service(web::resource("/login").route(web::post().to(login))),
    )
    .service(
        web::scope("/api/profile")
            .wrap(HttpAuthentication::basic(basic_validator))
            .service(
                web::resource("")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            ),
    );
}

async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let mut errors = Vec::new();
    if payload.name.trim().len() < 2 {
        errors.push("Name must be at least 2 characters".to_string());
    }
    if !payload.email.contains('@') {
        errors.push("Valid email required".to_string());
    }
    if payload.phone.trim().len() < 10 {
        errors.push("Valid phone number required".to_string());
    }
    if payload.password.len() < 6 {
        errors.push("Password must be at least 6 characters".to_string());
    }
    if !errors.is_empty() {
        return Ok(field_errors(errors));
    }

    let email = payload.email.trim().to_lowercase();

    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM customers WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| ApiError::Database(sqlx::Error::Protocol("password hash failed".into())))?;
    let id = new_id();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO customers (id, name, email, phone, password_hash, loyalty_points, is_admin, is_active, created_at)
           VALUES (?, ?, ?, ?, ?, 0, 0, 1, ?)"#,
    )
    .bind(&id)
    .bind(payload.name.trim())
    .bind(&email)
    .bind(payload.phone.trim())
    .bind(password_hash)
    .bind(now)
    .execute(&state.db)
    .await?;

    let customer = fetch_customer(&state, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Customer registered successfully",
        "customer": CustomerView::from(customer),
    })))
}

async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let user = authenticate_credentials(&state, &payload.email, &payload.password)
        .await
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let customer = fetch_customer(&state, &user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "customer": CustomerView::from(customer),
    })))
}

async fn get_profile(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let customer = fetch_customer(&state, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(HttpResponse::Ok().json(CustomerView::from(customer)))
}

async fn update_profile(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let mut errors = Vec::new();
    if let Some(name) = payload.name.as_deref() {
        if name.trim().len() < 2 {
            errors.push("Name must be at least 2 characters".to_string());
        }
    }
    if let Some(phone) = payload.phone.as_deref() {
        if phone.trim().len() < 10 {
            errors.push("Valid phone number required".to_string());
        }
    }
    if !errors.is_empty() {
        return Ok(field_errors(errors));
    }

    if let Some(name) = payload.name.as_deref() {
        sqlx::query("UPDATE customers SET name = ? WHERE id = ?")
            .bind(name.trim())
            .bind(&auth.id)
            .execute(&state.db)
            .await?;
    }
    if let Some(phone) = payload.phone.as_deref() {
        sqlx::query("UPDATE customers SET phone = ? WHERE id = ?")
            .bind(phone.trim())
            .bind(&auth.id)
            .execute(&state.db)
            .await?;
    }

    let customer = fetch_customer(&state, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully",
        "customer": CustomerView::from(customer),
    })))
}

async fn fetch_customer(
    state: &AppState,
    customer_id: &str,
) -> Result<Option<CustomerRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerRow>(
        r#"SELECT id, name, email, phone, password_hash, loyalty_points, is_admin, is_active, created_at
           FROM customers WHERE id = ? LIMIT 1"#,
    )
    .bind(customer_id)
    .fetch_optional(&state.db)
    .await
}
