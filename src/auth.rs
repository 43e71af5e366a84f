use actix_web::{
    dev::ServiceRequest, error::InternalError, web, Error, HttpMessage, HttpResponse,
};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::{models::CustomerRow, state::AppState};

/// Identity resolved from the request's credentials, passed to
/// handlers as `web::ReqData<AuthUser>` rather than ambient state.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Option<AuthUser> {
    let customer = sqlx::query_as::<_, CustomerRow>(
        r#"SELECT id, name, email, phone, password_hash, loyalty_points, is_admin, is_active, created_at
           FROM customers
           WHERE email = ? AND is_active = 1
           LIMIT 1"#,
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(&state.db)
    .await
    .ok()??;

    if !verify_password(password, &customer.password_hash) {
        return None;
    }

    Some(AuthUser {
        id: customer.id,
        name: customer.name,
        is_admin: customer.is_admin != 0,
    })
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| unauthorized_json("Access credentials required"))?;
    let email = credentials.user_id();
    let password = credentials.password().unwrap_or_default();
    authenticate_credentials(state, email, password)
        .await
        .ok_or_else(|| unauthorized_json("Invalid credentials"))
}

pub async fn basic_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if !user.is_admin {
                return Err((forbidden_json("Admin access required"), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn unauthorized_json(message: &str) -> Error {
    let response =
        HttpResponse::Unauthorized().json(serde_json::json!({ "error": message }));
    InternalError::from_response(message.to_string(), response).into()
}

fn forbidden_json(message: &str) -> Error {
    let response = HttpResponse::Forbidden().json(serde_json::json!({ "error": message }));
    InternalError::from_response(message.to_string(), response).into()
}
