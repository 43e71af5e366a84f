use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{basic_validator, AuthUser},
    db,
    error::{field_errors, ApiError},
    models::{
        AppointmentView, PAYMENT_CASH, PAYMENT_ONLINE, PAYMENT_STATUS_PAID, STATUS_CONFIRMED,
        STATUS_SCHEDULED,
    },
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentIntentRequest {
    appointment_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmPaymentRequest {
    appointment_id: String,
    payment_method: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/payments")
            .wrap(HttpAuthentication::basic(basic_validator))
            .service(
                web::resource("/create-payment-intent")
                    .route(web::post().to(create_payment_intent)),
            )
            .service(web::resource("/confirm").route(web::post().to(confirm_payment))),
    );
}

/// Cash-only quote. No payment processor is involved; the client just
/// gets the amount due at the shop.
async fn create_payment_intent(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let appointment = db::fetch_appointment_detail(&state.db, &payload.appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    if appointment.customer_id != auth.id {
        return Err(ApiError::forbidden("Unauthorized"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Cash payment selected",
        "amount": appointment.total_price,
        "paymentMethod": PAYMENT_CASH,
    })))
}

async fn confirm_payment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<ConfirmPaymentRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let method = payload.payment_method.trim();
    if method != PAYMENT_CASH && method != PAYMENT_ONLINE {
        return Ok(field_errors(vec!["Invalid payment method".to_string()]));
    }

    let appointment = db::fetch_appointment_detail(&state.db, &payload.appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    if appointment.customer_id != auth.id {
        return Err(ApiError::forbidden("Unauthorized"));
    }

    // Cash is settled at the shop, so the booking stays scheduled
    // until staff confirm it. Anything pre-paid is confirmed outright.
    let status = if method == PAYMENT_CASH {
        STATUS_SCHEDULED
    } else {
        STATUS_CONFIRMED
    };

    sqlx::query(
        r#"UPDATE appointments
           SET payment_status = ?, payment_method = ?, paid_at = ?, status = ?
           WHERE id = ?"#,
    )
    .bind(PAYMENT_STATUS_PAID)
    .bind(method)
    .bind(Utc::now().to_rfc3339())
    .bind(status)
    .bind(&payload.appointment_id)
    .execute(&state.db)
    .await?;

    let updated = db::fetch_appointment_detail(&state.db, &payload.appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payment confirmed successfully",
        "appointment": AppointmentView::from(updated),
    })))
}
