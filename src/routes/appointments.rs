use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{basic_validator, new_id, AuthUser},
    db,
    error::{field_errors, ApiError},
    models::{
        append_note, AppointmentView, MAX_NOTES_LEN, MAX_REASON_LEN, PAYMENT_PENDING,
        PAYMENT_STATUS_PENDING, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_SCHEDULED,
    },
    schedule,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppointmentRequest {
    barber_id: String,
    service_id: String,
    date_time: String,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct CancelRequest {
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RescheduleRequest {
    new_date_time: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/appointments")
            .wrap(HttpAuthentication::basic(basic_validator))
            .service(
                web::resource("")
                    .route(web::get().to(list_appointments))
                    .route(web::post().to(create_appointment)),
            )
            .service(web::resource("/{id}/cancel").route(web::put().to(cancel_appointment)))
            .service(
                web::resource("/{id}/reschedule").route(web::put().to(reschedule_appointment)),
            ),
    );
}

async fn list_appointments(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let rows = db::fetch_customer_appointments(&state.db, &auth.id).await?;
    let appointments: Vec<AppointmentView> = rows.into_iter().map(AppointmentView::from).collect();
    Ok(HttpResponse::Ok().json(appointments))
}

async fn create_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CreateAppointmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let mut errors = Vec::new();
    if payload.barber_id.trim().is_empty() {
        errors.push("Valid barber ID required".to_string());
    }
    if payload.service_id.trim().is_empty() {
        errors.push("Valid service ID required".to_string());
    }
    let scheduled_at = parse_date_time(&payload.date_time);
    if scheduled_at.is_none() {
        errors.push("Valid date and time required".to_string());
    }
    if payload.notes.as_deref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        errors.push("Notes too long".to_string());
    }
    if !errors.is_empty() {
        return Ok(field_errors(errors));
    }
    let scheduled_at = scheduled_at.unwrap();

    let barber = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM barbers WHERE id = ? AND is_active = 1 LIMIT 1",
    )
    .bind(payload.barber_id.trim())
    .fetch_optional(&state.db)
    .await?;
    let service = sqlx::query_as::<_, (String, i64, f64)>(
        "SELECT id, duration_minutes, price FROM services WHERE id = ? LIMIT 1",
    )
    .bind(payload.service_id.trim())
    .fetch_optional(&state.db)
    .await?;

    let (Some((barber_id,)), Some((service_id, duration_minutes, price))) = (barber, service)
    else {
        return Err(ApiError::not_found("Barber or service not found"));
    };

    if scheduled_at <= Utc::now() {
        return Err(ApiError::validation("Cannot book appointments in the past"));
    }

    let end = scheduled_at + Duration::minutes(duration_minutes);

    // Conflict check and insert share one transaction so two
    // concurrent bookings cannot both pass the check and commit
    // overlapping slots.
    let mut tx = state.db.begin().await?;

    let slots = db::fetch_booked_slots(&mut tx, &barber_id, None).await?;
    if schedule::has_conflict(&slots, scheduled_at, end) {
        return Err(ApiError::validation("Time slot not available"));
    }

    let appointment_id = new_id();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO appointments
           (id, customer_id, barber_id, service_id, scheduled_at, status, notes, total_price,
            payment_method, payment_status, tip, loyalty_points_earned, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)"#,
    )
    .bind(&appointment_id)
    .bind(&auth.id)
    .bind(&barber_id)
    .bind(&service_id)
    .bind(scheduled_at.to_rfc3339())
    .bind(STATUS_SCHEDULED)
    .bind(payload.notes.as_deref().map(str::trim))
    .bind(price)
    .bind(PAYMENT_PENDING)
    .bind(PAYMENT_STATUS_PENDING)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    log::info!(
        "appointment {appointment_id} booked by {} with barber {barber_id}",
        auth.name
    );

    let appointment = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Appointment created successfully",
        "appointment": AppointmentView::from(appointment),
    })))
}

async fn cancel_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<CancelRequest>,
) -> Result<HttpResponse, ApiError> {
    let appointment_id = path.into_inner();
    let payload = payload.into_inner();

    if payload
        .reason
        .as_deref()
        .is_some_and(|r| r.len() > MAX_REASON_LEN)
    {
        return Ok(field_errors(vec!["Reason too long".to_string()]));
    }

    let appointment = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    if appointment.customer_id != auth.id {
        return Err(ApiError::forbidden("Unauthorized to cancel this appointment"));
    }
    if appointment.status == STATUS_CANCELLED {
        return Err(ApiError::validation("Appointment is already cancelled"));
    }
    if appointment.status == STATUS_COMPLETED {
        return Err(ApiError::validation("Cannot cancel completed appointment"));
    }

    let scheduled_at = parse_date_time(&appointment.scheduled_at)
        .ok_or_else(|| ApiError::Database(sqlx::Error::Decode("invalid stored timestamp".into())))?;
    if !schedule::cancellable_by_customer(scheduled_at, Utc::now()) {
        return Err(ApiError::validation(
            "Appointments can only be cancelled at least 2 hours before the scheduled time",
        ));
    }

    let notes = match payload.reason.as_deref().map(str::trim) {
        Some(reason) if !reason.is_empty() => Some(append_note(
            appointment.notes.as_deref(),
            "Cancellation reason",
            reason,
        )),
        _ => appointment.notes.clone(),
    };

    sqlx::query("UPDATE appointments SET status = ?, notes = ? WHERE id = ?")
        .bind(STATUS_CANCELLED)
        .bind(&notes)
        .bind(&appointment_id)
        .execute(&state.db)
        .await?;

    let updated = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointment cancelled successfully",
        "appointment": AppointmentView::from(updated),
    })))
}

async fn reschedule_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<RescheduleRequest>,
) -> Result<HttpResponse, ApiError> {
    let appointment_id = path.into_inner();
    let payload = payload.into_inner();

    let Some(new_scheduled_at) = parse_date_time(&payload.new_date_time) else {
        return Ok(field_errors(vec!["Valid date and time required".to_string()]));
    };

    let appointment = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    if appointment.customer_id != auth.id {
        return Err(ApiError::forbidden(
            "Unauthorized to reschedule this appointment",
        ));
    }
    if appointment.status == STATUS_CANCELLED {
        return Err(ApiError::validation("Cannot reschedule cancelled appointment"));
    }
    if appointment.status == STATUS_COMPLETED {
        return Err(ApiError::validation("Cannot reschedule completed appointment"));
    }
    if new_scheduled_at <= Utc::now() {
        return Err(ApiError::validation("Cannot book appointments in the past"));
    }

    let duration_minutes = sqlx::query_scalar::<_, i64>(
        "SELECT duration_minutes FROM services WHERE id = ? LIMIT 1",
    )
    .bind(&appointment.service_id)
    .fetch_optional(&state.db)
    .await?
    .unwrap_or(schedule::DEFAULT_DURATION_MIN);

    let end = new_scheduled_at + Duration::minutes(duration_minutes);

    let mut tx = state.db.begin().await?;

    let slots =
        db::fetch_booked_slots(&mut tx, &appointment.barber_id, Some(&appointment_id)).await?;
    if schedule::has_conflict(&slots, new_scheduled_at, end) {
        return Err(ApiError::validation("New time slot not available"));
    }

    // Rescheduling always drops back to scheduled; the shop has to
    // re-confirm the new slot.
    sqlx::query("UPDATE appointments SET scheduled_at = ?, status = ? WHERE id = ?")
        .bind(new_scheduled_at.to_rfc3339())
        .bind(STATUS_SCHEDULED)
        .bind(&appointment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let updated = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointment rescheduled successfully",
        "appointment": AppointmentView::from(updated),
    })))
}

fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
