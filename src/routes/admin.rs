use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::admin_validator,
    db,
    error::{field_errors, ApiError},
    models::{
        append_note, AppointmentView, APPOINTMENT_STATUSES, MAX_NOTES_LEN, STATUS_COMPLETED,
    },
    schedule,
    state::AppState,
};

#[derive(Deserialize)]
struct StatusUpdateRequest {
    status: String,
    notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("/appointments").route(web::get().to(list_appointments)))
            .service(
                web::resource("/appointments/{id}/status").route(web::put().to(update_status)),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard))),
    );
}

async fn list_appointments(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = db::fetch_all_appointments(&state.db).await?;
    let appointments: Vec<AppointmentView> = rows.into_iter().map(AppointmentView::from).collect();
    Ok(HttpResponse::Ok().json(appointments))
}

async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let appointment_id = path.into_inner();
    let payload = payload.into_inner();

    let mut errors = Vec::new();
    if !APPOINTMENT_STATUSES.contains(&payload.status.as_str()) {
        errors.push("Invalid status".to_string());
    }
    if payload.notes.as_deref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        errors.push("Notes too long".to_string());
    }
    if !errors.is_empty() {
        return Ok(field_errors(errors));
    }

    // The previous status must come from what is persisted, read
    // before any mutation, so completion awards points exactly once.
    let appointment = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    let previous_status = appointment.status.clone();

    let notes = match payload.notes.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => Some(append_note(
            appointment.notes.as_deref(),
            "Admin note",
            note,
        )),
        _ => appointment.notes.clone(),
    };

    let awards_points =
        payload.status == STATUS_COMPLETED && previous_status != STATUS_COMPLETED;
    let points = schedule::loyalty_points_for(appointment.total_price);

    let mut tx = state.db.begin().await?;

    if awards_points {
        sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + ? WHERE id = ?")
            .bind(points)
            .bind(&appointment.customer_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE appointments SET status = ?, notes = ?, loyalty_points_earned = ? WHERE id = ?",
        )
        .bind(&payload.status)
        .bind(&notes)
        .bind(points)
        .bind(&appointment_id)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("UPDATE appointments SET status = ?, notes = ? WHERE id = ?")
            .bind(&payload.status)
            .bind(&notes)
            .bind(&appointment_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    log::info!(
        "appointment {appointment_id} status {previous_status} -> {}",
        payload.status
    );

    let updated = db::fetch_appointment_detail(&state.db, &appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appointment status updated successfully",
        "appointment": AppointmentView::from(updated),
    })))
}

async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let total_appointments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments")
            .fetch_one(&state.db)
            .await?;

    let today_start = Utc::now()
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();
    let today_end = today_start + Duration::days(1);

    let today_appointments = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM appointments WHERE scheduled_at >= ? AND scheduled_at < ?",
    )
    .bind(today_start.to_rfc3339())
    .bind(today_end.to_rfc3339())
    .fetch_one(&state.db)
    .await?;

    let pending_appointments = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM appointments WHERE status IN ('scheduled', 'confirmed')",
    )
    .fetch_one(&state.db)
    .await?;

    let total_customers =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&state.db)
            .await?;

    let total_revenue = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(total_price), 0.0) FROM appointments WHERE status = 'completed'",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "stats": {
            "totalAppointments": total_appointments,
            "todayAppointments": today_appointments,
            "pendingAppointments": pending_appointments,
            "totalCustomers": total_customers,
            "totalRevenue": total_revenue,
        }
    })))
}
