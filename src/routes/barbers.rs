use actix_web::{web, HttpResponse};

use crate::{
    error::ApiError,
    models::{BarberRow, BarberView},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/barbers")
            .service(web::resource("").route(web::get().to(list_barbers)))
            .service(web::resource("/{id}").route(web::get().to(get_barber))),
    );
}

async fn list_barbers(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, BarberRow>(
        r#"SELECT id, name, email, phone, specialties, working_days, start_time, end_time,
                  experience_years, rating, total_reviews, bio, is_active, created_at
           FROM barbers
           WHERE is_active = 1
           ORDER BY name"#,
    )
    .fetch_all(&state.db)
    .await?;

    let barbers: Vec<BarberView> = rows.into_iter().map(BarberView::from).collect();
    Ok(HttpResponse::Ok().json(barbers))
}

async fn get_barber(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let barber_id = path.into_inner();
    let row = sqlx::query_as::<_, BarberRow>(
        r#"SELECT id, name, email, phone, specialties, working_days, start_time, end_time,
                  experience_years, rating, total_reviews, bio, is_active, created_at
           FROM barbers WHERE id = ? LIMIT 1"#,
    )
    .bind(&barber_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Barber not found"))?;

    Ok(HttpResponse::Ok().json(BarberView::from(row)))
}
