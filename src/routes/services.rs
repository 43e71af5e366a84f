use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    error::ApiError,
    models::{ServiceRow, ServiceView},
    state::AppState,
};

#[derive(Deserialize)]
struct ServiceSearchQuery {
    q: Option<String>,
    category: Option<String>,
    #[serde(rename = "priceMin")]
    price_min: Option<f64>,
    #[serde(rename = "priceMax")]
    price_max: Option<f64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/services")
            .service(web::resource("").route(web::get().to(list_services)))
            .service(web::resource("/search").route(web::get().to(search_services)))
            .service(web::resource("/{id}").route(web::get().to(get_service))),
    );
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, name, description, duration_minutes, price, category, is_active, popular, discount, created_at
           FROM services
           WHERE is_active = 1
           ORDER BY category, name"#,
    )
    .fetch_all(&state.db)
    .await?;

    let services: Vec<ServiceView> = rows.into_iter().map(ServiceView::from).collect();
    Ok(HttpResponse::Ok().json(services))
}

async fn search_services(
    state: web::Data<AppState>,
    query: web::Query<ServiceSearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    let mut sql = String::from(
        r#"SELECT id, name, description, duration_minutes, price, category, is_active, popular, discount, created_at
           FROM services
           WHERE is_active = 1"#,
    );
    if query.q.is_some() {
        sql.push_str(" AND (name LIKE ? OR description LIKE ?)");
    }
    if query.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    if query.price_min.is_some() {
        sql.push_str(" AND price >= ?");
    }
    if query.price_max.is_some() {
        sql.push_str(" AND price <= ?");
    }
    sql.push_str(" ORDER BY popular DESC, name");

    let mut stmt = sqlx::query_as::<_, ServiceRow>(&sql);
    if let Some(q) = query.q.as_deref() {
        let pattern = format!("%{}%", q.trim());
        stmt = stmt.bind(pattern.clone()).bind(pattern);
    }
    if let Some(category) = query.category.as_deref() {
        stmt = stmt.bind(category.to_string());
    }
    if let Some(price_min) = query.price_min {
        stmt = stmt.bind(price_min);
    }
    if let Some(price_max) = query.price_max {
        stmt = stmt.bind(price_max);
    }

    let rows = stmt.fetch_all(&state.db).await?;
    let services: Vec<ServiceView> = rows.into_iter().map(ServiceView::from).collect();
    Ok(HttpResponse::Ok().json(services))
}

async fn get_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let service_id = path.into_inner();
    let row = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, name, description, duration_minutes, price, category, is_active, popular, discount, created_at
           FROM services WHERE id = ? LIMIT 1"#,
    )
    .bind(&service_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Service not found"))?;

    Ok(HttpResponse::Ok().json(ServiceView::from(row)))
}
