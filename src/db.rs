use std::{env, fs, path::Path};

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    auth::{hash_password, new_id},
    models::AppointmentRow,
    schedule::BookedSlot,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

const APPOINTMENT_DETAIL_SQL: &str = r#"
    SELECT a.id, a.customer_id, a.barber_id, a.service_id, a.scheduled_at, a.status,
           a.notes, a.total_price, a.payment_method, a.payment_status, a.paid_at,
           a.tip, a.loyalty_points_earned, a.created_at,
           b.name AS barber_name,
           s.name AS service_name,
           c.name AS customer_name,
           c.email AS customer_email
    FROM appointments a
    LEFT JOIN barbers b ON a.barber_id = b.id
    LEFT JOIN services s ON a.service_id = s.id
    LEFT JOIN customers c ON a.customer_id = c.id
"#;

pub async fn fetch_appointment_detail(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!("{APPOINTMENT_DETAIL_SQL} WHERE a.id = ? LIMIT 1"))
        .bind(appointment_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_customer_appointments(
    pool: &SqlitePool,
    customer_id: &str,
) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_DETAIL_SQL} WHERE a.customer_id = ? ORDER BY a.scheduled_at DESC"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_all_appointments(pool: &SqlitePool) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_DETAIL_SQL} ORDER BY a.scheduled_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Active (scheduled or confirmed) slots on a barber's calendar,
/// optionally excluding one appointment so a reschedule never
/// conflicts with itself. Runs on a plain connection so callers can
/// keep it inside the same transaction as the write that follows.
pub async fn fetch_booked_slots(
    conn: &mut SqliteConnection,
    barber_id: &str,
    exclude_id: Option<&str>,
) -> Result<Vec<BookedSlot>, sqlx::Error> {
    let rows: Vec<(String, Option<i64>)> = if let Some(exclude_id) = exclude_id {
        sqlx::query_as(
            r#"SELECT a.scheduled_at, s.duration_minutes
               FROM appointments a
               LEFT JOIN services s ON a.service_id = s.id
               WHERE a.barber_id = ? AND a.status IN ('scheduled', 'confirmed') AND a.id != ?"#,
        )
        .bind(barber_id)
        .bind(exclude_id)
        .fetch_all(&mut *conn)
        .await?
    } else {
        sqlx::query_as(
            r#"SELECT a.scheduled_at, s.duration_minutes
               FROM appointments a
               LEFT JOIN services s ON a.service_id = s.id
               WHERE a.barber_id = ? AND a.status IN ('scheduled', 'confirmed')"#,
        )
        .bind(barber_id)
        .fetch_all(&mut *conn)
        .await?
    };

    Ok(rows
        .into_iter()
        .filter_map(|(scheduled_at, duration_minutes)| {
            let start = DateTime::parse_from_rfc3339(&scheduled_at)
                .ok()?
                .with_timezone(&Utc);
            Some(BookedSlot {
                start,
                duration_minutes,
            })
        })
        .collect())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_catalog(pool).await?;
    Ok(())
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM customers WHERE is_admin = 1 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@fadebook.local".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Shop Admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO customers (id, name, email, phone, password_hash, loyalty_points, is_admin, is_active, created_at)
           VALUES (?, ?, ?, ?, ?, 0, 1, 1, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email.to_lowercase())
    .bind("000-000-0000")
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let seed = env::var("SEED_CATALOG").unwrap_or_else(|_| "false".to_string());
    if seed != "true" {
        return Ok(());
    }

    let has_services =
        sqlx::query_as::<_, (String,)>("SELECT id FROM services LIMIT 1")
            .fetch_optional(pool)
            .await?
            .is_some();

    if !has_services {
        let services = vec![
            ("Classic Haircut", "Precision cut, styling, and lineup.", 45, 150.0, "haircut", 1),
            ("Skin Fade", "Skin fade with sharp finishing touches.", 35, 180.0, "haircut", 1),
            ("Beard Sculpt", "Shape, trim, and conditioning for the beard.", 25, 90.0, "beard-trim", 0),
            ("Hot Towel Facial", "Deep cleanse with a hot towel finish.", 30, 120.0, "facial", 0),
            ("Full Grooming Package", "Cut, beard, and grooming refresh.", 90, 300.0, "package", 1),
        ];

        for (name, description, duration, price, category, popular) in services {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                r#"INSERT INTO services (id, name, description, duration_minutes, price, category, is_active, popular, discount, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, 1, ?, 0, ?)"#,
            )
            .bind(new_id())
            .bind(name)
            .bind(description)
            .bind(duration)
            .bind(price)
            .bind(category)
            .bind(popular)
            .bind(now)
            .execute(pool)
            .await?;
        }
    }

    let has_barbers = sqlx::query_as::<_, (String,)>("SELECT id FROM barbers LIMIT 1")
        .fetch_optional(pool)
        .await?
        .is_some();

    if !has_barbers {
        let barbers = vec![
            (
                "Marco Reyes",
                "marco@fadebook.local",
                "555-0101",
                r#"["haircut","beard-trim"]"#,
                8,
            ),
            (
                "Dre Santos",
                "dre@fadebook.local",
                "555-0102",
                r#"["haircut","styling","coloring"]"#,
                5,
            ),
        ];

        for (name, email, phone, specialties, experience) in barbers {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                r#"INSERT INTO barbers (id, name, email, phone, specialties, working_days, start_time, end_time, experience_years, is_active, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, '09:00', '18:00', ?, 1, ?)"#,
            )
            .bind(new_id())
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(specialties)
            .bind(r#"["monday","tuesday","wednesday","thursday","friday","saturday"]"#)
            .bind(experience)
            .bind(now)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}
