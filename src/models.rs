use serde::Serialize;

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_IN_PROGRESS: &str = "in-progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_NO_SHOW: &str = "no-show";

pub const APPOINTMENT_STATUSES: [&str; 6] = [
    STATUS_SCHEDULED,
    STATUS_CONFIRMED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
    STATUS_NO_SHOW,
];

pub const PAYMENT_CASH: &str = "cash";
pub const PAYMENT_ONLINE: &str = "online";
pub const PAYMENT_PENDING: &str = "pending";

pub const PAYMENT_STATUS_PENDING: &str = "pending";
pub const PAYMENT_STATUS_PAID: &str = "paid";

pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_REASON_LEN: usize = 200;

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub loyalty_points: i64,
    pub is_admin: i64,
    pub is_active: i64,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BarberRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialties: String,
    pub working_days: String,
    pub start_time: String,
    pub end_time: String,
    pub experience_years: i64,
    pub rating: f64,
    pub total_reviews: i64,
    pub bio: Option<String>,
    pub is_active: i64,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: i64,
    pub price: f64,
    pub category: String,
    pub is_active: i64,
    pub popular: i64,
    pub discount: i64,
    pub created_at: String,
}

/// Appointment joined with the display fields the API resolves for
/// responses (barber/service/customer names).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub customer_id: String,
    pub barber_id: String,
    pub service_id: String,
    pub scheduled_at: String,
    pub status: String,
    pub notes: Option<String>,
    pub total_price: f64,
    pub payment_method: String,
    pub payment_status: String,
    pub paid_at: Option<String>,
    pub tip: f64,
    pub loyalty_points_earned: i64,
    pub created_at: String,
    pub barber_name: Option<String>,
    pub service_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub loyalty_points: i64,
    pub is_admin: bool,
}

impl From<CustomerRow> for CustomerView {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            loyalty_points: row.loyalty_points,
            is_admin: row.is_admin != 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberScheduleView {
    pub working_days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarberView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialties: Vec<String>,
    pub schedule: BarberScheduleView,
    pub experience: i64,
    pub rating: f64,
    pub total_reviews: i64,
    pub bio: Option<String>,
}

impl From<BarberRow> for BarberView {
    fn from(row: BarberRow) -> Self {
        let specialties = serde_json::from_str(&row.specialties).unwrap_or_default();
        let working_days = serde_json::from_str(&row.working_days).unwrap_or_default();
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            specialties,
            schedule: BarberScheduleView {
                working_days,
                start_time: row.start_time,
                end_time: row.end_time,
            },
            experience: row.experience_years,
            rating: row.rating,
            total_reviews: row.total_reviews,
            bio: row.bio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration: i64,
    pub price: f64,
    pub discounted_price: f64,
    pub category: String,
    pub popular: bool,
    pub discount: i64,
}

impl From<ServiceRow> for ServiceView {
    fn from(row: ServiceRow) -> Self {
        let discounted_price = if row.discount > 0 {
            row.price - (row.price * row.discount as f64 / 100.0)
        } else {
            row.price
        };
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            duration: row.duration_minutes,
            price: row.price,
            discounted_price,
            category: row.category,
            popular: row.popular != 0,
            discount: row.discount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub method: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub barber_id: String,
    pub barber_name: Option<String>,
    pub service_id: String,
    pub service_name: Option<String>,
    pub date_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub total_price: f64,
    pub payment: PaymentView,
    pub tip: f64,
    pub loyalty_points_earned: i64,
    pub created_at: String,
}

impl From<AppointmentRow> for AppointmentView {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            barber_id: row.barber_id,
            barber_name: row.barber_name,
            service_id: row.service_id,
            service_name: row.service_name,
            date_time: row.scheduled_at,
            status: row.status,
            notes: row.notes,
            total_price: row.total_price,
            payment: PaymentView {
                method: row.payment_method,
                status: row.payment_status,
                paid_at: row.paid_at,
            },
            tip: row.tip,
            loyalty_points_earned: row.loyalty_points_earned,
            created_at: row.created_at,
        }
    }
}

/// Appends an annotation to the free-text notes field without ever
/// overwriting what is already there.
pub fn append_note(existing: Option<&str>, label: &str, note: &str) -> String {
    match existing {
        Some(prior) if !prior.trim().is_empty() => format!("{prior}\n\n{label}: {note}"),
        _ => format!("{label}: {note}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_note_starts_fresh_when_empty() {
        assert_eq!(
            append_note(None, "Cancellation reason", "sick"),
            "Cancellation reason: sick"
        );
        assert_eq!(
            append_note(Some(""), "Admin note", "walk-in"),
            "Admin note: walk-in"
        );
    }

    #[test]
    fn append_note_preserves_prior_entries() {
        let first = append_note(None, "Admin note", "confirmed by phone");
        let second = append_note(Some(&first), "Cancellation reason", "travel");
        assert_eq!(
            second,
            "Admin note: confirmed by phone\n\nCancellation reason: travel"
        );
    }
}
