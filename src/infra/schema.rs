use sqlx::{PgPool, Row, SqlitePool};
use tracing::warn;

/// Column names the bookings table is assumed to have when the metadata
/// catalog cannot be queried. Keeps the store functional (degraded) against
/// an unreachable INFORMATION_SCHEMA or a locked-down role.
const DEFAULT_COLUMNS: &[&str] = &[
    "booking_id",
    "student_id",
    "instructor_id",
    "booking_date",
    "date",
    "notes",
    "status",
    "qr_code",
];

const DATE_CANDIDATES: &[&str] = &["booking_date", "date", "bookingDate"];
const ID_CANDIDATES: &[&str] = &["booking_id", "id", "bookingId"];

/// Snapshot of the bookings table's column names, taken once at bootstrap and
/// shared read-only for the process lifetime. The repositories route every
/// column reference through this so a renamed date or id column survives
/// without a redeploy.
#[derive(Debug, Clone)]
pub struct BookingColumns {
    columns: Vec<String>,
    date_col: String,
    id_col: String,
}

impl BookingColumns {
    pub fn from_columns(columns: Vec<String>) -> Self {
        let date_col = resolve_date_column(&columns);
        let id_col = resolve_id_column(&columns);
        Self { columns, date_col, id_col }
    }

    /// Fallback shape used when introspection fails outright.
    pub fn defaults() -> Self {
        Self::from_columns(DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    pub async fn load_sqlite(pool: &SqlitePool) -> Self {
        let rows = sqlx::query("PRAGMA table_info('bookings')")
            .fetch_all(pool)
            .await;

        match rows {
            Ok(rows) => {
                let columns: Vec<String> = rows
                    .iter()
                    .filter_map(|r| r.try_get::<String, _>("name").ok())
                    .collect();
                if columns.is_empty() {
                    warn!("bookings table has no columns according to PRAGMA, using defaults");
                    Self::defaults()
                } else {
                    Self::from_columns(columns)
                }
            }
            Err(e) => {
                warn!("unable to introspect bookings table, falling back to default columns: {}", e);
                Self::defaults()
            }
        }
    }

    pub async fn load_postgres(pool: &PgPool) -> Self {
        let rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = 'bookings' AND table_schema = current_schema()",
        )
        .fetch_all(pool)
        .await;

        match rows {
            Ok(rows) => {
                let columns: Vec<String> = rows
                    .iter()
                    .filter_map(|r| r.try_get::<String, _>("column_name").ok())
                    .collect();
                if columns.is_empty() {
                    warn!("bookings table not found in information_schema, using defaults");
                    Self::defaults()
                } else {
                    Self::from_columns(columns)
                }
            }
            Err(e) => {
                warn!("unable to introspect bookings table, falling back to default columns: {}", e);
                Self::defaults()
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// First candidate present in the cached column set.
    pub fn pick<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has(c))
    }

    pub fn date_column(&self) -> &str {
        &self.date_col
    }

    pub fn id_column(&self) -> &str {
        &self.id_col
    }
}

fn resolve_date_column(columns: &[String]) -> String {
    for c in DATE_CANDIDATES {
        if columns.iter().any(|col| col == c) {
            return c.to_string();
        }
    }
    // No exact match: first column that merely mentions "date".
    if let Some(found) = columns.iter().find(|c| c.to_lowercase().contains("date")) {
        return found.clone();
    }
    "booking_date".to_string()
}

fn resolve_id_column(columns: &[String]) -> String {
    for c in ID_CANDIDATES {
        if columns.iter().any(|col| col == c) {
            return c.to_string();
        }
    }
    columns
        .first()
        .cloned()
        .unwrap_or_else(|| "booking_id".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prefers_booking_date_over_date() {
        let c = BookingColumns::from_columns(cols(&["id", "date", "booking_date"]));
        assert_eq!(c.date_column(), "booking_date");
    }

    #[test]
    fn falls_back_to_substring_match_for_date() {
        let c = BookingColumns::from_columns(cols(&["id", "scheduled_date", "name"]));
        assert_eq!(c.date_column(), "scheduled_date");
    }

    #[test]
    fn defaults_date_when_nothing_matches() {
        let c = BookingColumns::from_columns(cols(&["id", "name"]));
        assert_eq!(c.date_column(), "booking_date");
    }

    #[test]
    fn prefers_booking_id_then_id() {
        let c = BookingColumns::from_columns(cols(&["id", "booking_id"]));
        assert_eq!(c.id_column(), "booking_id");
        let c = BookingColumns::from_columns(cols(&["id", "date"]));
        assert_eq!(c.id_column(), "id");
    }

    #[test]
    fn id_falls_back_to_first_column() {
        let c = BookingColumns::from_columns(cols(&["pk", "date"]));
        assert_eq!(c.id_column(), "pk");
    }

    #[test]
    fn default_shape_resolves() {
        let c = BookingColumns::defaults();
        assert_eq!(c.id_column(), "booking_id");
        assert_eq!(c.date_column(), "booking_date");
        assert!(c.has("qr_code"));
        assert!(!c.has("client_name"));
    }

    #[test]
    fn pick_returns_first_present_candidate() {
        let c = BookingColumns::from_columns(cols(&["name", "notes"]));
        assert_eq!(c.pick(&["client_name", "name", "notes"]), Some("name"));
        assert_eq!(c.pick(&["client_name"]), None);
    }
}
