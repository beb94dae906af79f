//! Alert Structures
//!
//! Alerts are recomputed on every pass. `id` names the alert category, so the
//! same condition firing again in a later pass yields an alert with the same id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown when no rule fired.
pub const NOMINAL_ALERT_ID: &str = "sin-alertas";

/// Shown when a pass could not be evaluated at all.
pub const SYSTEM_ERROR_ALERT_ID: &str = "error-sistema";

/// Upper bound on per-record lines carried by one alert.
pub const MAX_DETAILS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Error,
    Warning,
    Info,
    Success,
}

/// Declaration order is sort order: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub details: Vec<String>,
    pub recommended_action: String,
    pub priority: Priority,
}

impl Alert {
    /// The single alert published when a pass finds nothing to report.
    pub fn nominal(now: DateTime<Utc>) -> Self {
        Self {
            id: NOMINAL_ALERT_ID.to_string(),
            kind: AlertKind::Success,
            message: "Todo en orden: no se detectaron incidencias operativas".to_string(),
            timestamp: now,
            details: Vec::new(),
            recommended_action: "Continuar con la operación normal".to_string(),
            priority: Priority::Low,
        }
    }

    /// The single alert published when a pass fails as a whole.
    pub fn system_error(now: DateTime<Utc>) -> Self {
        Self {
            id: SYSTEM_ERROR_ALERT_ID.to_string(),
            kind: AlertKind::Error,
            message: "No se pudieron evaluar las alertas del sistema".to_string(),
            timestamp: now,
            details: vec![
                "Ninguna fuente de datos respondió correctamente".to_string(),
            ],
            recommended_action: "Verificar la conexión con el servidor e intentar nuevamente".to_string(),
            priority: Priority::High,
        }
    }

    /// Synthetic alerts are produced by the engine itself rather than by a rule.
    pub fn is_synthetic(&self) -> bool {
        is_synthetic_id(&self.id)
    }
}

pub fn is_synthetic_id(id: &str) -> bool {
    id == NOMINAL_ALERT_ID || id == SYSTEM_ERROR_ALERT_ID
}

/// Keeps the first `MAX_DETAILS` lines.
pub fn capped_details<I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    lines.into_iter().take(MAX_DETAILS).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub informational: usize,
}

impl AlertCounts {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            counts.total += 1;
            match alert.kind {
                AlertKind::Error => counts.critical += 1,
                AlertKind::Warning => counts.warning += 1,
                AlertKind::Info | AlertKind::Success => counts.informational += 1,
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: &str, kind: AlertKind) -> Alert {
        Alert {
            id: id.to_string(),
            kind,
            message: String::new(),
            timestamp: Utc::now(),
            details: Vec::new(),
            recommended_action: String::new(),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn test_priority_orders_high_first() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_counts_group_info_and_success() {
        let alerts = vec![
            alert("a", AlertKind::Error),
            alert("b", AlertKind::Warning),
            alert("c", AlertKind::Warning),
            alert("d", AlertKind::Info),
            alert("e", AlertKind::Success),
        ];

        let counts = AlertCounts::from_alerts(&alerts);
        assert_eq!(
            counts,
            AlertCounts {
                total: 5,
                critical: 1,
                warning: 2,
                informational: 2,
            }
        );
    }

    #[test]
    fn test_synthetic_alerts() {
        let now = Utc::now();
        let nominal = Alert::nominal(now);
        assert_eq!(nominal.kind, AlertKind::Success);
        assert_eq!(nominal.priority, Priority::Low);
        assert!(nominal.is_synthetic());

        let failure = Alert::system_error(now);
        assert_eq!(failure.kind, AlertKind::Error);
        assert_eq!(failure.priority, Priority::High);
        assert!(failure.is_synthetic());

        assert!(!alert("pedidos-atrasados", AlertKind::Error).is_synthetic());
    }

    #[test]
    fn test_alert_serializes_camel_case() {
        let value = serde_json::to_value(Alert::nominal(Utc::now())).unwrap();
        assert_eq!(value["kind"], "success");
        assert_eq!(value["priority"], "low");
        assert!(value.get("recommendedAction").is_some());
    }
}
