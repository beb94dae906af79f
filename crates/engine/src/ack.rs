//! Acknowledgement Store
//!
//! Alert categories dismissed by the user. Dismissals outlive individual
//! passes and are only dropped by `reset`.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::alert::{is_synthetic_id, Alert};

#[derive(Debug, Default)]
pub struct AcknowledgementStore {
    dismissed: RwLock<HashSet<String>>,
}

impl AcknowledgementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dismisses an alert category. Returns `false` for the engine's own
    /// nominal and error alerts, which cannot be dismissed, and for ids that
    /// were already dismissed.
    pub fn acknowledge(&self, id: &str) -> bool {
        if is_synthetic_id(id) {
            debug!("Ignoring acknowledgement of synthetic alert {}", id);
            return false;
        }
        self.write().insert(id.to_string())
    }

    pub fn is_acknowledged(&self, id: &str) -> bool {
        self.read().contains(id)
    }

    /// Alerts whose category has not been dismissed, in their original order.
    pub fn filter(&self, alerts: &[Alert]) -> Vec<Alert> {
        let dismissed = self.read();
        alerts
            .iter()
            .filter(|alert| !dismissed.contains(&alert.id))
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.write().clear();
    }

    /// Dismissed ids, sorted.
    pub fn acknowledged(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().iter().cloned().collect();
        ids.sort();
        ids
    }

    // Poisoning is ignored: the set has no invariant a panic could break.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.dismissed.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.dismissed.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertKind, Priority, NOMINAL_ALERT_ID, SYSTEM_ERROR_ALERT_ID};
    use chrono::Utc;

    fn alert(id: &str) -> Alert {
        Alert {
            id: id.to_string(),
            kind: AlertKind::Warning,
            message: format!("{} firing", id),
            timestamp: Utc::now(),
            details: Vec::new(),
            recommended_action: String::new(),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn test_acknowledge_filters_category() {
        let store = AcknowledgementStore::new();
        let alerts = vec![alert("pedidos-atrasados"), alert("camiones-inactivos")];

        assert!(store.acknowledge("pedidos-atrasados"));
        let visible = store.filter(&alerts);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "camiones-inactivos");
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let store = AcknowledgementStore::new();
        assert!(store.acknowledge("licencias-vencidas"));
        assert!(!store.acknowledge("licencias-vencidas"));
        assert_eq!(store.acknowledged(), vec!["licencias-vencidas".to_string()]);
    }

    #[test]
    fn test_synthetic_alerts_cannot_be_dismissed() {
        let store = AcknowledgementStore::new();
        assert!(!store.acknowledge(NOMINAL_ALERT_ID));
        assert!(!store.acknowledge(SYSTEM_ERROR_ALERT_ID));
        assert!(store.acknowledged().is_empty());

        let alerts = vec![alert(NOMINAL_ALERT_ID)];
        assert_eq!(store.filter(&alerts).len(), 1);
    }

    #[test]
    fn test_unknown_id_is_harmless() {
        let store = AcknowledgementStore::new();
        assert!(store.acknowledge("no-such-category"));
        let alerts = vec![alert("pedidos-proximos")];
        assert_eq!(store.filter(&alerts), alerts);
        assert!(store.is_acknowledged("no-such-category"));
    }

    #[test]
    fn test_reset_clears_dismissals() {
        let store = AcknowledgementStore::new();
        store.acknowledge("mantenimiento-vencido");
        store.reset();
        assert!(!store.is_acknowledged("mantenimiento-vencido"));
        assert_eq!(store.filter(&[alert("mantenimiento-vencido")]).len(), 1);
    }
}
