//! Rule Evaluator
//!
//! Nine independent threshold rules over the three snapshot categories. Each
//! rule fires at most once per pass with an aggregate count, or not at all.
//! `Rule::ALL` is the evaluation order and therefore the tie-break order after
//! the priority sort.

pub mod drivers;
pub mod orders;
pub mod trucks;

use chrono::{DateTime, Duration, Utc};

use crate::{
    alert::{capped_details, Alert, AlertKind, Priority},
    snapshot::Snapshots,
    sources::SourceKind,
};

/// Orders due within this many hours are "due soon".
pub const DUE_SOON_WINDOW_HOURS: i64 = 24;
/// Pending orders older than this many days are stale.
pub const STALE_PENDING_DAYS: i64 = 7;
/// Licenses expiring within this many days need renewal.
pub const LICENSE_RENEWAL_WINDOW_DAYS: i64 = 30;
/// Maintenance due within this many days should be scheduled.
pub const MAINTENANCE_WINDOW_DAYS: i64 = 7;
/// The pending-ratio rule only applies above this many orders.
pub const PENDING_RATIO_MIN_ORDERS: usize = 10;
pub const PENDING_RATIO_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    OverdueOrders,
    OrdersDueSoon,
    StalePendingOrders,
    LicensesExpiringSoon,
    LicensesExpired,
    MaintenanceDueSoon,
    MaintenanceOverdue,
    InactiveTrucks,
    HighPendingRatio,
}

impl Rule {
    pub const ALL: [Rule; 9] = [
        Rule::OverdueOrders,
        Rule::OrdersDueSoon,
        Rule::StalePendingOrders,
        Rule::LicensesExpiringSoon,
        Rule::LicensesExpired,
        Rule::MaintenanceDueSoon,
        Rule::MaintenanceOverdue,
        Rule::InactiveTrucks,
        Rule::HighPendingRatio,
    ];

    /// Stable category id carried by the alert this rule produces.
    pub fn id(&self) -> &'static str {
        match self {
            Rule::OverdueOrders => "pedidos-atrasados",
            Rule::OrdersDueSoon => "pedidos-proximos",
            Rule::StalePendingOrders => "pedidos-pendientes-antiguos",
            Rule::LicensesExpiringSoon => "licencias-por-vencer",
            Rule::LicensesExpired => "licencias-vencidas",
            Rule::MaintenanceDueSoon => "mantenimiento-proximo",
            Rule::MaintenanceOverdue => "mantenimiento-vencido",
            Rule::InactiveTrucks => "camiones-inactivos",
            Rule::HighPendingRatio => "alta-carga-pendientes",
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            Rule::OverdueOrders
            | Rule::OrdersDueSoon
            | Rule::StalePendingOrders
            | Rule::HighPendingRatio => SourceKind::Orders,
            Rule::LicensesExpiringSoon | Rule::LicensesExpired => SourceKind::Drivers,
            Rule::MaintenanceDueSoon | Rule::MaintenanceOverdue | Rule::InactiveTrucks => {
                SourceKind::Trucks
            }
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            Rule::OverdueOrders | Rule::LicensesExpired | Rule::MaintenanceOverdue => Priority::High,
            Rule::InactiveTrucks => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self.priority() {
            Priority::High => AlertKind::Error,
            Priority::Medium => AlertKind::Warning,
            Priority::Low => AlertKind::Info,
        }
    }

    /// Runs the rule against its snapshot category. Returns `None` when the
    /// category is missing from this pass or nothing matched.
    pub fn evaluate(&self, snapshots: &Snapshots, now: DateTime<Utc>) -> Option<Alert> {
        match self {
            Rule::OverdueOrders => orders::overdue(snapshots.orders.as_deref()?, now),
            Rule::OrdersDueSoon => orders::due_soon(snapshots.orders.as_deref()?, now),
            Rule::StalePendingOrders => orders::stale_pending(snapshots.orders.as_deref()?, now),
            Rule::HighPendingRatio => orders::high_pending_ratio(snapshots.orders.as_deref()?, now),
            Rule::LicensesExpiringSoon => {
                drivers::licenses_expiring_soon(snapshots.drivers.as_deref()?, now)
            }
            Rule::LicensesExpired => drivers::licenses_expired(snapshots.drivers.as_deref()?, now),
            Rule::MaintenanceDueSoon => {
                trucks::maintenance_due_soon(snapshots.trucks.as_deref()?, now)
            }
            Rule::MaintenanceOverdue => {
                trucks::maintenance_overdue(snapshots.trucks.as_deref()?, now)
            }
            Rule::InactiveTrucks => trucks::inactive(snapshots.trucks.as_deref()?, now),
        }
    }

    pub(crate) fn alert<I>(
        &self,
        now: DateTime<Utc>,
        message: String,
        details: I,
        recommended_action: &str,
    ) -> Alert
    where
        I: IntoIterator<Item = String>,
    {
        Alert {
            id: self.id().to_string(),
            kind: self.kind(),
            message,
            timestamp: now,
            details: capped_details(details),
            recommended_action: recommended_action.to_string(),
            priority: self.priority(),
        }
    }
}

/// True when `at` lies in the half-open window `(now, now + window]`.
pub(crate) fn within_window(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let remaining = at - now;
    remaining > Duration::zero() && remaining <= window
}

pub(crate) fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<_> = Rule::ALL.iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), Rule::ALL.len());
    }

    #[test]
    fn test_rules_read_their_own_category() {
        let count = |kind| Rule::ALL.iter().filter(|r| r.source() == kind).count();
        assert_eq!(count(SourceKind::Orders), 4);
        assert_eq!(count(SourceKind::Drivers), 2);
        assert_eq!(count(SourceKind::Trucks), 3);
        assert_eq!(Rule::HighPendingRatio.source(), SourceKind::Orders);
        assert_eq!(Rule::LicensesExpired.source(), SourceKind::Drivers);
        assert_eq!(Rule::InactiveTrucks.source(), SourceKind::Trucks);
    }

    #[test]
    fn test_rules_skip_missing_categories() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let snapshots = Snapshots::default();
        for rule in Rule::ALL {
            assert!(rule.evaluate(&snapshots, now).is_none(), "{:?} fired", rule);
        }
    }

    #[test]
    fn test_within_window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let window = Duration::hours(24);
        assert!(!within_window(now, now, window));
        assert!(within_window(now + Duration::seconds(1), now, window));
        assert!(within_window(now + window, now, window));
        assert!(!within_window(now + window + Duration::seconds(1), now, window));
        assert!(!within_window(now - Duration::seconds(1), now, window));
    }

    #[test]
    fn test_kind_follows_priority() {
        assert_eq!(Rule::OverdueOrders.kind(), AlertKind::Error);
        assert_eq!(Rule::OrdersDueSoon.kind(), AlertKind::Warning);
        assert_eq!(Rule::InactiveTrucks.kind(), AlertKind::Info);
        assert_eq!(Rule::HighPendingRatio.priority(), Priority::Medium);
    }
}
