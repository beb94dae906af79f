//! Alert Aggregator
//!
//! Runs every rule whose snapshot category is present, orders the results by
//! priority and falls back to the nominal alert when nothing fired.

use chrono::{DateTime, Utc};

use crate::{alert::Alert, rules::Rule, snapshot::Snapshots};

pub fn aggregate(snapshots: &Snapshots, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = Rule::ALL
        .iter()
        .filter(|rule| snapshots.has(rule.source()))
        .filter_map(|rule| rule.evaluate(snapshots, now))
        .collect();

    // sort_by_key is stable, so equal priorities keep rule order
    alerts.sort_by_key(|alert| alert.priority);

    if alerts.is_empty() {
        alerts.push(Alert::nominal(now));
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertKind, Priority, NOMINAL_ALERT_ID};
    use crate::snapshot::{DriverSnapshot, OrderSnapshot, OrderStatus, TruckSnapshot, TruckState};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn order(id: u32, status: OrderStatus, estimated: DateTime<Utc>) -> OrderSnapshot {
        OrderSnapshot {
            id: id.to_string(),
            client_name: "Distribuidora Norte".to_string(),
            status,
            created_at: now() - Duration::days(1),
            estimated_delivery: estimated,
        }
    }

    fn driver(expiry: Option<DateTime<Utc>>) -> DriverSnapshot {
        DriverSnapshot {
            id: "d1".to_string(),
            full_name: "Ana Torres".to_string(),
            active: true,
            license_expiry: expiry,
        }
    }

    fn truck(state: TruckState, next: Option<DateTime<Utc>>) -> TruckSnapshot {
        TruckSnapshot {
            id: "t1".to_string(),
            plate: "XYZ-987".to_string(),
            model: "Mercedes Actros".to_string(),
            active: true,
            operational_state: state,
            next_maintenance: next,
        }
    }

    fn ids(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_priority_order_with_rule_order_tie_break() {
        let snapshots = Snapshots {
            orders: Some(vec![
                order(1, OrderStatus::InTransit, now() - Duration::hours(1)),
                order(2, OrderStatus::Pending, now() + Duration::hours(5)),
            ]),
            drivers: Some(vec![
                driver(Some(now() + Duration::days(10))),
                driver(Some(now() - Duration::days(10))),
            ]),
            trucks: Some(vec![
                truck(TruckState::Inactive, Some(now() - Duration::days(2))),
                truck(TruckState::Available, Some(now() + Duration::days(2))),
            ]),
        };

        let alerts = aggregate(&snapshots, now());
        assert_eq!(
            ids(&alerts),
            vec![
                "pedidos-atrasados",
                "licencias-vencidas",
                "mantenimiento-vencido",
                "pedidos-proximos",
                "licencias-por-vencer",
                "mantenimiento-proximo",
                "camiones-inactivos",
            ]
        );

        let priorities: Vec<Priority> = alerts.iter().map(|a| a.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_nominal_when_nothing_fires() {
        let snapshots = Snapshots {
            orders: Some(vec![order(1, OrderStatus::Delivered, now() - Duration::days(1))]),
            drivers: Some(vec![driver(Some(now() + Duration::days(200))), driver(None)]),
            trucks: Some(vec![truck(TruckState::Available, None)]),
        };

        let alerts = aggregate(&snapshots, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, NOMINAL_ALERT_ID);
        assert_eq!(alerts[0].kind, AlertKind::Success);
    }

    #[test]
    fn test_missing_drivers_skips_license_rules() {
        let snapshots = Snapshots {
            orders: Some(vec![order(1, OrderStatus::Pending, now() - Duration::hours(1))]),
            drivers: None,
            trucks: Some(vec![truck(TruckState::Available, Some(now() - Duration::days(1)))]),
        };

        let alerts = aggregate(&snapshots, now());
        assert_eq!(ids(&alerts), vec!["pedidos-atrasados", "mantenimiento-vencido"]);
        assert!(alerts
            .iter()
            .flat_map(|a| a.details.iter())
            .all(|line| !line.contains("licencia")));
    }

    #[test]
    fn test_empty_sources_produce_nominal() {
        let snapshots = Snapshots {
            orders: Some(Vec::new()),
            drivers: Some(Vec::new()),
            trucks: Some(Vec::new()),
        };
        assert_eq!(ids(&aggregate(&snapshots, now())), vec![NOMINAL_ALERT_ID]);
    }
}
