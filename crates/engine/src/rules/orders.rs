use chrono::{DateTime, Duration, Utc};

use super::{
    format_date, within_window, Rule, DUE_SOON_WINDOW_HOURS, PENDING_RATIO_MIN_ORDERS,
    PENDING_RATIO_THRESHOLD, STALE_PENDING_DAYS,
};
use crate::{
    alert::Alert,
    snapshot::{OrderSnapshot, OrderStatus},
};

pub fn overdue(orders: &[OrderSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let matches: Vec<&OrderSnapshot> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Delivered && o.estimated_delivery < now)
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::OverdueOrders.alert(
        now,
        format!("{} pedido(s) con la entrega atrasada", matches.len()),
        matches.iter().map(|o| {
            format!(
                "Pedido #{} - {} (entrega estimada: {})",
                o.id,
                o.client_name,
                format_date(o.estimated_delivery)
            )
        }),
        "Contactar a los clientes y reprogramar las entregas",
    ))
}

pub fn due_soon(orders: &[OrderSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let window = Duration::hours(DUE_SOON_WINDOW_HOURS);
    let matches: Vec<&OrderSnapshot> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Delivered && within_window(o.estimated_delivery, now, window))
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::OrdersDueSoon.alert(
        now,
        format!("{} pedido(s) deben entregarse en las próximas 24 horas", matches.len()),
        matches.iter().map(|o| {
            let hours = (o.estimated_delivery - now).num_hours();
            format!(
                "Pedido #{} - {} (entrega en {} h)",
                o.id, o.client_name, hours
            )
        }),
        "Verificar las rutas y confirmar las entregas",
    ))
}

pub fn stale_pending(orders: &[OrderSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let max_age = Duration::days(STALE_PENDING_DAYS);
    let matches: Vec<&OrderSnapshot> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending && now - o.created_at > max_age)
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::StalePendingOrders.alert(
        now,
        format!("{} pedido(s) pendientes por más de 7 días", matches.len()),
        matches.iter().map(|o| {
            format!(
                "Pedido #{} - {} (creado: {}, hace {} días)",
                o.id,
                o.client_name,
                format_date(o.created_at),
                (now - o.created_at).num_days()
            )
        }),
        "Revisar los pedidos y asignar recursos",
    ))
}

pub fn high_pending_ratio(orders: &[OrderSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let total = orders.len();
    if total <= PENDING_RATIO_MIN_ORDERS {
        return None;
    }

    let pending = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();
    let ratio = pending as f64 / total as f64;
    if ratio <= PENDING_RATIO_THRESHOLD {
        return None;
    }

    Some(Rule::HighPendingRatio.alert(
        now,
        format!("Alta proporción de pedidos pendientes: {} de {}", pending, total),
        [format!(
            "{} de {} pedidos pendientes ({:.1}%)",
            pending,
            total,
            ratio * 100.0
        )],
        "Revisar la capacidad operativa",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertKind, Priority, MAX_DETAILS};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn order(id: u32, status: OrderStatus, created_at: DateTime<Utc>, estimated: DateTime<Utc>) -> OrderSnapshot {
        OrderSnapshot {
            id: id.to_string(),
            client_name: format!("Cliente {}", id),
            status,
            created_at,
            estimated_delivery: estimated,
        }
    }

    fn recent(id: u32, status: OrderStatus, estimated: DateTime<Utc>) -> OrderSnapshot {
        order(id, status, now() - Duration::days(1), estimated)
    }

    #[test]
    fn test_overdue_aggregates_into_one_alert() {
        let orders = vec![
            recent(1, OrderStatus::Pending, now() - Duration::hours(2)),
            recent(2, OrderStatus::InTransit, now() - Duration::days(3)),
            recent(3, OrderStatus::Cancelled, now() - Duration::minutes(1)),
            recent(4, OrderStatus::Delivered, now() - Duration::days(1)),
            recent(5, OrderStatus::InTransit, now() + Duration::days(2)),
        ];

        let alert = overdue(&orders, now()).unwrap();
        assert_eq!(alert.id, "pedidos-atrasados");
        assert_eq!(alert.kind, AlertKind::Error);
        assert_eq!(alert.priority, Priority::High);
        assert!(alert.message.contains('3'));
        assert_eq!(alert.details.len(), 3);
        assert!(alert.details[0].starts_with("Pedido #1"));
    }

    #[test]
    fn test_overdue_caps_details() {
        let orders: Vec<_> = (1..=8)
            .map(|id| recent(id, OrderStatus::InTransit, now() - Duration::hours(id as i64)))
            .collect();

        let alert = overdue(&orders, now()).unwrap();
        assert_eq!(alert.details.len(), MAX_DETAILS);
        assert!(alert.message.starts_with("8 "));
    }

    #[test]
    fn test_delivery_exactly_now_is_neither_overdue_nor_due_soon() {
        let orders = vec![recent(1, OrderStatus::InTransit, now())];
        assert!(overdue(&orders, now()).is_none());
        assert!(due_soon(&orders, now()).is_none());
    }

    #[test]
    fn test_due_soon_window() {
        let orders = vec![
            recent(1, OrderStatus::Pending, now() + Duration::hours(1)),
            recent(2, OrderStatus::InTransit, now() + Duration::hours(24)),
            recent(3, OrderStatus::InTransit, now() + Duration::hours(25)),
            recent(4, OrderStatus::Delivered, now() + Duration::hours(3)),
        ];

        let alert = due_soon(&orders, now()).unwrap();
        assert_eq!(alert.id, "pedidos-proximos");
        assert_eq!(alert.priority, Priority::Medium);
        assert_eq!(alert.details.len(), 2);
        assert!(alert.message.starts_with("2 "));
    }

    #[test]
    fn test_stale_pending_requires_more_than_seven_days() {
        let far = now() + Duration::days(5);
        let orders = vec![
            order(1, OrderStatus::Pending, now() - Duration::days(7), far),
            order(2, OrderStatus::Pending, now() - Duration::days(8), far),
            order(3, OrderStatus::InTransit, now() - Duration::days(30), far),
        ];

        let alert = stale_pending(&orders, now()).unwrap();
        assert_eq!(alert.id, "pedidos-pendientes-antiguos");
        assert_eq!(alert.details.len(), 1);
        assert!(alert.details[0].starts_with("Pedido #2"));
    }

    #[test]
    fn test_high_pending_ratio() {
        let far = now() + Duration::days(5);
        let mut orders: Vec<_> = (1..=7)
            .map(|id| recent(id, OrderStatus::InTransit, far))
            .collect();
        orders.extend((8..=11).map(|id| recent(id, OrderStatus::Pending, far)));

        // 4 of 11 pending, above 30%
        let alert = high_pending_ratio(&orders, now()).unwrap();
        assert_eq!(alert.id, "alta-carga-pendientes");
        assert!(alert.message.contains("4 de 11"));
        assert_eq!(alert.details.len(), 1);

        // 3 of 11 pending, below 30%
        orders[7].status = OrderStatus::Delivered;
        assert!(high_pending_ratio(&orders, now()).is_none());
    }

    #[test]
    fn test_high_pending_ratio_needs_more_than_ten_orders() {
        let far = now() + Duration::days(5);
        let orders: Vec<_> = (1..=10)
            .map(|id| recent(id, OrderStatus::Pending, far))
            .collect();
        assert!(high_pending_ratio(&orders, now()).is_none());
    }
}
