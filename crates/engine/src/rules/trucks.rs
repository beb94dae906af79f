use chrono::{DateTime, Duration, Utc};

use super::{format_date, within_window, Rule, MAINTENANCE_WINDOW_DAYS};
use crate::{
    alert::Alert,
    snapshot::{TruckSnapshot, TruckState},
};

pub fn maintenance_due_soon(trucks: &[TruckSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let window = Duration::days(MAINTENANCE_WINDOW_DAYS);
    let matches: Vec<(&TruckSnapshot, DateTime<Utc>)> = trucks
        .iter()
        .filter_map(|t| t.next_maintenance.map(|due| (t, due)))
        .filter(|(_, due)| within_window(*due, now, window))
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::MaintenanceDueSoon.alert(
        now,
        format!("{} camión(es) requieren mantenimiento en los próximos 7 días", matches.len()),
        matches.iter().map(|(t, due)| {
            format!("{} ({}) - mantenimiento el {}", t.plate, t.model, format_date(*due))
        }),
        "Programar el mantenimiento preventivo",
    ))
}

pub fn maintenance_overdue(trucks: &[TruckSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let matches: Vec<(&TruckSnapshot, DateTime<Utc>)> = trucks
        .iter()
        .filter_map(|t| t.next_maintenance.map(|due| (t, due)))
        .filter(|(_, due)| *due < now)
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::MaintenanceOverdue.alert(
        now,
        format!("{} camión(es) con el mantenimiento vencido", matches.len()),
        matches.iter().map(|(t, due)| {
            format!(
                "{} ({}) - mantenimiento vencido desde el {}",
                t.plate,
                t.model,
                format_date(*due)
            )
        }),
        "Retirar los camiones del servicio hasta completar el mantenimiento",
    ))
}

pub fn inactive(trucks: &[TruckSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let matches: Vec<&TruckSnapshot> = trucks
        .iter()
        .filter(|t| t.operational_state == TruckState::Inactive || !t.active)
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::InactiveTrucks.alert(
        now,
        format!("{} camión(es) inactivos", matches.len()),
        matches
            .iter()
            .map(|t| format!("{} ({}) - fuera de servicio", t.plate, t.model)),
        "Revisar la disponibilidad de la flota",
    ))
}
