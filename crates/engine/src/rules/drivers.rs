use chrono::{DateTime, Duration, Utc};

use super::{format_date, within_window, Rule, LICENSE_RENEWAL_WINDOW_DAYS};
use crate::{alert::Alert, snapshot::DriverSnapshot};

pub fn licenses_expiring_soon(drivers: &[DriverSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let window = Duration::days(LICENSE_RENEWAL_WINDOW_DAYS);
    let matches: Vec<(&DriverSnapshot, DateTime<Utc>)> = drivers
        .iter()
        .filter_map(|d| d.license_expiry.map(|expiry| (d, expiry)))
        .filter(|(_, expiry)| within_window(*expiry, now, window))
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::LicensesExpiringSoon.alert(
        now,
        format!("{} licencia(s) de conducir vencen en los próximos 30 días", matches.len()),
        matches.iter().map(|(d, expiry)| {
            format!(
                "{} - licencia vence el {} ({} días)",
                d.full_name,
                format_date(*expiry),
                (*expiry - now).num_days()
            )
        }),
        "Programar la renovación de las licencias",
    ))
}

pub fn licenses_expired(drivers: &[DriverSnapshot], now: DateTime<Utc>) -> Option<Alert> {
    let matches: Vec<(&DriverSnapshot, DateTime<Utc>)> = drivers
        .iter()
        .filter_map(|d| d.license_expiry.map(|expiry| (d, expiry)))
        .filter(|(_, expiry)| *expiry < now)
        .collect();
    if matches.is_empty() {
        return None;
    }

    Some(Rule::LicensesExpired.alert(
        now,
        format!("{} conductor(es) con la licencia vencida", matches.len()),
        matches
            .iter()
            .map(|(d, expiry)| format!("{} - licencia vencida el {}", d.full_name, format_date(*expiry))),
        "Suspender sus operaciones y renovar las licencias con urgencia",
    ))
}
