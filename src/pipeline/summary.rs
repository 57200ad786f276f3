use chrono::{DateTime, Utc};

use crate::models::{AddressRecord, Borrower, EmploymentRecord, LoanInfo, Vehicle, VehicleSighting};

pub const INSUFFICIENT_DATA_SUMMARY: &str = "Unable to complete trace - insufficient data found.";

/// Plain-text case summary. Sections after the vehicle block are emitted only
/// when their record exists; a leading blank line separates sections.
pub fn generate_summary(
    vehicle: Option<&Vehicle>,
    borrower: Option<&Borrower>,
    loan: Option<&LoanInfo>,
    addresses: &[AddressRecord],
    sightings: &[VehicleSighting],
    employment: &[EmploymentRecord],
) -> String {
    let (Some(vehicle), Some(borrower)) = (vehicle, borrower) else {
        return INSUFFICIENT_DATA_SUMMARY.to_string();
    };

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "Subject: {} {}",
        borrower.first_name, borrower.last_name
    ));
    parts.push(format!(
        "Vehicle: {} {} {} ({})",
        vehicle.year, vehicle.make, vehicle.model, vehicle.color
    ));
    parts.push(format!("VIN: {}", vehicle.vin));

    if let Some(plate) = vehicle.license_plate.as_deref().filter(|p| !p.is_empty()) {
        match vehicle.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => parts.push(format!("License Plate: {plate} ({state})")),
            None => parts.push(format!("License Plate: {plate}")),
        }
    }

    if let Some(loan) = loan {
        parts.push(format!("\nLoan Status: {} days delinquent", loan.days_delinquent));
        parts.push(format!(
            "Outstanding Amount: ${}",
            format_amount(loan.loan_amount)
        ));
    }

    if let Some(phone) = borrower.phone.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("\nContact: {phone}"));
    }

    if let Some(address) = addresses.iter().find(|a| a.is_current()) {
        parts.push(format!(
            "Last Known Address: {}, {}, {} {}",
            address.street, address.city, address.state, address.zip
        ));
        parts.push(format!("Address Confidence: {}%", address.confidence_score));
    }

    if let Some(latest) = sightings.first() {
        parts.push(format!("\nLatest Vehicle Sighting: {}", latest.location));
        parts.push(format!("Date: {}", format_sighting_time(&latest.sighting_date)));
        parts.push(format!(
            "Source: {} - Confidence: {}",
            latest.source.to_uppercase(),
            latest.confidence
        ));
    }

    if let Some(job) = employment.iter().find(|e| e.is_current) {
        parts.push(format!("\nCurrent Employment: {}", job.employer_name));
        if let Some(location) = job.work_location() {
            parts.push(format!("Work Location: {location}"));
        }
    }

    parts.join("\n")
}

/// `18500.5` -> `18,500.5`. At most two fraction digits, trailing zeros dropped.
pub(crate) fn format_amount(amount: f64) -> String {
    let rendered = format!("{:.2}", amount.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    let sign = if amount < 0.0 && rendered != "0.00" { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

/// `3/14/2024 at 6:05:09 PM`, in UTC.
pub(crate) fn format_sighting_time(at: &DateTime<Utc>) -> String {
    format!("{} at {}", at.format("%-m/%-d/%Y"), at.format("%-I:%M:%S %p"))
}
