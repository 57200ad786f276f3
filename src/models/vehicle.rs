use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: Option<String>,
    pub state: Option<String>,
}

/// License plate recognition hit for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VehicleSighting {
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sighting_date: DateTime<Utc>,
    pub source: String,
    pub confidence: String,
    pub notes: Option<String>,
}

/// Loan account tying a vehicle to a borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoanInfo {
    pub loan_amount: f64,
    pub days_delinquent: i32,
    pub status: String,
}
