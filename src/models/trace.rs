use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
    VehicleSighting,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRequest {
    pub vehicle_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl TraceRequest {
    pub fn new(
        vehicle_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Which lookup a step represents. `Error` tags the terminal step appended
/// after a fatal miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceName {
    VinLookup,
    BorrowerSearch,
    LoanStatus,
    AddressTrace,
    LprScan,
    EmploymentCheck,
    SocialMedia,
    AssociateNetwork,
    Analysis,
    Error,
}

impl SourceName {
    /// Stages in execution order.
    pub const PIPELINE: [SourceName; 9] = [
        SourceName::VinLookup,
        SourceName::BorrowerSearch,
        SourceName::LoanStatus,
        SourceName::AddressTrace,
        SourceName::LprScan,
        SourceName::EmploymentCheck,
        SourceName::SocialMedia,
        SourceName::AssociateNetwork,
        SourceName::Analysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::VinLookup => "VIN_LOOKUP",
            SourceName::BorrowerSearch => "BORROWER_SEARCH",
            SourceName::LoanStatus => "LOAN_STATUS",
            SourceName::AddressTrace => "ADDRESS_TRACE",
            SourceName::LprScan => "LPR_SCAN",
            SourceName::EmploymentCheck => "EMPLOYMENT_CHECK",
            SourceName::SocialMedia => "SOCIAL_MEDIA",
            SourceName::AssociateNetwork => "ASSOCIATE_NETWORK",
            SourceName::Analysis => "ANALYSIS",
            SourceName::Error => "ERROR",
        }
    }

    /// A miss on a fatal stage halts the pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceName::VinLookup | SourceName::BorrowerSearch)
    }

    /// Message for the step while the stage runs. `None` for `Error`, which
    /// is only ever appended as a failed step carrying the halt reason.
    pub fn running_message(&self, request: &TraceRequest) -> Option<String> {
        let message = match self {
            SourceName::VinLookup => {
                format!("Querying DMV database for VIN: {}", request.vehicle_id)
            }
            SourceName::BorrowerSearch => format!(
                "Searching credit bureau for {} {}",
                request.first_name, request.last_name
            ),
            SourceName::LoanStatus => "Retrieving loan account details".to_string(),
            SourceName::AddressTrace => "Running comprehensive address trace".to_string(),
            SourceName::LprScan => "Scanning license plate recognition database".to_string(),
            SourceName::EmploymentCheck => "Checking employment databases".to_string(),
            SourceName::SocialMedia => "Analyzing social media presence".to_string(),
            SourceName::AssociateNetwork => "Mapping associate network".to_string(),
            SourceName::Analysis => "Generating intelligence report".to_string(),
            SourceName::Error => return None,
        };
        Some(message)
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub sequence: u32,
    pub source: SourceName,
    pub status: StepStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl TraceStep {
    pub fn new(sequence: u32, source: SourceName, message: impl Into<String>) -> Self {
        Self {
            sequence,
            source,
            status: StepStatus::Pending,
            message: message.into(),
            payload: None,
            timestamp: Utc::now(),
        }
    }

    /// Copy of this step with a new status. The timestamp is kept.
    pub fn with_status(&self, status: StepStatus, payload: Option<serde_json::Value>) -> Self {
        Self {
            status,
            payload: payload.or_else(|| self.payload.clone()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    pub vehicle: Option<Vehicle>,
    pub borrower: Option<Borrower>,
    pub loan: Option<LoanInfo>,
    pub addresses: Vec<AddressRecord>,
    pub sightings: Vec<VehicleSighting>,
    pub employment: Vec<EmploymentRecord>,
    pub social_profiles: Vec<SocialProfile>,
    pub associates: Vec<Associate>,
    pub summary: String,
    pub recommendations: Vec<String>,
}
