use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Borrower {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub ssn_last_four: Option<String>,
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AddressRecord {
    /// `current`, `previous`, `mailing`, ...
    pub address_type: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub verified_date: Option<NaiveDate>,
    /// 0-100.
    pub confidence_score: i32,
}

impl AddressRecord {
    pub fn is_current(&self) -> bool {
        self.address_type == "current"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmploymentRecord {
    pub employer_name: String,
    pub employer_address: Option<String>,
    pub employer_phone: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub is_current: bool,
    pub verified_date: Option<NaiveDate>,
}

impl EmploymentRecord {
    /// Employer address, if one is on file and non-empty.
    pub fn work_location(&self) -> Option<&str> {
        self.employer_address
            .as_deref()
            .filter(|address| !address.is_empty())
    }
}
