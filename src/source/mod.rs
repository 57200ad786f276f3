pub mod delayed;
pub mod memory;
pub mod postgres;

pub use delayed::{Delayed, SourceLatency};
pub use memory::InMemoryDataSource;
pub use postgres::PgDataSource;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
    VehicleSighting,
};

/// Record lookups backing a trace run.
///
/// A record that does not exist is `Ok(None)` or an empty collection. `Err`
/// is reserved for the source itself failing to answer.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn lookup_vehicle(&self, vin: &str) -> AppResult<Option<Vehicle>>;

    async fn lookup_borrower(&self, first_name: &str, last_name: &str)
    -> AppResult<Option<Borrower>>;

    async fn lookup_loan(&self, vin: &str, borrower_id: Uuid) -> AppResult<Option<LoanInfo>>;

    /// Highest confidence first.
    async fn lookup_addresses(&self, borrower_id: Uuid) -> AppResult<Vec<AddressRecord>>;

    /// Newest first.
    async fn lookup_sightings(&self, vin: &str) -> AppResult<Vec<VehicleSighting>>;

    /// Current employers first.
    async fn lookup_employment(&self, borrower_id: Uuid) -> AppResult<Vec<EmploymentRecord>>;

    async fn lookup_social_profiles(&self, borrower_id: Uuid) -> AppResult<Vec<SocialProfile>>;

    async fn lookup_associates(&self, borrower_id: Uuid) -> AppResult<Vec<Associate>>;

    fn name(&self) -> &str;
}
