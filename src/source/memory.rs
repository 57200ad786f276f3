use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use super::DataSource;
use crate::error::{AppError, AppResult};
use crate::models::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
    VehicleSighting,
};

/// JSON fixture layout: vehicles carry their sightings, borrowers carry
/// everything keyed by borrower id.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub vehicles: Vec<VehicleFixture>,
    #[serde(default)]
    pub borrowers: Vec<BorrowerFixture>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleFixture {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    #[serde(default)]
    pub sightings: Vec<VehicleSighting>,
}

#[derive(Debug, Deserialize)]
pub struct BorrowerFixture {
    #[serde(flatten)]
    pub borrower: Borrower,
    #[serde(default)]
    pub loans: Vec<LoanFixture>,
    #[serde(default)]
    pub addresses: Vec<AddressRecord>,
    #[serde(default)]
    pub employment: Vec<EmploymentRecord>,
    #[serde(default)]
    pub social_profiles: Vec<SocialProfile>,
    #[serde(default)]
    pub associates: Vec<Associate>,
}

#[derive(Debug, Deserialize)]
pub struct LoanFixture {
    pub vin: String,
    #[serde(flatten)]
    pub loan: LoanInfo,
}

/// Fixture-backed source. Collections are returned in the same order the
/// postgres source produces.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDataSource {
    vehicles: HashMap<String, Vehicle>,
    borrowers: Vec<Borrower>,
    loans: HashMap<(String, Uuid), LoanInfo>,
    addresses: HashMap<Uuid, Vec<AddressRecord>>,
    sightings: HashMap<String, Vec<VehicleSighting>>,
    employment: HashMap<Uuid, Vec<EmploymentRecord>>,
    social_profiles: HashMap<Uuid, Vec<SocialProfile>>,
    associates: HashMap<Uuid, Vec<Associate>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut source = Self::new();
        for entry in fixture.vehicles {
            let vin = entry.vehicle.vin.clone();
            source = source.with_vehicle(entry.vehicle);
            for sighting in entry.sightings {
                source = source.with_sighting(&vin, sighting);
            }
        }
        for entry in fixture.borrowers {
            let id = entry.borrower.id;
            source = source.with_borrower(entry.borrower);
            for loan in entry.loans {
                source = source.with_loan(&loan.vin, id, loan.loan);
            }
            source.addresses.entry(id).or_default().extend(entry.addresses);
            source.employment.entry(id).or_default().extend(entry.employment);
            source
                .social_profiles
                .entry(id)
                .or_default()
                .extend(entry.social_profiles);
            source.associates.entry(id).or_default().extend(entry.associates);
        }
        source
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Internal(format!("failed to read fixture {}: {e}", path.display()))
        })?;
        let source = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            vehicles = source.vehicles.len(),
            borrowers = source.borrowers.len(),
            "Loaded trace fixtures"
        );
        Ok(source)
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.insert(vehicle.vin.clone(), vehicle);
        self
    }

    pub fn with_borrower(mut self, borrower: Borrower) -> Self {
        self.borrowers.push(borrower);
        self
    }

    pub fn with_loan(mut self, vin: &str, borrower_id: Uuid, loan: LoanInfo) -> Self {
        self.loans.insert((vin.to_string(), borrower_id), loan);
        self
    }

    pub fn with_address(mut self, borrower_id: Uuid, address: AddressRecord) -> Self {
        self.addresses.entry(borrower_id).or_default().push(address);
        self
    }

    pub fn with_sighting(mut self, vin: &str, sighting: VehicleSighting) -> Self {
        self.sightings.entry(vin.to_string()).or_default().push(sighting);
        self
    }

    pub fn with_employment(mut self, borrower_id: Uuid, record: EmploymentRecord) -> Self {
        self.employment.entry(borrower_id).or_default().push(record);
        self
    }

    pub fn with_social_profile(mut self, borrower_id: Uuid, profile: SocialProfile) -> Self {
        self.social_profiles
            .entry(borrower_id)
            .or_default()
            .push(profile);
        self
    }

    pub fn with_associate(mut self, borrower_id: Uuid, associate: Associate) -> Self {
        self.associates.entry(borrower_id).or_default().push(associate);
        self
    }
}

fn records<K, T>(map: &HashMap<K, Vec<T>>, key: &K) -> Vec<T>
where
    K: std::hash::Hash + Eq,
    T: Clone,
{
    map.get(key).cloned().unwrap_or_default()
}

#[async_trait::async_trait]
impl DataSource for InMemoryDataSource {
    async fn lookup_vehicle(&self, vin: &str) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.get(vin).cloned())
    }

    async fn lookup_borrower(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<Option<Borrower>> {
        let first_name = first_name.to_lowercase();
        let last_name = last_name.to_lowercase();
        Ok(self
            .borrowers
            .iter()
            .filter(|b| {
                b.first_name.to_lowercase() == first_name && b.last_name.to_lowercase() == last_name
            })
            .min_by_key(|b| b.id)
            .cloned())
    }

    async fn lookup_loan(&self, vin: &str, borrower_id: Uuid) -> AppResult<Option<LoanInfo>> {
        Ok(self.loans.get(&(vin.to_string(), borrower_id)).cloned())
    }

    async fn lookup_addresses(&self, borrower_id: Uuid) -> AppResult<Vec<AddressRecord>> {
        let mut rows = records(&self.addresses, &borrower_id);
        rows.sort_by_key(|a| Reverse(a.confidence_score));
        Ok(rows)
    }

    async fn lookup_sightings(&self, vin: &str) -> AppResult<Vec<VehicleSighting>> {
        let mut rows = records(&self.sightings, &vin.to_string());
        rows.sort_by_key(|s| Reverse(s.sighting_date));
        Ok(rows)
    }

    async fn lookup_employment(&self, borrower_id: Uuid) -> AppResult<Vec<EmploymentRecord>> {
        let mut rows = records(&self.employment, &borrower_id);
        rows.sort_by_key(|e| Reverse(e.is_current));
        Ok(rows)
    }

    async fn lookup_social_profiles(&self, borrower_id: Uuid) -> AppResult<Vec<SocialProfile>> {
        let mut rows = records(&self.social_profiles, &borrower_id);
        // Some(_) sorts above None under Reverse, matching NULLS LAST.
        rows.sort_by_key(|p| Reverse(p.last_activity));
        Ok(rows)
    }

    async fn lookup_associates(&self, borrower_id: Uuid) -> AppResult<Vec<Associate>> {
        Ok(records(&self.associates, &borrower_id))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
