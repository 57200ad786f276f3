use std::time::Duration;

use uuid::Uuid;

use super::DataSource;
use crate::error::AppResult;
use crate::models::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
    VehicleSighting,
};

/// Per-lookup latency the simulated bureaus answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLatency {
    pub vehicle: Duration,
    pub borrower: Duration,
    pub loan: Duration,
    pub addresses: Duration,
    pub sightings: Duration,
    pub employment: Duration,
    pub social_profiles: Duration,
    pub associates: Duration,
}

impl Default for SourceLatency {
    fn default() -> Self {
        Self {
            vehicle: Duration::from_millis(800),
            borrower: Duration::from_millis(700),
            loan: Duration::from_millis(600),
            addresses: Duration::from_millis(900),
            sightings: Duration::from_millis(1000),
            employment: Duration::from_millis(750),
            social_profiles: Duration::from_millis(850),
            associates: Duration::from_millis(650),
        }
    }
}

impl SourceLatency {
    pub fn none() -> Self {
        Self {
            vehicle: Duration::ZERO,
            borrower: Duration::ZERO,
            loan: Duration::ZERO,
            addresses: Duration::ZERO,
            sightings: Duration::ZERO,
            employment: Duration::ZERO,
            social_profiles: Duration::ZERO,
            associates: Duration::ZERO,
        }
    }

    pub fn total(&self) -> Duration {
        self.vehicle
            + self.borrower
            + self.loan
            + self.addresses
            + self.sightings
            + self.employment
            + self.social_profiles
            + self.associates
    }
}

/// Wraps a source and sleeps before every lookup.
pub struct Delayed<S> {
    inner: S,
    latency: SourceLatency,
}

impl<S: DataSource> Delayed<S> {
    pub fn new(inner: S, latency: SourceLatency) -> Self {
        Self { inner, latency }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait::async_trait]
impl<S: DataSource> DataSource for Delayed<S> {
    async fn lookup_vehicle(&self, vin: &str) -> AppResult<Option<Vehicle>> {
        pause(self.latency.vehicle).await;
        self.inner.lookup_vehicle(vin).await
    }

    async fn lookup_borrower(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<Option<Borrower>> {
        pause(self.latency.borrower).await;
        self.inner.lookup_borrower(first_name, last_name).await
    }

    async fn lookup_loan(&self, vin: &str, borrower_id: Uuid) -> AppResult<Option<LoanInfo>> {
        pause(self.latency.loan).await;
        self.inner.lookup_loan(vin, borrower_id).await
    }

    async fn lookup_addresses(&self, borrower_id: Uuid) -> AppResult<Vec<AddressRecord>> {
        pause(self.latency.addresses).await;
        self.inner.lookup_addresses(borrower_id).await
    }

    async fn lookup_sightings(&self, vin: &str) -> AppResult<Vec<VehicleSighting>> {
        pause(self.latency.sightings).await;
        self.inner.lookup_sightings(vin).await
    }

    async fn lookup_employment(&self, borrower_id: Uuid) -> AppResult<Vec<EmploymentRecord>> {
        pause(self.latency.employment).await;
        self.inner.lookup_employment(borrower_id).await
    }

    async fn lookup_social_profiles(&self, borrower_id: Uuid) -> AppResult<Vec<SocialProfile>> {
        pause(self.latency.social_profiles).await;
        self.inner.lookup_social_profiles(borrower_id).await
    }

    async fn lookup_associates(&self, borrower_id: Uuid) -> AppResult<Vec<Associate>> {
        pause(self.latency.associates).await;
        self.inner.lookup_associates(borrower_id).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
