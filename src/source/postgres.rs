use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::DataSource;
use crate::error::AppResult;
use crate::models::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
    VehicleSighting,
};

#[derive(Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(25)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("Database connection pool created");

        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl DataSource for PgDataSource {
    #[tracing::instrument(name = "db.vehicles.lookup", skip(self))]
    async fn lookup_vehicle(&self, vin: &str) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT vin, make, model, year, color, license_plate, state \
             FROM vehicles \
             WHERE vin = $1",
        )
        .bind(vin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    // Names stay out of the span; only the match outcome is recorded.
    #[tracing::instrument(
        name = "db.borrowers.lookup",
        skip(self, first_name, last_name),
        fields(borrower.found)
    )]
    async fn lookup_borrower(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, first_name, last_name, phone, email, ssn_last_four, dob \
             FROM borrowers \
             WHERE lower(first_name) = lower($1) \
               AND lower(last_name) = lower($2) \
             ORDER BY id \
             LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;

        tracing::Span::current().record("borrower.found", borrower.is_some());

        Ok(borrower)
    }

    #[tracing::instrument(name = "db.vehicle_ownership.lookup", skip(self))]
    async fn lookup_loan(&self, vin: &str, borrower_id: Uuid) -> AppResult<Option<LoanInfo>> {
        let loan = sqlx::query_as::<_, LoanInfo>(
            "SELECT loan_amount::float8 AS loan_amount, days_delinquent, status \
             FROM vehicle_ownership \
             WHERE vehicle_id = $1 AND borrower_id = $2 \
             LIMIT 1",
        )
        .bind(vin)
        .bind(borrower_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    #[tracing::instrument(name = "db.address_history.query", skip(self), fields(row_count))]
    async fn lookup_addresses(&self, borrower_id: Uuid) -> AppResult<Vec<AddressRecord>> {
        let rows = sqlx::query_as::<_, AddressRecord>(
            "SELECT address_type, street, city, state, zip, verified_date, confidence_score \
             FROM address_history \
             WHERE borrower_id = $1 \
             ORDER BY confidence_score DESC",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::Span::current().record("row_count", rows.len());
        Ok(rows)
    }

    #[tracing::instrument(name = "db.vehicle_sightings.query", skip(self), fields(row_count))]
    async fn lookup_sightings(&self, vin: &str) -> AppResult<Vec<VehicleSighting>> {
        let rows = sqlx::query_as::<_, VehicleSighting>(
            "SELECT location, latitude::float8 AS latitude, longitude::float8 AS longitude, \
                    sighting_date, source, confidence, notes \
             FROM vehicle_sightings \
             WHERE vehicle_id = $1 \
             ORDER BY sighting_date DESC",
        )
        .bind(vin)
        .fetch_all(&self.pool)
        .await?;

        tracing::Span::current().record("row_count", rows.len());
        Ok(rows)
    }

    #[tracing::instrument(name = "db.employment_records.query", skip(self), fields(row_count))]
    async fn lookup_employment(&self, borrower_id: Uuid) -> AppResult<Vec<EmploymentRecord>> {
        let rows = sqlx::query_as::<_, EmploymentRecord>(
            "SELECT employer_name, employer_address, employer_phone, position, \
                    start_date, is_current, verified_date \
             FROM employment_records \
             WHERE borrower_id = $1 \
             ORDER BY is_current DESC",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::Span::current().record("row_count", rows.len());
        Ok(rows)
    }

    #[tracing::instrument(name = "db.social_media_profiles.query", skip(self), fields(row_count))]
    async fn lookup_social_profiles(&self, borrower_id: Uuid) -> AppResult<Vec<SocialProfile>> {
        let rows = sqlx::query_as::<_, SocialProfile>(
            "SELECT platform, profile_url, last_activity, location_shared \
             FROM social_media_profiles \
             WHERE borrower_id = $1 \
             ORDER BY last_activity DESC NULLS LAST",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::Span::current().record("row_count", rows.len());
        Ok(rows)
    }

    #[tracing::instrument(name = "db.associates.query", skip(self), fields(row_count))]
    async fn lookup_associates(&self, borrower_id: Uuid) -> AppResult<Vec<Associate>> {
        let rows = sqlx::query_as::<_, Associate>(
            "SELECT name, relationship, phone, address \
             FROM associates \
             WHERE borrower_id = $1",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::Span::current().record("row_count", rows.len());
        Ok(rows)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
