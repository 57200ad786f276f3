use crate::models::{
    AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, TraceResult,
    Vehicle, VehicleSighting,
};

use super::recommend::generate_recommendations;
use super::summary::generate_summary;

/// Records gathered so far in a run.
#[derive(Debug, Default, Clone)]
pub struct Findings {
    pub vehicle: Option<Vehicle>,
    pub borrower: Option<Borrower>,
    pub loan: Option<LoanInfo>,
    pub addresses: Vec<AddressRecord>,
    pub sightings: Vec<VehicleSighting>,
    pub employment: Vec<EmploymentRecord>,
    pub social_profiles: Vec<SocialProfile>,
    pub associates: Vec<Associate>,
}

impl Findings {
    #[tracing::instrument(
        name = "pipeline_stage report",
        skip(self),
        fields(
            pipeline.stage = "report",
            report.recommendations,
        )
    )]
    pub fn into_result(self) -> TraceResult {
        let summary = generate_summary(
            self.vehicle.as_ref(),
            self.borrower.as_ref(),
            self.loan.as_ref(),
            &self.addresses,
            &self.sightings,
            &self.employment,
        );
        let recommendations = generate_recommendations(
            &self.addresses,
            &self.sightings,
            &self.employment,
            &self.associates,
        );

        tracing::Span::current().record("report.recommendations", recommendations.len());

        TraceResult {
            vehicle: self.vehicle,
            borrower: self.borrower,
            loan: self.loan,
            addresses: self.addresses,
            sightings: self.sightings,
            employment: self.employment,
            social_profiles: self.social_profiles,
            associates: self.associates,
            summary,
            recommendations,
        }
    }
}
