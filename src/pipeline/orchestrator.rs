use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use serde::Serialize;
use serde_json::json;
use tracing::Instrument;

use crate::error::AppResult;
use crate::models::{SourceName, StepStatus, TraceRequest, TraceResult, TraceStep};
use crate::source::DataSource;
use crate::telemetry::metrics::{
    TRACE_RUN_DURATION, TRACE_RUNS, TRACE_SOURCE_ERRORS, TRACE_STAGE_DURATION,
};

use super::findings::Findings;
use super::progress::{ProgressObserver, StepLog};

pub const DEFAULT_ANALYSIS_PAUSE: Duration = Duration::from_millis(500);

/// Runs the fixed lookup sequence for one trace at a time.
///
/// `run` takes `&mut self`, so a single orchestrator cannot host overlapping
/// runs. Use one instance per concurrent trace.
pub struct Orchestrator {
    source: Arc<dyn DataSource>,
    analysis_pause: Duration,
    log: StepLog,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Completed,
    VehicleNotFound,
    BorrowerNotFound,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::VehicleNotFound => "vehicle_not_found",
            Outcome::BorrowerNotFound => "borrower_not_found",
        }
    }
}

impl Orchestrator {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            analysis_pause: DEFAULT_ANALYSIS_PAUSE,
            log: StepLog::default(),
        }
    }

    pub fn with_analysis_pause(mut self, pause: Duration) -> Self {
        self.analysis_pause = pause;
        self
    }

    /// Copy of the current run's steps.
    pub fn steps(&self) -> Vec<TraceStep> {
        self.log.snapshot()
    }

    pub fn reset(&mut self) {
        self.log.clear();
    }

    /// Executes every stage in order, publishing a snapshot to `progress`
    /// after each step change.
    ///
    /// A missing vehicle or borrower ends the run early with a partial result.
    /// Source errors are returned as-is and may leave the last step `running`.
    #[tracing::instrument(
        name = "pipeline trace",
        skip(self, request, progress),
        fields(
            trace.vin = %request.vehicle_id,
            trace.outcome,
            trace.steps,
        )
    )]
    pub async fn run<P>(&mut self, request: &TraceRequest, progress: &mut P) -> AppResult<TraceResult>
    where
        P: ProgressObserver + ?Sized,
    {
        self.log.clear();
        let start = Instant::now();

        let outcome = self.execute(request, progress).await;

        let span = tracing::Span::current();
        span.record("trace.steps", self.log.len());

        let (outcome_label, result) = match outcome {
            Ok((outcome, findings)) => (outcome.as_str(), Ok(findings.into_result())),
            Err(e) => {
                tracing::warn!(error = %e, steps = self.log.len(), "Trace aborted by source failure");
                ("source_error", Err(e))
            }
        };

        span.record("trace.outcome", outcome_label);
        TRACE_RUNS.add(1, &[KeyValue::new("trace.outcome", outcome_label)]);
        TRACE_RUN_DURATION.record(
            start.elapsed().as_secs_f64(),
            &[KeyValue::new("trace.outcome", outcome_label)],
        );

        if result.is_ok() {
            tracing::info!(
                outcome = outcome_label,
                steps = self.log.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Trace finished"
            );
        }

        result
    }

    async fn execute<P>(
        &mut self,
        request: &TraceRequest,
        progress: &mut P,
    ) -> AppResult<(Outcome, Findings)>
    where
        P: ProgressObserver + ?Sized,
    {
        let source = Arc::clone(&self.source);
        let mut findings = Findings::default();

        let vehicle = self
            .record_stage(
                SourceName::VinLookup,
                request,
                progress,
                source.lookup_vehicle(&request.vehicle_id),
            )
            .await?;
        let Some(vehicle) = vehicle else {
            self.halt("Vehicle not found in system", progress);
            return Ok((Outcome::VehicleNotFound, findings));
        };
        findings.vehicle = Some(vehicle.clone());

        let borrower = self
            .record_stage(
                SourceName::BorrowerSearch,
                request,
                progress,
                source.lookup_borrower(&request.first_name, &request.last_name),
            )
            .await?;
        let Some(borrower) = borrower else {
            self.halt("Borrower not found in system", progress);
            return Ok((Outcome::BorrowerNotFound, findings));
        };
        findings.borrower = Some(borrower.clone());

        findings.loan = self
            .record_stage(
                SourceName::LoanStatus,
                request,
                progress,
                source.lookup_loan(&vehicle.vin, borrower.id),
            )
            .await?;

        findings.addresses = self
            .collection_stage(
                SourceName::AddressTrace,
                "addresses",
                request,
                progress,
                source.lookup_addresses(borrower.id),
            )
            .await?;

        findings.sightings = self
            .collection_stage(
                SourceName::LprScan,
                "sightings",
                request,
                progress,
                source.lookup_sightings(&vehicle.vin),
            )
            .await?;

        findings.employment = self
            .collection_stage(
                SourceName::EmploymentCheck,
                "employment",
                request,
                progress,
                source.lookup_employment(borrower.id),
            )
            .await?;

        findings.social_profiles = self
            .collection_stage(
                SourceName::SocialMedia,
                "social_profiles",
                request,
                progress,
                source.lookup_social_profiles(borrower.id),
            )
            .await?;

        findings.associates = self
            .collection_stage(
                SourceName::AssociateNetwork,
                "associates",
                request,
                progress,
                source.lookup_associates(borrower.id),
            )
            .await?;

        self.analysis_stage(request, progress).await;

        Ok((Outcome::Completed, findings))
    }

    /// Single-record stage. A miss fails the step only when the stage is fatal.
    async fn record_stage<T, F, P>(
        &mut self,
        stage: SourceName,
        request: &TraceRequest,
        progress: &mut P,
        lookup: F,
    ) -> AppResult<Option<T>>
    where
        T: Serialize,
        F: Future<Output = AppResult<Option<T>>>,
        P: ProgressObserver + ?Sized,
    {
        let record = self.lookup(stage, request, progress, lookup).await?;

        match &record {
            Some(found) => {
                let payload = serde_json::to_value(found)?;
                self.finish(StepStatus::Completed, Some(payload), progress);
            }
            None if stage.is_fatal() => self.finish(StepStatus::Failed, None, progress),
            None => self.finish(StepStatus::Completed, None, progress),
        }

        Ok(record)
    }

    /// Collection stage. Always completes, attaching `{count, <key>: [...]}`.
    async fn collection_stage<T, F, P>(
        &mut self,
        stage: SourceName,
        key: &str,
        request: &TraceRequest,
        progress: &mut P,
        lookup: F,
    ) -> AppResult<Vec<T>>
    where
        T: Serialize,
        F: Future<Output = AppResult<Vec<T>>>,
        P: ProgressObserver + ?Sized,
    {
        let rows = self.lookup(stage, request, progress, lookup).await?;

        let mut payload = serde_json::Map::new();
        payload.insert("count".to_string(), json!(rows.len()));
        payload.insert(key.to_string(), serde_json::to_value(&rows)?);
        self.finish(
            StepStatus::Completed,
            Some(serde_json::Value::Object(payload)),
            progress,
        );

        Ok(rows)
    }

    async fn lookup<R, F, P>(
        &mut self,
        stage: SourceName,
        request: &TraceRequest,
        progress: &mut P,
        lookup: F,
    ) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
        P: ProgressObserver + ?Sized,
    {
        self.begin(stage, request, progress);

        let span = tracing::info_span!(
            "pipeline_stage",
            otel.name = %format!("pipeline_stage {stage}"),
            pipeline.stage = %stage,
        );
        let start = Instant::now();
        let result = lookup.instrument(span).await;

        TRACE_STAGE_DURATION.record(
            start.elapsed().as_secs_f64(),
            &[KeyValue::new("pipeline.stage", stage.as_str())],
        );
        if let Err(e) = &result {
            TRACE_SOURCE_ERRORS.add(1, &[KeyValue::new("pipeline.stage", stage.as_str())]);
            tracing::error!(stage = %stage, error = %e, "Data source lookup failed");
        }

        result
    }

    async fn analysis_stage<P>(&mut self, request: &TraceRequest, progress: &mut P)
    where
        P: ProgressObserver + ?Sized,
    {
        let stage = SourceName::Analysis;
        self.begin(stage, request, progress);

        if !self.analysis_pause.is_zero() {
            tokio::time::sleep(self.analysis_pause).await;
        }

        self.finish(StepStatus::Completed, None, progress);
    }

    fn begin<P>(&mut self, stage: SourceName, request: &TraceRequest, progress: &mut P)
    where
        P: ProgressObserver + ?Sized,
    {
        let message = stage.running_message(request).unwrap_or_default();
        tracing::debug!(stage = %stage, sequence = self.log.len() + 1, "Stage started");
        self.log.append(stage, StepStatus::Running, message);
        progress.on_progress(self.log.snapshot());
    }

    fn finish<P>(&mut self, status: StepStatus, payload: Option<serde_json::Value>, progress: &mut P)
    where
        P: ProgressObserver + ?Sized,
    {
        if self.log.finish_last(status, payload) {
            progress.on_progress(self.log.snapshot());
        }
    }

    fn halt<P>(&mut self, message: &str, progress: &mut P)
    where
        P: ProgressObserver + ?Sized,
    {
        tracing::info!(reason = message, "Trace halted on fatal miss");
        self.log
            .append(SourceName::Error, StepStatus::Failed, message.to_string());
        progress.on_progress(self.log.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    use super::*;
    use crate::error::AppError;
    use crate::models::{
        AddressRecord, Associate, Borrower, EmploymentRecord, LoanInfo, SocialProfile, Vehicle,
        VehicleSighting,
    };
    use crate::pipeline::progress::NoProgress;
    use crate::pipeline::summary::INSUFFICIENT_DATA_SUMMARY;
    use crate::source::InMemoryDataSource;

    const VIN: &str = "1HGBH41JXMN109186";

    fn borrower_id() -> Uuid {
        Uuid::from_u128(0x6a1f_2a3e_2f5c_4a7e_9d3b_1f2e_3d4c_5b6a)
    }

    fn vehicle() -> Vehicle {
        Vehicle {
            vin: VIN.to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
            color: "Blue".to_string(),
            license_plate: Some("8XYZ321".to_string()),
            state: Some("CA".to_string()),
        }
    }

    fn borrower() -> Borrower {
        Borrower {
            id: borrower_id(),
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            phone: Some("555-0100".to_string()),
            email: None,
            ssn_last_four: None,
            dob: None,
        }
    }

    fn sighting(location: &str, day: u32) -> VehicleSighting {
        VehicleSighting {
            location: location.to_string(),
            latitude: None,
            longitude: None,
            sighting_date: Utc.with_ymd_and_hms(2024, 6, day, 9, 30, 0).unwrap(),
            source: "lpr".to_string(),
            confidence: "high".to_string(),
            notes: None,
        }
    }

    fn populated_source() -> InMemoryDataSource {
        let id = borrower_id();
        InMemoryDataSource::new()
            .with_vehicle(vehicle())
            .with_borrower(borrower())
            .with_loan(
                VIN,
                id,
                LoanInfo {
                    loan_amount: 21350.0,
                    days_delinquent: 120,
                    status: "delinquent".to_string(),
                },
            )
            .with_address(
                id,
                AddressRecord {
                    address_type: "current".to_string(),
                    street: "42 Pine St".to_string(),
                    city: "Fresno".to_string(),
                    state: "CA".to_string(),
                    zip: "93721".to_string(),
                    verified_date: None,
                    confidence_score: 88,
                },
            )
            .with_sighting(VIN, sighting("Target Lot", 3))
            .with_sighting(VIN, sighting("Gas Station", 5))
            .with_employment(
                id,
                EmploymentRecord {
                    employer_name: "Valley Freight".to_string(),
                    employer_address: Some("100 Dock Rd".to_string()),
                    employer_phone: None,
                    position: None,
                    start_date: None,
                    is_current: true,
                    verified_date: None,
                },
            )
            .with_social_profile(
                id,
                SocialProfile {
                    platform: "facebook".to_string(),
                    profile_url: None,
                    last_activity: None,
                    location_shared: Some("Fresno, CA".to_string()),
                },
            )
            .with_associate(
                id,
                Associate {
                    name: "Jane Smith".to_string(),
                    relationship: "spouse".to_string(),
                    phone: None,
                    address: Some("42 Pine St".to_string()),
                },
            )
    }

    fn orchestrator(source: impl DataSource + 'static) -> Orchestrator {
        Orchestrator::new(Arc::new(source)).with_analysis_pause(Duration::ZERO)
    }

    fn request() -> TraceRequest {
        TraceRequest::new(VIN, "John", "Smith")
    }

    fn summarize(steps: &[TraceStep]) -> Vec<(SourceName, StepStatus)> {
        steps.iter().map(|s| (s.source, s.status)).collect()
    }

    #[tokio::test]
    async fn test_full_run_completes_every_stage_in_order() {
        let mut orchestrator = orchestrator(populated_source());
        let mut snapshots: Vec<Vec<TraceStep>> = Vec::new();
        let mut observer = |steps: Vec<TraceStep>| snapshots.push(steps);

        let result = assert_ok!(orchestrator.run(&request(), &mut observer).await);
        let steps = orchestrator.steps();

        let expected: Vec<(SourceName, StepStatus)> = SourceName::PIPELINE
            .iter()
            .map(|s| (*s, StepStatus::Completed))
            .collect();
        assert_eq!(summarize(&steps), expected);
        let sequences: Vec<u32> = steps.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, (1..=9).collect::<Vec<u32>>());

        assert_eq!(snapshots.len(), 18);
        assert!(snapshots.windows(2).all(|w| w[0].len() <= w[1].len()));
        assert_eq!(snapshots.last(), Some(&steps));

        assert_eq!(result.vehicle, Some(vehicle()));
        assert_eq!(result.loan.as_ref().map(|l| l.days_delinquent), Some(120));
        assert_eq!(result.sightings[0].location, "Gas Station");
        assert_eq!(result.social_profiles.len(), 1);
        assert!(result.summary.starts_with("Subject: John Smith"));
        assert!(result.recommendations.iter().any(|r| r.starts_with("Pattern detected")));
    }

    #[tokio::test]
    async fn test_collection_payload_carries_count() {
        let mut orchestrator = orchestrator(populated_source());
        assert_ok!(orchestrator.run(&request(), &mut NoProgress).await);

        let steps = orchestrator.steps();
        let lpr = steps.iter().find(|s| s.source == SourceName::LprScan).unwrap();
        let payload = lpr.payload.as_ref().unwrap();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["sightings"][0]["location"], "Gas Station");

        let analysis = steps.last().unwrap();
        assert_eq!(analysis.source, SourceName::Analysis);
        assert!(analysis.payload.is_none());
    }

    #[tokio::test]
    async fn test_missing_vehicle_halts_after_two_steps() {
        let mut orchestrator = orchestrator(InMemoryDataSource::new().with_borrower(borrower()));
        let mut calls = 0;
        let mut observer = |_steps: Vec<TraceStep>| calls += 1;

        let result = assert_ok!(orchestrator.run(&request(), &mut observer).await);
        let steps = orchestrator.steps();

        assert_eq!(
            summarize(&steps),
            vec![
                (SourceName::VinLookup, StepStatus::Failed),
                (SourceName::Error, StepStatus::Failed),
            ]
        );
        assert_eq!(steps[1].message, "Vehicle not found in system");
        assert_eq!(steps[1].sequence, 2);
        assert!(steps[0].payload.is_none());
        assert_eq!(calls, 3);
        assert!(result.vehicle.is_none());
        assert!(result.borrower.is_none());
        assert_eq!(result.summary, INSUFFICIENT_DATA_SUMMARY);
        assert_eq!(result.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_borrower_halts_after_three_steps() {
        let source = InMemoryDataSource::new()
            .with_vehicle(vehicle())
            .with_sighting(VIN, sighting("Target Lot", 3));
        let mut orchestrator = orchestrator(source);

        let result = assert_ok!(orchestrator.run(&request(), &mut NoProgress).await);
        let steps = orchestrator.steps();

        assert_eq!(
            summarize(&steps),
            vec![
                (SourceName::VinLookup, StepStatus::Completed),
                (SourceName::BorrowerSearch, StepStatus::Failed),
                (SourceName::Error, StepStatus::Failed),
            ]
        );
        assert_eq!(steps[2].message, "Borrower not found in system");
        assert!(result.vehicle.is_some());
        assert!(result.loan.is_none());
        assert!(result.sightings.is_empty());
        assert!(result.associates.is_empty());
        assert_eq!(result.summary, INSUFFICIENT_DATA_SUMMARY);
    }

    #[tokio::test]
    async fn test_missing_loan_is_a_soft_miss() {
        let source = InMemoryDataSource::new()
            .with_vehicle(vehicle())
            .with_borrower(borrower());
        let mut orchestrator = orchestrator(source);

        let result = assert_ok!(orchestrator.run(&request(), &mut NoProgress).await);
        let steps = orchestrator.steps();

        assert_eq!(steps.len(), 9);
        assert!(steps.iter().all(|s| s.status == StepStatus::Completed));
        assert!(steps[2].payload.is_none());
        assert!(result.loan.is_none());
        assert!(!result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_step_timestamp_survives_transition() {
        let mut orchestrator = orchestrator(populated_source());
        let mut first_seen = Vec::new();
        let mut observer = |steps: Vec<TraceStep>| first_seen.push(steps[0].clone());

        assert_ok!(orchestrator.run(&request(), &mut observer).await);

        assert_eq!(first_seen[0].status, StepStatus::Running);
        assert_eq!(first_seen[1].status, StepStatus::Completed);
        assert!(first_seen.iter().all(|s| s.timestamp == first_seen[0].timestamp));
    }

    #[tokio::test]
    async fn test_each_run_starts_with_a_fresh_log() {
        let mut orchestrator = orchestrator(populated_source());
        assert_ok!(orchestrator.run(&request(), &mut NoProgress).await);
        assert_eq!(orchestrator.steps().len(), 9);

        let missing = TraceRequest::new("NOPE", "John", "Smith");
        assert_ok!(orchestrator.run(&missing, &mut NoProgress).await);
        let steps = orchestrator.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].sequence, 1);

        orchestrator.reset();
        assert!(orchestrator.steps().is_empty());
    }

    struct FailingSightings(InMemoryDataSource);

    #[async_trait::async_trait]
    impl DataSource for FailingSightings {
        async fn lookup_vehicle(&self, vin: &str) -> AppResult<Option<Vehicle>> {
            self.0.lookup_vehicle(vin).await
        }

        async fn lookup_borrower(&self, first: &str, last: &str) -> AppResult<Option<Borrower>> {
            self.0.lookup_borrower(first, last).await
        }

        async fn lookup_loan(&self, vin: &str, id: Uuid) -> AppResult<Option<LoanInfo>> {
            self.0.lookup_loan(vin, id).await
        }

        async fn lookup_addresses(&self, id: Uuid) -> AppResult<Vec<AddressRecord>> {
            self.0.lookup_addresses(id).await
        }

        async fn lookup_sightings(&self, _vin: &str) -> AppResult<Vec<VehicleSighting>> {
            Err(AppError::Source("LPR network timeout".to_string()))
        }

        async fn lookup_employment(&self, id: Uuid) -> AppResult<Vec<EmploymentRecord>> {
            self.0.lookup_employment(id).await
        }

        async fn lookup_social_profiles(&self, id: Uuid) -> AppResult<Vec<SocialProfile>> {
            self.0.lookup_social_profiles(id).await
        }

        async fn lookup_associates(&self, id: Uuid) -> AppResult<Vec<Associate>> {
            self.0.lookup_associates(id).await
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_source_failure_propagates_and_leaves_step_running() {
        let mut orchestrator = orchestrator(FailingSightings(populated_source()));

        let err = assert_err!(orchestrator.run(&request(), &mut NoProgress).await);
        assert!(matches!(err, AppError::Source(_)));

        let steps = orchestrator.steps();
        assert_eq!(steps.len(), 5);
        let last = steps.last().unwrap();
        assert_eq!(last.source, SourceName::LprScan);
        assert_eq!(last.status, StepStatus::Running);
        assert!(!steps.iter().any(|s| s.source == SourceName::Error));
    }

    #[tokio::test]
    async fn test_analysis_pause_is_observed() {
        let mut orchestrator = Orchestrator::new(Arc::new(populated_source()))
            .with_analysis_pause(Duration::from_millis(30));

        let start = Instant::now();
        assert_ok!(orchestrator.run(&request(), &mut NoProgress).await);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
