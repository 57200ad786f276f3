use crate::models::{AddressRecord, Associate, EmploymentRecord, VehicleSighting};

pub const FALLBACK_RECOMMENDATION: &str =
    "Insufficient data for specific recommendations. Consider additional skip tracing resources.";

const SURVEILLANCE_MIN_CONFIDENCE: i32 = 70;
const MAX_SURVEILLANCE_ADDRESSES: usize = 2;
const MAX_ASSOCIATES: usize = 2;
const PATTERN_WINDOW: usize = 3;

/// Ranked field actions. Never empty.
pub fn generate_recommendations(
    addresses: &[AddressRecord],
    sightings: &[VehicleSighting],
    employment: &[EmploymentRecord],
    associates: &[Associate],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if let Some(latest) = sightings.first() {
        recommendations.push(format!(
            "Check {} - vehicle was spotted there recently via {}",
            latest.location, latest.source
        ));
    }

    recommendations.extend(
        addresses
            .iter()
            .filter(|a| a.confidence_score >= SURVEILLANCE_MIN_CONFIDENCE)
            .take(MAX_SURVEILLANCE_ADDRESSES)
            .map(|a| {
                format!(
                    "Conduct surveillance at {}, {}, {} ({}% confidence)",
                    a.street, a.city, a.state, a.confidence_score
                )
            }),
    );

    if let Some(location) = employment
        .iter()
        .find(|e| e.is_current)
        .and_then(EmploymentRecord::work_location)
    {
        recommendations.push(format!(
            "Monitor work location: {location} during business hours"
        ));
    }

    // The two-relative cap applies before the address filter.
    recommendations.extend(
        associates
            .iter()
            .filter(|a| a.is_close_relative())
            .take(MAX_ASSOCIATES)
            .filter_map(|a| {
                a.known_address().map(|address| {
                    format!(
                        "Check associate: {} ({}) at {}",
                        a.name, a.relationship, address
                    )
                })
            }),
    );

    let recent = &sightings[..sightings.len().min(PATTERN_WINDOW)];
    if recent.len() >= 2 {
        let locations: Vec<&str> = recent.iter().map(|s| s.location.as_str()).collect();
        recommendations.push(format!(
            "Pattern detected: Vehicle frequently spotted in these areas: {}",
            locations.join(", ")
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(FALLBACK_RECOMMENDATION.to_string());
    }

    recommendations
}
