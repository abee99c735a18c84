use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{Coordinates, RawListing};
use super::text::normalize_key;

/// Flood exposure reported by the GIS collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloodRiskLevel {
    Absent,
    LowSeasonal,
    Moderate,
    High,
    Unknown,
}

impl FloodRiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            FloodRiskLevel::Absent => "absent",
            FloodRiskLevel::LowSeasonal => "low-seasonal",
            FloodRiskLevel::Moderate => "moderate",
            FloodRiskLevel::High => "high",
            FloodRiskLevel::Unknown => "unknown",
        }
    }
}

/// Tri-state hazard flag. `Unknown` must never be read as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hazard {
    Present,
    Absent,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitProximity {
    pub line: String,
    pub station: String,
    pub distance_m: u32,
}

/// Why the resolver could not supply data for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum DegradedReason {
    Timeout { after_ms: u64 },
    NoMatch { query: String },
    NoLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeoRiskSource {
    Resolved,
    Degraded(DegradedReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRiskResult {
    pub flood_risk: FloodRiskLevel,
    pub transit: Option<TransitProximity>,
    pub industrial_proximity: Hazard,
    pub power_line: Hazard,
    pub source: GeoRiskSource,
}

impl GeoRiskResult {
    /// Every category unknown; the run proceeds without enforcing any of them.
    pub fn degraded(reason: DegradedReason) -> Self {
        Self {
            flood_risk: FloodRiskLevel::Unknown,
            transit: None,
            industrial_proximity: Hazard::Unknown,
            power_line: Hazard::Unknown,
            source: GeoRiskSource::Degraded(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.source, GeoRiskSource::Degraded(_))
    }

    pub fn degraded_reason(&self) -> Option<&DegradedReason> {
        match &self.source {
            GeoRiskSource::Degraded(reason) => Some(reason),
            GeoRiskSource::Resolved => None,
        }
    }

    /// Transit close enough to count as a noise source.
    pub fn transit_within(&self, radius_m: u32) -> Option<&TransitProximity> {
        self.transit
            .as_ref()
            .filter(|transit| transit.distance_m <= radius_m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeoQuery {
    Locality(String),
    Coordinates(Coordinates),
}

impl GeoQuery {
    /// Coordinates are preferred over a locality name when both are supplied.
    pub fn for_listing(listing: &RawListing) -> Option<Self> {
        if let Some(coordinates) = listing.hints.coordinates {
            return Some(GeoQuery::Coordinates(coordinates));
        }
        listing
            .hints
            .locality()
            .map(|locality| GeoQuery::Locality(locality.to_string()))
    }

    pub fn describe(&self) -> String {
        match self {
            GeoQuery::Locality(locality) => locality.clone(),
            GeoQuery::Coordinates(point) => format!("{:.5},{:.5}", point.latitude, point.longitude),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("no geo-risk data for {0}")]
    NoMatch(String),
    #[error("geo-risk collaborator unreachable: {0}")]
    Unreachable(String),
}

/// Contract for the GIS collaborator. Implementations own their retry policy.
#[async_trait]
pub trait GeoRiskResolver: Send + Sync {
    async fn resolve(&self, query: &GeoQuery) -> Result<GeoRiskResult, ResolverError>;
}

/// Locality table loaded from CSV so the service can run without a live GIS backend.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoRiskTable {
    rows: Vec<GeoRiskRow>,
    by_locality: HashMap<String, usize>,
    match_radius_km: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GeoRiskRow {
    locality: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    flood_risk: FloodRiskLevel,
    industrial_proximity: Hazard,
    power_line: Hazard,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    transit_line: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    transit_station: Option<String>,
    #[serde(default)]
    transit_distance_m: Option<u32>,
}

impl GeoRiskRow {
    fn to_result(&self) -> GeoRiskResult {
        let transit = match (&self.transit_line, &self.transit_station, self.transit_distance_m) {
            (Some(line), Some(station), Some(distance_m)) => Some(TransitProximity {
                line: line.clone(),
                station: station.clone(),
                distance_m,
            }),
            _ => None,
        };

        GeoRiskResult {
            flood_risk: self.flood_risk,
            transit,
            industrial_proximity: self.industrial_proximity,
            power_line: self.power_line,
            source: GeoRiskSource::Resolved,
        }
    }

    fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeoTableError {
    #[error("failed to read geo-risk table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid geo-risk table: {0}")]
    Csv(#[from] csv::Error),
}

impl StaticGeoRiskTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P, match_radius_km: f64) -> Result<Self, GeoTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, match_radius_km)
    }

    pub fn from_reader<R: Read>(reader: R, match_radius_km: f64) -> Result<Self, GeoTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();
        let mut by_locality = HashMap::new();

        for record in csv_reader.deserialize::<GeoRiskRow>() {
            let row = record?;
            by_locality
                .entry(normalize_key(&row.locality))
                .or_insert(rows.len());
            rows.push(row);
        }

        Ok(Self {
            rows,
            by_locality,
            match_radius_km,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn lookup(&self, query: &GeoQuery) -> Option<&GeoRiskRow> {
        match query {
            GeoQuery::Locality(locality) => self
                .by_locality
                .get(&normalize_key(locality))
                .map(|idx| &self.rows[*idx]),
            GeoQuery::Coordinates(point) => self
                .rows
                .iter()
                .filter_map(|row| row.coordinates().map(|at| (row, distance_km(*point, at))))
                .filter(|(_, distance)| *distance <= self.match_radius_km)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(row, _)| row),
        }
    }
}

#[async_trait]
impl GeoRiskResolver for StaticGeoRiskTable {
    async fn resolve(&self, query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        self.lookup(query)
            .map(GeoRiskRow::to_result)
            .ok_or_else(|| ResolverError::NoMatch(query.describe()))
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat_a, lat_b) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "locality,latitude,longitude,flood_risk,industrial_proximity,power_line,transit_line,transit_station,transit_distance_m\n\
Don Mueang,13.9126,100.6068,low-seasonal,absent,absent,SRT Red Line,Don Mueang,1200\n\
Bang Phli,13.6060,100.7060,moderate,present,unknown,,,\n\
Ari,13.7797,100.5446,absent,absent,present,BTS Sukhumvit,Ari,150\n";

    fn table() -> StaticGeoRiskTable {
        StaticGeoRiskTable::from_reader(TABLE.as_bytes(), 2.0).expect("table parses")
    }

    #[tokio::test]
    async fn locality_lookup_ignores_case_and_spacing() {
        let result = table()
            .resolve(&GeoQuery::Locality("  don   MUEANG".to_string()))
            .await
            .expect("resolves");

        assert_eq!(result.flood_risk, FloodRiskLevel::LowSeasonal);
        assert_eq!(result.source, GeoRiskSource::Resolved);
        let transit = result.transit.expect("transit present");
        assert_eq!(transit.distance_m, 1200);
    }

    #[tokio::test]
    async fn blank_transit_columns_yield_no_transit() {
        let result = table()
            .resolve(&GeoQuery::Locality("Bang Phli".to_string()))
            .await
            .expect("resolves");

        assert!(result.transit.is_none());
        assert_eq!(result.industrial_proximity, Hazard::Present);
        assert_eq!(result.power_line, Hazard::Unknown);
    }

    #[tokio::test]
    async fn coordinates_match_nearest_row_within_radius() {
        let near_ari = Coordinates {
            latitude: 13.7810,
            longitude: 100.5450,
        };
        let result = table()
            .resolve(&GeoQuery::Coordinates(near_ari))
            .await
            .expect("resolves");
        assert_eq!(result.power_line, Hazard::Present);

        let far_away = Coordinates {
            latitude: 18.7883,
            longitude: 98.9853,
        };
        match table().resolve(&GeoQuery::Coordinates(far_away)).await {
            Err(ResolverError::NoMatch(_)) => {}
            other => panic!("expected no match, got {other:?}"),
        }
    }

    #[test]
    fn degraded_result_marks_every_category_unknown() {
        let result = GeoRiskResult::degraded(DegradedReason::NoLocation);
        assert!(result.is_degraded());
        assert_eq!(result.flood_risk, FloodRiskLevel::Unknown);
        assert_eq!(result.industrial_proximity, Hazard::Unknown);
        assert_eq!(result.power_line, Hazard::Unknown);
    }

    #[test]
    fn query_prefers_coordinates_over_locality() {
        let mut listing = RawListing::default();
        listing.hints.locality = Some("Ari".to_string());
        assert_eq!(
            GeoQuery::for_listing(&listing),
            Some(GeoQuery::Locality("Ari".to_string()))
        );

        listing.hints.coordinates = Some(Coordinates {
            latitude: 13.78,
            longitude: 100.54,
        });
        assert!(matches!(
            GeoQuery::for_listing(&listing),
            Some(GeoQuery::Coordinates(_))
        ));
    }
}
