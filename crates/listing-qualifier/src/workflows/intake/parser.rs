use std::io::Read;

use serde::{Deserialize, Deserializer};

use crate::workflows::listing::{Coordinates, ListingHints, RawListing};

/// One row of a scraper export. Every column except `text` may be blank.
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    url: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    contact: Option<String>,
    #[serde(default)]
    price: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    locality: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    region: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
}

impl ListingRow {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    fn into_listing(self) -> RawListing {
        let coordinates = self.coordinates();
        RawListing {
            url: self.url,
            text: self.text,
            contact: self.contact,
            hints: ListingHints {
                price: self.price,
                locality: self.locality,
                region: self.region,
                coordinates,
                property_type: self.property_type,
                ..ListingHints::default()
            },
        }
    }
}

pub(crate) fn parse_listings<R: Read>(reader: R) -> Result<Vec<RawListing>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut listings = Vec::new();

    for record in csv_reader.deserialize::<ListingRow>() {
        listings.push(record?.into_listing());
    }

    Ok(listings)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
