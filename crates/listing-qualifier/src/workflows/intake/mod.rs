//! CSV intake for batch runs over scraper exports.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::listing::RawListing;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read listing export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid listing CSV data: {0}")]
    Csv(#[from] csv::Error),
}

pub struct ListingCsvImporter;

impl ListingCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawListing>, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Columns: `url,text,contact,price,locality,region,latitude,longitude,property_type`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawListing>, IntakeError> {
        Ok(parser::parse_listings(reader)?)
    }
}
