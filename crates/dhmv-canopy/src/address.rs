//! Addresses resolved to Lambert 72 positions, with a lazily fetched
//! building footprint.

use std::fmt;
use std::sync::OnceLock;

use crate::{Footprint, Result};

/// A Belgian street address together with its Lambert 72 position.
///
/// The position is part of the constructor, so a value of this type is
/// always geocoded. The building footprint is fetched at most once through a
/// [`FootprintProvider`] and kept for the lifetime of the value.
#[derive(Debug)]
pub struct ResolvedAddress {
    street: String,
    number: String,
    zipcode: u32,
    municipality: String,
    x: f64,
    y: f64,
    footprint: OnceLock<Footprint>,
}

impl ResolvedAddress {
    /// Pair an address with its Lambert 72 position.
    pub fn new(
        street: impl Into<String>,
        number: impl Into<String>,
        zipcode: u32,
        municipality: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            street: street.into(),
            number: number.into(),
            zipcode,
            municipality: municipality.into(),
            x,
            y,
            footprint: OnceLock::new(),
        }
    }

    /// Street name.
    pub fn street(&self) -> &str {
        &self.street
    }

    /// House number, kept as text for suffixed numbers like `12A`.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Postal code.
    pub fn zipcode(&self) -> u32 {
        self.zipcode
    }

    /// Municipality name.
    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    /// Lambert 72 position as (x, y) in meters.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// The building footprint, fetched through `provider` on first access
    /// and reused afterwards.
    pub fn footprint(&self, provider: &dyn FootprintProvider) -> Result<&Footprint> {
        if let Some(footprint) = self.footprint.get() {
            return Ok(footprint);
        }
        let fetched = provider.footprint_of(self)?;
        // A concurrent caller may have won the race; either way the stored
        // value is a successful provider result for this address.
        Ok(self.footprint.get_or_init(|| fetched))
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            self.street, self.number, self.zipcode, self.municipality
        )
    }
}

/// Source of building footprints, typically a building-registry lookup.
pub trait FootprintProvider: Send + Sync {
    /// The footprint of the building at `address`, in Lambert 72.
    fn footprint_of(&self, address: &ResolvedAddress) -> Result<Footprint>;
}
