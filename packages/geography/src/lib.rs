#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City registry for the EcoPulse map.
//!
//! The map's city boundaries ship as a `GeoJSON` `FeatureCollection` in
//! which every feature carries the city's name in its `name` property.
//! Only the names matter here: they are the set of city keys the map can
//! display, whether or not any score data exists for them.

use std::collections::BTreeSet;
use std::path::Path;

use geojson::{Feature, GeoJson};
use thiserror::Error;

/// Feature property holding the city name.
pub const NAME_PROPERTY: &str = "name";

/// Errors that can occur while loading the city registry.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document parsed but is not usable as a registry.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// The set of valid city keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityRegistry {
    cities: BTreeSet<String>,
}

impl CityRegistry {
    /// Creates a registry from city names. Names are trimmed; blanks are
    /// dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            cities: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Parses a registry from a `GeoJSON` document.
    ///
    /// Accepts a `FeatureCollection` or a single `Feature`. Features
    /// without a string `name` property are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the document is not valid `GeoJSON`
    /// or is a bare geometry with no features.
    pub fn from_geojson_str(document: &str) -> Result<Self, GeographyError> {
        let features: Vec<Feature> = match document.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(GeographyError::Conversion {
                    message: "expected a FeatureCollection, found a bare geometry".to_string(),
                });
            }
        };

        let total = features.len();
        let names: Vec<String> = features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let name = feature
                    .property(NAME_PROPERTY)
                    .and_then(|value| value.as_str());
                if name.is_none() {
                    log::warn!("Skipping feature {i}: no '{NAME_PROPERTY}' property");
                }
                name.map(str::to_string)
            })
            .collect();

        let registry = Self::new(names);
        log::debug!("Loaded {} cities from {total} features", registry.len());
        Ok(registry)
    }

    /// Loads a registry from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, GeographyError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&document)
    }

    /// Returns `true` if `city` is a known city key.
    #[must_use]
    pub fn contains(&self, city: &str) -> bool {
        self.cities.contains(city)
    }

    /// Iterates over the city keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    /// Number of cities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Returns `true` if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
