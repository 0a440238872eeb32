//! Listing selection by city, type, size, price and amenities

use crate::error::{FlatpriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Amenity flags a selection can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Amenity {
    ParkingSpace,
    Balcony,
    Elevator,
    Security,
    StorageRoom,
}

impl Amenity {
    pub fn column(&self) -> &'static str {
        match self {
            Amenity::ParkingSpace => "hasParkingSpace",
            Amenity::Balcony => "hasBalcony",
            Amenity::Elevator => "hasElevator",
            Amenity::Security => "hasSecurity",
            Amenity::StorageRoom => "hasStorageRoom",
        }
    }
}

/// Conjunction of optional criteria; an unset criterion keeps every row.
///
/// Ranges are inclusive at both ends. A required amenity keeps only rows
/// whose flag is `true`; unmapped (null) flags never match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub kind: Option<String>,
    pub rooms: Option<i64>,
    pub price: Option<(f64, f64)>,
    pub area: Option<(f64, f64)>,
    pub amenities: Vec<Amenity>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Building type (the `type` column)
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_rooms(mut self, rooms: i64) -> Self {
        self.rooms = Some(rooms);
        self
    }

    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.price = Some((min, max));
        self
    }

    pub fn with_area_range(mut self, min: f64, max: f64) -> Self {
        self.area = Some((min, max));
        self
    }

    pub fn require(mut self, amenity: Amenity) -> Self {
        if !self.amenities.contains(&amenity) {
            self.amenities.push(amenity);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> Result<()> {
        for (name, range) in [("price", self.price), ("area", self.area)] {
            if let Some((min, max)) = range {
                if min.is_nan() || max.is_nan() || min > max {
                    return Err(FlatpriceError::invalid_parameter(
                        name,
                        format!("{}..={}", min, max),
                        "range minimum exceeds its maximum",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Rows of a prepared frame matching every set criterion
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        self.validate()?;
        let mut mask = BooleanChunked::full("selected".into(), true, df.height());

        if let Some(city) = &self.city {
            mask = &mask & &text_equals(df, "city", city)?;
        }
        if let Some(kind) = &self.kind {
            mask = &mask & &text_equals(df, "type", kind)?;
        }
        if let Some(rooms) = self.rooms {
            let column = df.column("rooms")?.cast(&DataType::Int64)?;
            let keep: BooleanChunked = column
                .i64()?
                .into_iter()
                .map(|v| Some(v == Some(rooms)))
                .collect();
            mask = &mask & &keep;
        }
        if let Some((min, max)) = self.price {
            mask = &mask & &within(df, "price", min, max)?;
        }
        if let Some((min, max)) = self.area {
            mask = &mask & &within(df, "squareMeters", min, max)?;
        }
        for amenity in &self.amenities {
            let keep: BooleanChunked = df
                .column(amenity.column())?
                .bool()?
                .into_iter()
                .map(|v| Some(v == Some(true)))
                .collect();
            mask = &mask & &keep;
        }

        let selected = df.filter(&mask)?;
        tracing::debug!(rows_in = df.height(), rows_out = selected.height(), "Applied listing filter");
        Ok(selected)
    }
}

fn text_equals(df: &DataFrame, col_name: &str, value: &str) -> Result<BooleanChunked> {
    let column = df.column(col_name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| Some(v == Some(value)))
        .collect())
}

fn within(df: &DataFrame, col_name: &str, min: f64, max: f64) -> Result<BooleanChunked> {
    let column = df.column(col_name)?.cast(&DataType::Float64)?;
    Ok(column
        .f64()?
        .into_iter()
        .map(|v| Some(matches!(v, Some(x) if x >= min && x <= max)))
        .collect())
}
