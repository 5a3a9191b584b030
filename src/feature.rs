//! Decoded tile features.
//!
//! Tile decoding happens upstream; a [`LineFeature`] arrives with its
//! geometry already parsed into rings of integer tile points and its raw
//! property values already extracted.

use crate::types::TilePoint;
use std::collections::HashMap;

/// Geometry type discriminator of a decoded feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeatureType {
    /// An open or closed sequence of points.
    LineString,
    /// A polygon whose outline is tessellated; every ring is closed.
    Polygon,
}

/// A raw feature property value.
///
/// These are passed through to the paint property binder untouched; the
/// tessellator itself never interprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// One decoded line or polygon-outline feature.
#[derive(Debug, Clone)]
pub struct LineFeature {
    /// Whether the feature is a line or a polygon outline.
    pub feature_type: FeatureType,
    /// Geometry rings. Each ring is an ordered sequence of tile points; a
    /// ring whose first and last points are equal (with more than two
    /// points) is treated as closed.
    pub geometry: Vec<Vec<TilePoint>>,
    /// Raw property values, keyed by property name.
    pub properties: HashMap<String, PropertyValue>,
}

impl LineFeature {
    /// Create a feature with no properties.
    pub fn new(feature_type: FeatureType, geometry: Vec<Vec<TilePoint>>) -> LineFeature {
        LineFeature {
            feature_type,
            geometry,
            properties: HashMap::new(),
        }
    }
}
