// GeoJSON respondent map

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::data_model::{CellValue, Frame};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub properties: BTreeMap<String, CellValue>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// `[longitude, latitude]`
    Point { coordinates: [f64; 2] },
}

/// One Point feature per row with both coordinates present, carrying the
/// row's `id_field` value as its only property.
pub fn create_geojson(
    frame: &Frame,
    id_field: &str,
    latitude_field: &str,
    longitude_field: &str,
) -> Result<FeatureCollection> {
    let ids = frame.require_column(id_field)?;
    let latitudes = frame.require_column(latitude_field)?;
    let longitudes = frame.require_column(longitude_field)?;

    let features: Vec<Feature> = ids
        .values
        .iter()
        .zip(&latitudes.values)
        .zip(&longitudes.values)
        .filter_map(|((id, lat), lon)| {
            let (lat, lon) = (lat.as_f64()?, lon.as_f64()?);
            let mut properties = BTreeMap::new();
            properties.insert(id_field.to_string(), id.clone());
            Some(Feature {
                properties,
                geometry: Geometry::Point {
                    coordinates: [lon, lat],
                },
            })
        })
        .collect();

    debug!(
        features = features.len(),
        skipped = frame.row_count() - features.len(),
        "Built respondent GeoJSON"
    );
    Ok(FeatureCollection { features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{Column, LATITUDE, LONGITUDE, RESPONSE_ID};
    use crate::error::PipelineError;
    use serde_json::json;

    #[test]
    fn test_points_are_lon_lat_and_skip_missing() {
        let frame = Frame::from_columns(vec![
            Column::new(RESPONSE_ID, vec![CellValue::Int(7), CellValue::Int(8)]),
            Column::new(LATITUDE, vec![CellValue::Float(6.5), CellValue::Missing]),
            Column::new(LONGITUDE, vec![CellValue::Float(3.4), CellValue::Float(7.0)]),
        ])
        .unwrap();
        let collection = create_geojson(&frame, RESPONSE_ID, LATITUDE, LONGITUDE).unwrap();
        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"response_id": 7},
                    "geometry": {"type": "Point", "coordinates": [3.4, 6.5]}
                }]
            })
        );
    }

    #[test]
    fn test_missing_coordinate_column() {
        let frame = Frame::from_columns(vec![Column::new(RESPONSE_ID, vec![CellValue::Int(1)])])
            .unwrap();
        let err = create_geojson(&frame, RESPONSE_ID, LATITUDE, LONGITUDE).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == LATITUDE));
    }
}
