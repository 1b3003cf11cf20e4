use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{error::Result, pipeline::ChartAnalysis, types::ShapeCandidate};

fn number(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

fn shape_feature(shape: &ShapeCandidate, in_chart: bool) -> Result<Feature> {
    let mut ring: Vec<Vec<f64>> = shape.contour.iter().map(|&[x, y]| vec![x, y]).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    let geometry = Geometry::new(Value::Polygon(vec![ring]));

    let mut properties = Map::new();
    properties.insert("id".to_string(), JsonValue::from(shape.id));
    properties.insert("kind".to_string(), JsonValue::from(shape.kind.to_string()));
    properties.insert("confidence".to_string(), number(shape.confidence));
    properties.insert("area".to_string(), number(shape.area));
    properties.insert("vertex_count".to_string(), JsonValue::from(shape.vertex_count));
    properties.insert("epsilon".to_string(), number(shape.epsilon));
    properties.insert("is_hole".to_string(), JsonValue::Bool(shape.is_hole));
    properties.insert(
        "parent".to_string(),
        shape.parent.map_or(JsonValue::Null, JsonValue::from),
    );
    properties.insert("in_chart".to_string(), JsonValue::Bool(in_chart));
    properties.insert("features".to_string(), serde_json::to_value(shape.features)?);

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: Some(geojson::feature::Id::Number(Number::from(shape.id))),
        properties: Some(properties),
        foreign_members: None,
    })
}

impl ChartAnalysis {
    /// Every detected shape as a polygon feature in pixel coordinates
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self
            .shapes
            .iter()
            .map(|shape| shape_feature(shape, self.chart.shapes.contains(&shape.id)))
            .collect::<Result<Vec<_>>>()?;

        // Add metadata to foreign members of the FeatureCollection
        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), JsonValue::from(self.image_width));
        foreign_members.insert("image_height".to_string(), JsonValue::from(self.image_height));
        foreign_members.insert("shape_count".to_string(), JsonValue::from(self.shapes.len()));
        foreign_members.insert("chart_kind".to_string(), JsonValue::from(self.chart.kind.to_string()));
        foreign_members.insert("chart_confidence".to_string(), number(self.chart.confidence));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}
