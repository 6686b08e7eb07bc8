// Primitives for reading the constituency boundaries and writing the map layers.

use crate::swing::*;

/// The opacity of the map layers.
const LAYER_OPACITY: f64 = 0.6;

pub fn read_boundaries(
    path: &str,
    source: &BoundariesSource,
) -> SwingResult<Vec<BoundaryFeature<JSValue>>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let res = parse_features(&js, source.code_property(), path)?;
    info!("read_boundaries: {}: {} features", path, res.len());
    Ok(res)
}

/// Extracts the features of a GeoJSON FeatureCollection with their constituency code.
///
/// A feature without a code keeps an empty code, so that it still appears on the map.
pub fn parse_features(
    js: &JSValue,
    code_property: &str,
    path: &str,
) -> SwingResult<Vec<BoundaryFeature<JSValue>>> {
    let features = js["features"]
        .as_array()
        .context(GeoJsonMissingFeaturesSnafu { path })?;
    let mut res: Vec<BoundaryFeature<JSValue>> = Vec::new();
    for (idx, feature) in features.iter().enumerate() {
        let code = match &feature["properties"][code_property] {
            JSValue::String(s) => s.clone(),
            JSValue::Number(n) => n.to_string(),
            x => {
                warn!(
                    "parse_features: feature {}: no usable {:?} property: {:?}",
                    idx, code_property, x
                );
                "".to_string()
            }
        };
        res.push(BoundaryFeature {
            code,
            geometry: feature.clone(),
        });
    }
    Ok(res)
}

/// One fill layer per bucket, each with a FeatureCollection of its boundaries.
pub fn build_layers_js(buckets: &BucketedBoundaries<JSValue>) -> JSValue {
    let layers: Vec<JSValue> = buckets
        .buckets
        .iter()
        .map(|(bucket, features)| {
            let fs: Vec<JSValue> = features.iter().map(|f| f.geometry.clone()).collect();
            json!({
                "name": bucket.label(),
                "color": bucket.color(),
                "opacity": LAYER_OPACITY,
                "type": "fill",
                "source": {
                    "type": "FeatureCollection",
                    "features": fs,
                },
            })
        })
        .collect();
    json!({ "layers": layers, "unmatched": buckets.unmatched })
}
