//! Per-field comparators and the feature vector built from them.

use fields::{FieldSpec, FieldType};
use serde::{Deserialize, Serialize};
use table::{Record, Value};

/// Similarity reported for a field when either side is missing.
pub(crate) const MISSING_SIMILARITY: f64 = 0.5;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Feature layout for a field list: one similarity slot per field, then one
/// missing-indicator slot per `has missing` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FeatureLayout {
    fields: Vec<FieldSpec>,
}

impl FeatureLayout {
    pub(crate) fn new(fields: &[FieldSpec]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    pub(crate) fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub(crate) fn similarity_dims(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn dims(&self) -> usize {
        self.fields.len() + self.fields.iter().filter(|f| f.has_missing()).count()
    }

    pub(crate) fn features(&self, a: &Record, b: &Record) -> Vec<f64> {
        let mut sims = Vec::with_capacity(self.dims());
        let mut flags = Vec::new();
        for field in &self.fields {
            let sim = field_similarity(field, a.get(&field.name), b.get(&field.name));
            sims.push(sim.unwrap_or(MISSING_SIMILARITY));
            if field.has_missing() {
                flags.push(if sim.is_none() { 1.0 } else { 0.0 });
            }
        }
        sims.extend(flags);
        sims
    }
}

/// Similarity in `[0, 1]` for one field, `None` when either value is missing.
pub(crate) fn field_similarity(
    field: &FieldSpec,
    a: Option<&Value>,
    b: Option<&Value>,
) -> Option<f64> {
    let a = a.filter(|v| !v.is_null())?;
    let b = b.filter(|v| !v.is_null())?;

    match field.field_type {
        FieldType::String | FieldType::ShortString => {
            let (a, b) = (a.render()?, b.render()?);
            Some(if field.crf() {
                strsim::normalized_levenshtein(&a, &b)
            } else {
                strsim::jaro_winkler(&a, &b)
            })
        }
        FieldType::Text => {
            let (a, b) = (a.render()?, b.render()?);
            Some(if field.crf() {
                strsim::normalized_levenshtein(&a, &b)
            } else {
                strsim::sorensen_dice(&a, &b)
            })
        }
        FieldType::Exact => Some(if a.render() == b.render() { 1.0 } else { 0.0 }),
        FieldType::Price => Some(price_similarity(as_number(a)?, as_number(b)?)),
        FieldType::LatLong => {
            let d = haversine_km(as_coordinates(a)?, as_coordinates(b)?);
            Some(1.0 / (1.0 + d))
        }
    }
}

fn as_number(v: &Value) -> Option<f64> {
    v.as_float()
        .or_else(|| v.as_text().and_then(|t| t.parse().ok()))
}

fn as_coordinates(v: &Value) -> Option<(f64, f64)> {
    if let Some(pair) = v.as_lat_long() {
        return Some(pair);
    }
    let text = v.as_text()?;
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let (lat, lon) = inner.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

fn price_similarity(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return 1.0;
    }
    (1.0 - (a - b).abs() / scale).clamp(0.0, 1.0)
}

fn haversine_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fields::Modifier;

    fn spec(ty: FieldType) -> FieldSpec {
        FieldSpec::new("f", ty)
    }

    #[test]
    fn strings_compare_by_edit_similarity() {
        let f = spec(FieldType::String);
        let same = field_similarity(&f, Some(&"acme".into()), Some(&"acme".into()));
        assert_eq!(same, Some(1.0));
        let near = field_similarity(&f, Some(&"acme corp".into()), Some(&"acme corp.".into()))
            .expect("both present");
        let far = field_similarity(&f, Some(&"acme corp".into()), Some(&"globex".into()))
            .expect("both present");
        assert!(near > far);
    }

    #[test]
    fn missing_side_yields_none() {
        let f = spec(FieldType::String);
        assert_eq!(field_similarity(&f, Some(&Value::Null), Some(&"x".into())), None);
        assert_eq!(field_similarity(&f, None, Some(&"x".into())), None);
    }

    #[test]
    fn exact_price_and_coordinates() {
        assert_eq!(
            field_similarity(&spec(FieldType::Exact), Some(&"10115".into()), Some(&"10117".into())),
            Some(0.0)
        );
        let price = field_similarity(
            &spec(FieldType::Price),
            Some(&Value::Float(100.0)),
            Some(&Value::Float(90.0)),
        )
        .expect("prices");
        assert!((price - 0.9).abs() < 1e-9);

        let here = Value::LatLong(52.52, 13.405);
        let close = Value::LatLong(52.521, 13.406);
        let far = Value::LatLong(48.8566, 2.3522);
        let ll = spec(FieldType::LatLong);
        let near_sim = field_similarity(&ll, Some(&here), Some(&close)).expect("near");
        let far_sim = field_similarity(&ll, Some(&here), Some(&far)).expect("far");
        assert!(near_sim > 0.8);
        assert!(far_sim < 0.01);
    }

    #[test]
    fn stringified_typed_values_still_compare() {
        let ll = spec(FieldType::LatLong);
        let sim = field_similarity(
            &ll,
            Some(&Value::LatLong(1.0, 2.0)),
            Some(&Value::from("(1, 2)")),
        );
        assert_eq!(sim, Some(1.0));
    }

    #[test]
    fn has_missing_adds_indicator_slot() {
        let layout = FeatureLayout::new(&[
            FieldSpec::new("name", FieldType::String),
            FieldSpec::new("phone", FieldType::Exact).with_modifier(Modifier::HasMissing),
        ]);
        assert_eq!(layout.dims(), 3);

        let a: Record = [("name", Value::from("acme")), ("phone", Value::Null)]
            .into_iter()
            .collect();
        let b: Record = [("name", Value::from("acme")), ("phone", Value::from("555"))]
            .into_iter()
            .collect();
        assert_eq!(layout.features(&a, &b), vec![1.0, MISSING_SIMILARITY, 1.0]);
    }
}
