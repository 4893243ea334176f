//! Typed specializations for Price and LatLong fields.

use table::Value;

use crate::error::NormalizeError;

const LAT_LONG_HINT: &str =
    "expected a (latitude, longitude) pair such as (40.7128, -74.0060)";

/// Parse an already-normalized Price cell.
///
/// Missing cells stay missing. Thousands separators are removed before
/// parsing; anything that still is not a finite number is an error naming
/// the column.
pub fn parse_price(column: &str, text: Option<&str>) -> Result<Value, NormalizeError> {
    let Some(text) = text else {
        return Ok(Value::Null);
    };
    let digits: String = text.chars().filter(|c| *c != ',' && *c != ' ').collect();
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Value::Float(v)),
        _ => Err(NormalizeError::InvalidPrice {
            column: column.to_string(),
            value: text.to_string(),
        }),
    }
}

/// Parse an already-normalized LatLong cell written as a 2-tuple literal.
///
/// Surrounding parentheses are optional. Missing cells stay missing.
pub fn parse_lat_long(column: &str, text: Option<&str>) -> Result<Value, NormalizeError> {
    let Some(text) = text else {
        return Ok(Value::Null);
    };
    let invalid = || NormalizeError::InvalidLatLong {
        column: column.to_string(),
        value: text.to_string(),
        hint: LAT_LONG_HINT,
    };

    let inner = text.trim();
    let inner = inner
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(inner);

    let mut parts = inner.split(',').map(str::trim);
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let lat: f64 = lat.parse().map_err(|_| invalid())?;
    let lon: f64 = lon.parse().map_err(|_| invalid())?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(invalid());
    }
    Ok(Value::LatLong(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_strips_thousands_separators() {
        assert_eq!(parse_price("p", Some("1,200.50")).expect("price"), Value::Float(1200.5));
        assert_eq!(parse_price("p", Some("7")).expect("price"), Value::Float(7.0));
        assert_eq!(parse_price("p", None).expect("null"), Value::Null);
    }

    #[test]
    fn price_error_names_column() {
        let err = parse_price("amount", Some("twelve")).expect_err("not numeric");
        assert!(matches!(err, NormalizeError::InvalidPrice { ref column, .. } if column == "amount"));
        assert!(err.to_string().contains("amount"));
        assert!(parse_price("amount", Some("inf")).is_err());
    }

    #[test]
    fn lat_long_forms() {
        assert_eq!(
            parse_lat_long("loc", Some("(40.7, -73.9)")).expect("tuple"),
            Value::LatLong(40.7, -73.9)
        );
        assert_eq!(
            parse_lat_long("loc", Some("40.7,-73.9")).expect("bare"),
            Value::LatLong(40.7, -73.9)
        );
        assert_eq!(parse_lat_long("loc", None).expect("null"), Value::Null);
    }

    #[test]
    fn lat_long_malformed_has_hint() {
        for bad in ["(40.7)", "(1, 2, 3)", "north, south", "(40.7 -73.9)"] {
            let err = parse_lat_long("loc", Some(bad)).expect_err(bad);
            let msg = err.to_string();
            assert!(msg.contains("loc"), "{msg}");
            assert!(msg.contains("latitude, longitude"), "{msg}");
        }
    }
}
