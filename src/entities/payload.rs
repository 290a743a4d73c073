use ahash::AHashMap;
use serde_json::{Number, Value};

/// Request body flattened to string values. Anything that cannot be read as
/// a scalar is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPayload(AHashMap<String, String>);

impl RawPayload {
    /// Parses a request body. Empty, malformed or non-object bodies yield an
    /// empty payload rather than an error.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(value: Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };

        Self(
            fields
                .into_iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::String(value) => value,
                        Value::Number(number) => {
                            integral(&number).unwrap_or_else(|| number.to_string())
                        }
                        Value::Bool(flag) => flag.to_string(),
                        Value::Null | Value::Array(_) | Value::Object(_) => return None,
                    };

                    Some((key, value))
                })
                .collect(),
        )
    }

    /// Non-empty value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Renders `28000.0` as `28000` so integral floats read like the integers
/// they stand for. Fractions and values beyond f64's exact range are left alone.
fn integral(number: &Number) -> Option<String> {
    if let Some(value) = number.as_i64() {
        return Some(value.to_string());
    }
    if let Some(value) = number.as_u64() {
        return Some(value.to_string());
    }

    number
        .as_f64()
        .filter(|value| value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0)
        .map(|value| (value as i64).to_string())
}

impl<K, V> FromIterator<(K, V)> for RawPayload
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
