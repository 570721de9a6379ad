//! Serde support for report floats that may go non-finite when training diverges.
//!
//! JSON has no representation for `inf` or `NaN`, `serde_json` writes them as `null`.
//! Fields annotated with `#[serde(deserialize_with = "crate::float::lenient")]` read
//! `null` back as `NaN`, so a diverged report still decodes on the other end.

use serde::{Deserialize, Deserializer};

/// A value whose floats may arrive as `null`.
pub trait Lenient: Sized {
    fn deserialize_lenient<'de, D: Deserializer<'de>>(de: D) -> Result<Self, D::Error>;
}

impl Lenient for f64 {
    fn deserialize_lenient<'de, D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        Ok(Option::<f64>::deserialize(de)?.unwrap_or(f64::NAN))
    }
}

impl Lenient for Vec<f64> {
    fn deserialize_lenient<'de, D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(de)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

/// Deserializes a float, or a sequence of them, mapping `null` to `NaN`.
pub fn lenient<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Lenient,
{
    T::deserialize_lenient(de)
}
