//! Data models for the stall map

mod hall;
mod layout;
mod record;
mod stall;

pub use hall::*;
pub use layout::*;
pub use record::*;
pub use stall::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
