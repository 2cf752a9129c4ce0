use serde::{Deserialize, Deserializer};

/// Field presence for sparse updates.
///
/// Deserialize with `#[serde(default)]` so a missing key becomes
/// [`Patch::Absent`] while an explicit `null` becomes [`Patch::Null`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}
