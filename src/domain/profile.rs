//! Profile records and the shape-tolerant decode step

use std::collections::BTreeMap;

use serde::Deserialize;

const DISPLAY_NAME_FIELD: &str = "displayName";
const BIO_FIELD: &str = "bio";

/// A registered on-chain profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub bio: String,
}

/// Cached profile of the active account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileState {
    /// No fetch has completed for the current account
    #[default]
    NotFetched,
    /// Fetched, and the account has no profile (or the read failed)
    Absent,
    /// Fetched and present
    Present(Profile),
}

impl ProfileState {
    pub fn from_decoded(profile: Option<Profile>) -> Self {
        match profile {
            Some(profile) => ProfileState::Present(profile),
            None => ProfileState::Absent,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ProfileState::Present(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ProfileState::Absent)
    }
}

/// Raw `getProfile` return value.
///
/// A record may address its fields by name (`displayName`, `bio`), by
/// position (`[displayName, bio]`), or both at once. Decoding prefers a
/// non-empty named field and falls back to the positional slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RecordShape")]
pub struct ProfileRecord {
    named: BTreeMap<String, String>,
    positional: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordShape {
    Named(BTreeMap<String, String>),
    Positional(Vec<String>),
}

impl From<RecordShape> for ProfileRecord {
    fn from(shape: RecordShape) -> Self {
        match shape {
            RecordShape::Named(named) => Self {
                named,
                positional: Vec::new(),
            },
            RecordShape::Positional(positional) => Self {
                named: BTreeMap::new(),
                positional,
            },
        }
    }
}

impl ProfileRecord {
    pub fn named(display_name: impl Into<String>, bio: impl Into<String>) -> Self {
        let mut named = BTreeMap::new();
        named.insert(DISPLAY_NAME_FIELD.to_string(), display_name.into());
        named.insert(BIO_FIELD.to_string(), bio.into());
        Self {
            named,
            positional: Vec::new(),
        }
    }

    pub fn positional(values: Vec<String>) -> Self {
        Self {
            named: BTreeMap::new(),
            positional: values,
        }
    }

    /// Build a record carrying both representations, as ABI decoders with
    /// named outputs produce.
    pub fn from_parts(names: &[String], values: Vec<String>) -> Self {
        let named = names
            .iter()
            .zip(values.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            named,
            positional: values,
        }
    }

    fn field(&self, name: &str, index: usize) -> Option<&str> {
        self.named
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .or_else(|| self.positional.get(index).map(String::as_str))
    }

    /// Decode into a profile. A blank display name means "no profile".
    pub fn decode(&self) -> Option<Profile> {
        let display_name = self.field(DISPLAY_NAME_FIELD, 0)?;
        if display_name.trim().is_empty() {
            return None;
        }
        let bio = self.field(BIO_FIELD, 1).unwrap_or_default();
        Some(Profile {
            display_name: display_name.to_string(),
            bio: bio.to_string(),
        })
    }
}
