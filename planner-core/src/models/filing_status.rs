use std::fmt;

use serde::{Deserialize, Serialize};

/// Household filing status. Every rate lookup is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    Single,
    Married,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 2] = [FilingStatus::Married, FilingStatus::Single];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "s" => Some(Self::Single),
            "married" | "mfj" => Some(Self::Married),
            _ => None,
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByFilingStatus<T> {
    pub single: T,
    pub married: T,
}

impl<T> ByFilingStatus<T> {
    pub fn new(
        single: T,
        married: T,
    ) -> Self {
        Self { single, married }
    }

    pub fn get(
        &self,
        status: FilingStatus,
    ) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::Married => &self.married,
        }
    }
}

impl<T: Clone> ByFilingStatus<T> {
    /// Same value for both statuses.
    pub fn uniform(value: T) -> Self {
        Self {
            single: value.clone(),
            married: value,
        }
    }
}
