use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Canonical emergency service category.
///
/// The directory only ever stores these three values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Hospital,
    Firestation,
    Policestation,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [
        ServiceCategory::Hospital,
        ServiceCategory::Firestation,
        ServiceCategory::Policestation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Hospital => "hospital",
            ServiceCategory::Firestation => "firestation",
            ServiceCategory::Policestation => "policestation",
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServiceCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hospital" => Ok(ServiceCategory::Hospital),
            "firestation" => Ok(ServiceCategory::Firestation),
            "policestation" => Ok(ServiceCategory::Policestation),
            _ => Err(anyhow::anyhow!("Invalid service category: {}", s)),
        }
    }
}
