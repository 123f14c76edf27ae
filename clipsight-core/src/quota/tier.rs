use serde::{Deserialize, Serialize};

/// Subscription tiers, in ascending order of their daily quota.
///
/// The set is closed on purpose: an unrecognized tier string in a profile
/// record deserializes to [`Tier::Free`] instead of failing, so a bad value
/// degrades to the smallest quota rather than an error or an accidental
/// unlimited pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum Tier {
    #[default]
    #[serde(other)]
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl Tier {
    /// The next tier up, used for upgrade suggestions on denials.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Free => Some(Tier::Starter),
            Tier::Starter => Some(Tier::Pro),
            Tier::Pro => Some(Tier::Enterprise),
            Tier::Enterprise => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
