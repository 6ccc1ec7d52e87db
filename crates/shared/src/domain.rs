use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ProductId);
id_newtype!(CategoryId);
id_newtype!(PlatformId);
id_newtype!(NotificationId);

/// Sort direction as stored by the query coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Maps the `ascend`/`descend` vocabulary used by table widgets.
    pub fn from_table_vocabulary(raw: &str) -> Option<Self> {
        match raw {
            "ascend" => Some(Self::Ascending),
            "descend" => Some(Self::Descending),
            _ => None,
        }
    }

    /// Value sent as the `sort_order` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascend" | "ascending" => Ok(Self::Ascending),
            "desc" | "descend" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}
