use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::models::HasName;

/// Commodity representation
///
/// A commodity is anything that can be held in an account: a currency, a stock, a
/// frequent flyer mile. Commodities are compared by name, and interned through the
/// [`Registry`](crate::models::Registry) so that equal commodities share one instance.
///
/// # Examples
/// ```rust
/// use tally::models::Commodity;
///
/// let usd1 = Commodity::new("USD");
/// let usd2 = Commodity::new("USD");
/// assert_eq!(usd1, usd2);
/// assert_ne!(usd1, Commodity::new("CHF"));
/// ```
#[derive(Debug, Clone)]
pub struct Commodity {
    name: String,
}

impl Commodity {
    pub fn new(name: &str) -> Commodity {
        Commodity {
            name: name.to_string(),
        }
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl HasName for Commodity {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Commodity {}

impl Hash for Commodity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Commodity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Commodity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}
