//! Systematic variation identifiers.

use std::fmt;
use std::sync::Arc;

/// Identifies one systematic variation of an event.
///
/// The nominal (baseline) variation has an empty name. Cloning is cheap,
/// the name is shared.
///
/// # Example
///
/// ```
/// use cutflow_core::Variation;
///
/// let nominal = Variation::nominal();
/// assert!(nominal.is_nominal());
/// assert_eq!(nominal.to_string(), "Nominal");
///
/// let jes = Variation::new("JET_JES__1up");
/// assert!(!jes.is_nominal());
/// assert_eq!(jes.name(), "JET_JES__1up");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variation(Arc<str>);

impl Variation {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The baseline variation.
    pub fn nominal() -> Self {
        Self(Arc::from(""))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_nominal(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Variation {
    fn default() -> Self {
        Self::nominal()
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nominal() {
            f.write_str("Nominal")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl fmt::Debug for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variation({})", self)
    }
}

impl From<&str> for Variation {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Variation {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}
