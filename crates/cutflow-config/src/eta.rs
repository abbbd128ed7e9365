//! Eta exclusion ranges.
//!
//! Each entry is written as `"<low>;<high>"`. Ranges are normalized so that
//! `low < high`, sorted by their lower bound and overlapping ranges are
//! merged.

use std::str::FromStr;

use crate::ConfigError;

/// A closed pseudorapidity interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaRange {
    pub low: f64,
    pub high: f64,
}

impl EtaRange {
    /// Inclusive on both ends.
    pub fn contains(&self, eta: f64) -> bool {
        self.low <= eta && eta <= self.high
    }
}

impl FromStr for EtaRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((first, second)) = s.split_once(';') else {
            return Err(ConfigError::Invalid(format!(
                "eta range '{}' does not contain the separator ';'",
                s
            )));
        };
        let eta1 = parse_bound(s, first)?;
        let eta2 = parse_bound(s, second)?;
        if eta1 == eta2 {
            return Err(ConfigError::Invalid(format!(
                "eta range '{}' is a point, not a range",
                s
            )));
        }
        Ok(EtaRange {
            low: eta1.min(eta2),
            high: eta1.max(eta2),
        })
    }
}

fn parse_bound(entry: &str, bound: &str) -> Result<f64, ConfigError> {
    let value = bound.trim().parse::<f64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "eta range '{}' has a non-numeric bound '{}'",
            entry, bound
        ))
    })?;
    if !value.is_finite() {
        return Err(ConfigError::Invalid(format!(
            "eta range '{}' has a non-finite bound '{}'",
            entry, bound
        )));
    }
    Ok(value)
}

/// A sorted list of disjoint eta ranges.
///
/// # Example
///
/// ```
/// use cutflow_config::EtaRanges;
///
/// let ranges = EtaRanges::parse(&["-2.7;-2.4", "-1.6;-2.5", "1.37;1.52"]).unwrap();
/// assert_eq!(ranges.len(), 2);
/// assert!(ranges.contains(-2.0));
/// assert!(ranges.contains(1.52));
/// assert!(!ranges.contains(0.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EtaRanges(Vec<EtaRange>);

impl EtaRanges {
    /// Parses and merges `"low;high"` entries.
    ///
    /// # Errors
    ///
    /// Fails on a missing separator, a non-numeric or non-finite bound and
    /// on equal bounds.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let mut ranges = entries
            .iter()
            .map(|e| e.as_ref().parse::<EtaRange>())
            .collect::<Result<Vec<_>, _>>()?;
        ranges.sort_by(|a, b| a.low.total_cmp(&b.low));

        let mut merged: Vec<EtaRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(previous) if range.low <= previous.high => {
                    previous.high = previous.high.max(range.high);
                }
                _ => merged.push(range),
            }
        }
        Ok(Self(merged))
    }

    pub fn ranges(&self) -> &[EtaRange] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `eta` falls inside any range.
    pub fn contains(&self, eta: f64) -> bool {
        self.0.iter().any(|r| r.contains(eta))
    }
}
