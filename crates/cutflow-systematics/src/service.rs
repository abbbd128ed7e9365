//! External calibration-tool adapters.

use cutflow_core::{Result, SelectionObject, Variation};

/// A calibration tool that must follow the active variation.
///
/// Tools are registered once with the broadcaster and receive every
/// `activate`/`reset` request in registration order.
pub trait SystematicToolService {
    /// Unique service name.
    fn name(&self) -> &str;

    /// Switches the tool to `variation`.
    fn apply_variation(&mut self, variation: &Variation) -> Result<()>;

    /// Switches the tool back to nominal.
    fn reset_variation(&mut self) -> Result<()>;

    /// Systematics the tool knows how to evaluate.
    fn advertised(&self) -> Vec<SystInfo> {
        Vec::new()
    }
}

/// Description of one systematic as advertised by a calibration tool.
#[derive(Debug, Clone, PartialEq)]
pub struct SystInfo {
    pub variation: Variation,
    pub affects_kinematics: bool,
    pub affects_weights: bool,
    /// Object types the systematic acts on. `EventWeight` marks a pure
    /// event-weight systematic.
    pub affected: Vec<SelectionObject>,
}

impl SystInfo {
    pub fn kinematic(variation: impl Into<Variation>, affected: &[SelectionObject]) -> Self {
        Self {
            variation: variation.into(),
            affects_kinematics: true,
            affects_weights: false,
            affected: affected.to_vec(),
        }
    }

    pub fn weight(variation: impl Into<Variation>, affected: &[SelectionObject]) -> Self {
        Self {
            variation: variation.into(),
            affects_kinematics: false,
            affects_weights: true,
            affected: affected.to_vec(),
        }
    }

    pub(crate) fn is_kinematic(&self) -> bool {
        self.variation.is_nominal() || self.affects_kinematics
    }

    pub(crate) fn is_weight(&self) -> bool {
        self.variation.is_nominal() || self.affects_weights
    }

    pub(crate) fn affects(&self, object: SelectionObject) -> bool {
        self.variation.is_nominal() || self.affected.contains(&object)
    }
}
