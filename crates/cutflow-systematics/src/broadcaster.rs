//! The mutable variation registry used during setup.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use cutflow_config::SystematicsConfig;
use cutflow_core::{CutflowError, Result, SelectionObject, Variation};
use tracing::{debug, info};

use crate::catalog::VariationCatalog;
use crate::service::{SystInfo, SystematicToolService};

/// Objects a calibration tool can report systematics for.
const TOOL_OBJECTS: [SelectionObject; 7] = [
    SelectionObject::Electron,
    SelectionObject::Muon,
    SelectionObject::Photon,
    SelectionObject::Tau,
    SelectionObject::Jet,
    SelectionObject::TruthParticle,
    SelectionObject::BTag,
];

/// Collects variations during setup and broadcasts the active one at run time.
///
/// Insertions are allowed until [`fix`](Self::fix) freezes the set into a
/// [`VariationCatalog`].
pub struct VariationBroadcaster {
    settings: SystematicsConfig,
    all: Vec<Variation>,
    kinematic: HashMap<SelectionObject, Vec<Variation>>,
    weight: HashMap<SelectionObject, Vec<Variation>>,
    services: Vec<Box<dyn SystematicToolService>>,
    catalog: Option<Arc<VariationCatalog>>,
    current: Option<Variation>,
}

impl VariationBroadcaster {
    pub fn new(settings: SystematicsConfig) -> Self {
        let nominal = Variation::nominal();
        let mut weight = HashMap::new();
        weight.insert(SelectionObject::EventWeight, vec![nominal.clone()]);
        Self {
            settings,
            all: vec![nominal],
            kinematic: HashMap::new(),
            weight,
            services: Vec::new(),
            catalog: None,
            current: None,
        }
    }

    pub fn settings(&self) -> &SystematicsConfig {
        &self.settings
    }

    pub fn is_fixed(&self) -> bool {
        self.catalog.is_some()
    }

    /// The frozen catalog, once [`fix`](Self::fix) succeeded.
    pub fn catalog(&self) -> Option<&Arc<VariationCatalog>> {
        self.catalog.as_ref()
    }

    /// Registers a variation that changes the kinematics of `object`.
    ///
    /// Returns `Ok(false)` when the variation is skipped by the settings
    /// (systematics disabled, pruned name or disabled object).
    ///
    /// # Errors
    ///
    /// Fails after [`fix`](Self::fix) and for objects that carry no
    /// kinematics of their own.
    pub fn insert_kinematic(&mut self, variation: &Variation, object: SelectionObject) -> Result<bool> {
        if !self.accepts(variation, false)? || !self.settings.processes(object) {
            return Ok(false);
        }
        match object {
            SelectionObject::Other
            | SelectionObject::BTag
            | SelectionObject::EventWeight
            | SelectionObject::RecoParticle => Err(CutflowError::Config(format!(
                "{} cannot carry the kinematic systematic '{}'",
                object, variation
            ))),
            _ => {
                append_sorted(self.kinematic.entry(object).or_default(), variation);
                Ok(true)
            }
        }
    }

    /// Registers a variation that changes only a weight of `object`.
    ///
    /// Returns `Ok(false)` when the variation is skipped by the settings.
    pub fn insert_weight(&mut self, variation: &Variation, object: SelectionObject) -> Result<bool> {
        if !self.accepts(variation, true)? || !self.settings.processes(object) {
            return Ok(false);
        }
        match object {
            SelectionObject::Other | SelectionObject::RecoParticle => {
                Err(CutflowError::Config(format!(
                    "{} cannot carry the weight systematic '{}'",
                    object, variation
                )))
            }
            _ => {
                append_sorted(self.weight.entry(object).or_default(), variation);
                Ok(true)
            }
        }
    }

    // Setting checks shared by both insert paths. Accepted variations join
    // the global list even when their object is disabled.
    fn accepts(&mut self, variation: &Variation, weight: bool) -> Result<bool> {
        if self.is_fixed() {
            return Err(CutflowError::Config(format!(
                "systematics are already fixed, cannot insert '{}'",
                variation
            )));
        }
        if (!self.settings.do_syst && !variation.is_nominal())
            || self.settings.is_pruned(variation.name())
            || (weight && !self.settings.do_weights)
        {
            debug!(variation = %variation, "systematic disabled");
            return Ok(false);
        }
        if !self.all.contains(variation) {
            self.all.push(variation.clone());
        }
        Ok(true)
    }

    /// Registers a tool adapter and the systematics it advertises.
    ///
    /// # Errors
    ///
    /// Fails for a duplicate service name or after [`fix`](Self::fix).
    pub fn insert_tool_service(&mut self, service: Box<dyn SystematicToolService>) -> Result<()> {
        if self.services.iter().any(|s| s.name() == service.name()) {
            return Err(CutflowError::DuplicateName {
                kind: "tool service",
                name: service.name().to_string(),
                scope: "systematics".to_string(),
            });
        }
        self.register_syst_infos(&service.advertised())?;
        info!(event = "tool_service_added", service = service.name());
        self.services.push(service);
        Ok(())
    }

    /// Sorts advertised systematics into the per-object lists.
    ///
    /// A systematic touching none of the calibrated objects is filed under
    /// missing transverse energy.
    pub fn register_syst_infos(&mut self, infos: &[SystInfo]) -> Result<()> {
        for info in infos {
            for object in TOOL_OBJECTS {
                if !info.affects(object) {
                    continue;
                }
                if object != SelectionObject::BTag && info.is_kinematic() {
                    self.insert_kinematic(&info.variation, object)?;
                }
                if info.is_weight() {
                    self.insert_weight(&info.variation, object)?;
                }
            }
            let met_only = info.variation.is_nominal()
                || !TOOL_OBJECTS.iter().any(|o| info.affected.contains(o));
            if met_only {
                if info.is_kinematic() {
                    self.insert_kinematic(&info.variation, SelectionObject::MissingEt)?;
                }
                if info.is_weight() {
                    self.insert_weight(&info.variation, SelectionObject::MissingEt)?;
                }
            }
            if info.affected.contains(&SelectionObject::EventWeight) {
                self.insert_weight(&info.variation, SelectionObject::EventWeight)?;
            }
        }
        Ok(())
    }

    /// Freezes the variation set.
    ///
    /// Adds the nominal variation to every calibrated object and builds the
    /// combined kinematic list. Calling it again returns the same catalog.
    ///
    /// # Errors
    ///
    /// Fails when systematics are requested on data.
    pub fn fix(&mut self) -> Result<Arc<VariationCatalog>> {
        if let Some(catalog) = &self.catalog {
            return Ok(Arc::clone(catalog));
        }
        if self.settings.do_syst && self.settings.is_data {
            return Err(CutflowError::Config(
                "trying to run systematics on data".to_string(),
            ));
        }
        if self.settings.is_data && self.settings.processes(SelectionObject::TruthParticle) {
            info!(event = "truth_disabled", reason = "data");
            self.settings.disabled_objects.push(SelectionObject::TruthParticle);
        }

        let nominal = Variation::nominal();
        for object in SelectionObject::CALIBRATED {
            self.insert_kinematic(&nominal, object)?;
            if self.settings.do_weights {
                self.insert_weight(&nominal, object)?;
            }
        }
        if self.settings.do_weights {
            self.insert_weight(&nominal, SelectionObject::BTag)?;
        }

        let met = self
            .kinematic
            .get(&SelectionObject::MissingEt)
            .cloned()
            .unwrap_or_default();
        let mut all_kinematic: Vec<Variation> = Vec::new();
        for list in self.kinematic.values() {
            for variation in list {
                if !all_kinematic.contains(variation) {
                    all_kinematic.push(variation.clone());
                }
            }
        }
        let rank = |v: &Variation| -> u8 {
            if v.is_nominal() {
                0
            } else if met.contains(v) {
                1
            } else {
                2
            }
        };
        all_kinematic.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.name().cmp(b.name())));

        let weights = self.weight.values().flatten().filter(|v| !v.is_nominal()).count();
        info!(
            event = "systematics_fixed",
            kinematic = all_kinematic.len() as u64,
            weights = weights as u64,
            services = self.services.len() as u64,
        );
        for variation in &all_kinematic {
            debug!(variation = %variation, "kinematic variation");
        }

        let catalog = Arc::new(VariationCatalog::new(
            self.all.clone(),
            all_kinematic,
            self.kinematic.clone(),
            self.weight.clone(),
            self.settings.disabled_objects.clone(),
        ));
        self.catalog = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// The active variation; nominal when none was activated.
    pub fn current(&self) -> Variation {
        self.current.clone().unwrap_or_default()
    }

    /// Switches every tool service to `variation`.
    ///
    /// # Errors
    ///
    /// Fails before [`fix`](Self::fix), for a variation outside the catalog
    /// and when a tool service refuses the request.
    pub fn activate(&mut self, variation: &Variation) -> Result<()> {
        let Some(catalog) = &self.catalog else {
            return Err(CutflowError::Config(format!(
                "systematics are not fixed, cannot activate '{}'",
                variation
            )));
        };
        if self.current.as_ref() == Some(variation) {
            return Ok(());
        }
        if !catalog.contains(variation) {
            return Err(CutflowError::UnknownVariation(variation.to_string()));
        }
        for service in &mut self.services {
            service.apply_variation(variation)?;
        }
        debug!(variation = %variation, "variation activated");
        self.current = Some(variation.clone());
        Ok(())
    }

    /// Returns every tool service to nominal.
    pub fn reset(&mut self) -> Result<()> {
        match &self.current {
            None => return Ok(()),
            Some(v) if v.is_nominal() => return Ok(()),
            Some(_) => {}
        }
        for service in &mut self.services {
            service.reset_variation()?;
        }
        self.current = None;
        Ok(())
    }
}

impl std::fmt::Debug for VariationBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariationBroadcaster")
            .field("variations", &self.all.len())
            .field("services", &self.services.len())
            .field("fixed", &self.is_fixed())
            .field("current", &self.current)
            .finish()
    }
}

// Keeps non-nominal variations sorted by name with nominal appended last.
fn append_sorted(list: &mut Vec<Variation>, variation: &Variation) {
    if !list.contains(variation) {
        list.push(variation.clone());
    }
    let nominal = Variation::nominal();
    if !list.contains(&nominal) {
        list.push(nominal);
    }
    list.sort_by(|a, b| match (a.is_nominal(), b.is_nominal()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.name().cmp(b.name()),
    });
}
