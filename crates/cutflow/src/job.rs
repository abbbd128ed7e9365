//! Job driver that owns the directory, the systematics and the selection.

use tracing::{debug, info};

use cutflow_config::JobConfig;
use cutflow_core::{CutflowError, ObjectMatcher, Result, Variation};
use cutflow_cuts::{AnalysisConfig, AnalysisConfigBuilder, ApplyMode, EvalContext};
use cutflow_storage::{RegistryDirectory, ScopeRef};
use cutflow_systematics::{SystematicToolService, VariationBroadcaster, VariationCatalog};

/// Skim decisions of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub number: u64,
    /// Kinematic variations for which a cut flow fully passed.
    pub accepted: Vec<Variation>,
}

impl EventOutcome {
    /// Whether the event is written out for any variation.
    pub fn any_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }

    pub fn is_accepted(&self, variation: &Variation) -> bool {
        self.accepted.contains(variation)
    }
}

/// The explicit context of one analysis job.
///
/// Construction fixes the systematics. Producers then register their
/// variables through [`directory_mut`](Self::directory_mut), the selection
/// is handed over with [`finish_setup`](Self::finish_setup) and every event
/// goes through [`process_event`](Self::process_event).
pub struct AnalysisJob {
    config: JobConfig,
    broadcaster: VariationBroadcaster,
    directory: RegistryDirectory,
    selection: Option<AnalysisConfig>,
    events: u64,
    accepted: u64,
}

impl AnalysisJob {
    /// Validates `config`, registers `services` and fixes the variation set.
    ///
    /// # Errors
    ///
    /// [`CutflowError::Config`] for an invalid configuration, plus any error
    /// raised while registering the tool services or fixing systematics.
    pub fn new(config: JobConfig, services: Vec<Box<dyn SystematicToolService>>) -> Result<Self> {
        #[cfg(feature = "console")]
        cutflow_console::init();

        config
            .validate()
            .map_err(|err| CutflowError::Config(err.to_string()))?;

        let mut broadcaster = VariationBroadcaster::new(config.systematics.clone());
        for service in services {
            broadcaster.insert_tool_service(service)?;
        }
        let catalog = broadcaster.fix()?;
        info!(
            event = "job_started",
            analysis = config.analysis.name.as_str(),
            kinematic = catalog.all_kinematic().len() as u64,
        );

        Ok(Self {
            config,
            broadcaster,
            directory: RegistryDirectory::new(catalog),
            selection: None,
            events: 0,
            accepted: 0,
        })
    }

    /// Replaces the element identity predicate of the directory.
    pub fn with_matcher(mut self, matcher: impl ObjectMatcher + 'static) -> Self {
        self.directory = self.directory.with_matcher(matcher);
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn catalog(&self) -> &VariationCatalog {
        self.directory.catalog()
    }

    pub fn directory(&self) -> &RegistryDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut RegistryDirectory {
        &mut self.directory
    }

    pub fn broadcaster(&self) -> &VariationBroadcaster {
        &self.broadcaster
    }

    /// An empty selection builder honoring the configured active cut flows.
    pub fn builder(&self, scope: ScopeRef) -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new(scope)
            .with_active_cut_flows(self.config.selection.active_cut_flows.clone())
    }

    /// A selection builder holding every cut of the configuration, bound
    /// against the variables registered so far.
    pub fn builder_from_config(&self, scope: ScopeRef) -> Result<AnalysisConfigBuilder> {
        AnalysisConfigBuilder::from_selection(&self.config.selection, &self.directory, scope)
    }

    /// Locks the directory and builds the selection.
    ///
    /// # Errors
    ///
    /// Fails when called twice or when the builder has no enabled cut flow.
    pub fn finish_setup(&mut self, builder: AnalysisConfigBuilder) -> Result<()> {
        if self.selection.is_some() {
            return Err(CutflowError::Config(
                "job setup is already finished".to_string(),
            ));
        }
        self.directory.lock();
        self.selection = Some(builder.build(self.directory.catalog())?);
        Ok(())
    }

    pub fn selection(&self) -> Option<&AnalysisConfig> {
        self.selection.as_ref()
    }

    /// Runs one event through every kinematic variation.
    ///
    /// For each variation the tool services are switched, `producer` writes
    /// the variation's values, the monitor histograms are filled and the
    /// skim decision is recorded. Bookkeeping events only start a new
    /// generation.
    ///
    /// # Errors
    ///
    /// Fails before [`finish_setup`](Self::finish_setup) and propagates
    /// producer, tool service and consistency errors. Tool services are
    /// returned to nominal in every case.
    pub fn process_event<F>(
        &mut self,
        number: u64,
        weight: f64,
        bookkeeping: bool,
        mut producer: F,
    ) -> Result<EventOutcome>
    where
        F: FnMut(&mut RegistryDirectory, &Variation) -> Result<()>,
    {
        let Some(selection) = self.selection.as_mut() else {
            return Err(CutflowError::Config(format!(
                "event {} processed before the job setup was finished",
                number
            )));
        };

        self.directory.begin_event(number, bookkeeping);
        self.events += 1;
        let mut outcome = EventOutcome {
            number,
            accepted: Vec::new(),
        };
        if bookkeeping {
            debug!(event_number = number, "bookkeeping event");
            return Ok(outcome);
        }

        let variations = self.directory.catalog().all_kinematic().to_vec();
        let result = variations.iter().try_for_each(|variation| {
            self.broadcaster.activate(variation)?;
            producer(&mut self.directory, variation)?;
            let ctx = EvalContext::new(&self.directory, variation).with_weight(weight);
            selection.apply(&ctx, ApplyMode::Monitor)?;
            if selection.apply(&ctx, ApplyMode::Skim)? {
                outcome.accepted.push(variation.clone());
            }
            Ok(())
        });
        let reset = self.broadcaster.reset();
        result?;
        reset?;

        if outcome.any_accepted() {
            self.accepted += 1;
        }
        debug!(
            event_number = number,
            accepted = outcome.accepted.len() as u64,
            "event processed"
        );
        Ok(outcome)
    }

    /// Events seen so far, bookkeeping ones included.
    pub fn events_processed(&self) -> u64 {
        self.events
    }

    /// Events accepted for at least one variation.
    pub fn events_accepted(&self) -> u64 {
        self.accepted
    }

    /// Logs the job summary and returns the selection with its histograms.
    pub fn finish(&mut self) -> Result<&AnalysisConfig> {
        self.broadcaster.reset()?;
        info!(
            event = "job_finished",
            analysis = self.config.analysis.name.as_str(),
            events = self.events,
            accepted = self.accepted,
        );
        self.selection
            .as_ref()
            .ok_or_else(|| CutflowError::Config("job setup was never finished".to_string()))
    }

    /// Cut-flow tables of every histogram.
    #[cfg(feature = "console")]
    pub fn render_cut_flows(&self) -> Option<String> {
        self.selection.as_ref().map(cutflow_console::render_all)
    }
}

impl std::fmt::Debug for AnalysisJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisJob")
            .field("analysis", &self.config.analysis.name)
            .field("directory", &self.directory)
            .field("broadcaster", &self.broadcaster)
            .field("events", &self.events)
            .field("accepted", &self.accepted)
            .finish()
    }
}
