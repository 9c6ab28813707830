//! Run recorder: counts what one pipeline run did, then persists it once.

use pipeline_telemetry_domain::{
    ProcessType, ProcessTypeRegistry, SubProcessKey, TelemetryData, TelemetryError,
    TelemetryModel, TelemetrySelector, TelemetryType,
};
use pipeline_telemetry_ports::{DataValidatorPort, LogFields, LoggerPort, TelemetryStoragePort};
use pipeline_telemetry_shared::{ErrorEnvelope, Result};
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::sync::Arc;

/// Records the counters of one pipeline run.
///
/// Every mutator fails with `TelemetryObjectAlreadyClosed` once
/// [`Telemetry::save_and_close`] has run. Sub-process names are checked
/// against the declaration of the recorder's process type.
pub struct Telemetry {
    model: TelemetryModel,
    process_type: ProcessType,
    storage: Arc<dyn TelemetryStoragePort>,
    validator: Option<Arc<dyn DataValidatorPort>>,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl Telemetry {
    /// Start a `SINGLE` run for `selector`, now.
    ///
    /// Fails with `ProcessTypeNotRegistered` when the selector's process type
    /// is unknown to `registry`.
    pub fn new(
        selector: &TelemetrySelector,
        registry: &ProcessTypeRegistry,
        storage: Arc<dyn TelemetryStoragePort>,
    ) -> Result<Self> {
        Self::started_at(selector, registry, storage, Local::now().naive_local())
    }

    /// Start a `SINGLE` run for `selector` at an explicit time.
    pub fn started_at(
        selector: &TelemetrySelector,
        registry: &ProcessTypeRegistry,
        storage: Arc<dyn TelemetryStoragePort>,
        start_date_time: NaiveDateTime,
    ) -> Result<Self> {
        let process_type = registry.get(selector.process_type())?.clone();
        Ok(Self {
            model: TelemetryModel::started_at(TelemetryType::Single, selector, start_date_time),
            process_type,
            storage,
            validator: None,
            logger: None,
        })
    }

    /// Record as `telemetry_type` instead of `SINGLE`, e.g. `PARTIAL`.
    #[must_use]
    pub const fn with_telemetry_type(mut self, telemetry_type: TelemetryType) -> Self {
        self.model.telemetry_type = telemetry_type;
        self
    }

    /// Validator consulted by [`Telemetry::add_data`].
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn DataValidatorPort>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The model being recorded.
    #[must_use]
    pub const fn model(&self) -> &TelemetryModel {
        &self.model
    }

    /// Declared process type of this run.
    #[must_use]
    pub const fn process_type(&self) -> &ProcessType {
        &self.process_type
    }

    /// True once the run has been saved.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.model.is_closed()
    }

    /// Counters of `sub_process`, if it has been initialized.
    #[must_use]
    pub fn sub_process(&self, sub_process: &str) -> Option<&TelemetryData> {
        self.model.get_sub_process_data(sub_process)
    }

    /// Create empty counters for `sub_process`.
    ///
    /// Fails with `SubProcessAlreadyInitialized` on the second call.
    pub fn initialize_sub_process(&mut self, sub_process: &str) -> Result<()> {
        let key = self.open_key(sub_process)?;
        if self.model.telemetry.contains_key(&key) {
            return Err(TelemetryError::SubProcessAlreadyInitialized {
                sub_process: key.to_string(),
            }
            .into());
        }
        self.model.telemetry.insert(key, TelemetryData::new());
        Ok(())
    }

    /// Add to the base counter, initializing `sub_process` when needed.
    pub fn increase_base_count(&mut self, sub_process: &str, increment: i64) -> Result<()> {
        let key = self.open_key(sub_process)?;
        self.model.sub_process_data(&key).increase_base_count(increment);
        Ok(())
    }

    /// Add to the fail counter of an initialized `sub_process`.
    pub fn increase_fail_count(&mut self, sub_process: &str, increment: i64) -> Result<()> {
        self.initialized_data(sub_process)?
            .increase_fail_count(increment);
        Ok(())
    }

    /// Add to a named counter of an initialized `sub_process`.
    pub fn increase_custom_count(
        &mut self,
        sub_process: &str,
        counter: &str,
        increment: i64,
    ) -> Result<()> {
        self.initialized_data(sub_process)?
            .increase_custom_count(counter, increment);
        Ok(())
    }

    /// Add to an error-code counter of an initialized `sub_process`.
    pub fn increase_error_count(
        &mut self,
        sub_process: &str,
        error_code: &str,
        increment: i64,
    ) -> Result<()> {
        self.initialized_data(sub_process)?
            .increase_error_count(error_code, increment);
        Ok(())
    }

    /// Validate `data` for `sub_process` and tally the returned error codes.
    ///
    /// Any error escalates the traffic light to ORANGE. Returns the number of
    /// error codes tallied. Without a validator every payload passes.
    pub fn add_data(&mut self, sub_process: &str, data: &Value) -> Result<usize> {
        let key = self.open_key(sub_process)?;
        let codes = self
            .validator
            .as_ref()
            .map(|validator| validator.validate(&key, data))
            .unwrap_or_default();
        let counters = self.initialized_entry(&key)?;
        for code in &codes {
            counters.increase_error_count(code, 1);
        }
        if !codes.is_empty() {
            self.model.set_orange_traffic_light();
            if let Some(logger) = self.logger.as_ref() {
                let mut fields = self.log_fields();
                fields.insert("subProcess".into(), Value::String(key.to_string()));
                fields.insert(
                    "errorCodes".into(),
                    Value::Array(codes.iter().map(|code| Value::from(code.as_ref())).collect()),
                );
                logger.warn(
                    "telemetry.addData.invalid",
                    "Payload failed validation",
                    Some(fields),
                );
            }
        }
        Ok(codes.len())
    }

    /// Add to the run's I/O time.
    pub fn add_io_time(&mut self, seconds: f64) -> Result<()> {
        self.ensure_open()?;
        self.model.io_time_in_seconds += seconds;
        Ok(())
    }

    /// Escalate to ORANGE; a RED run stays RED.
    pub fn set_orange_traffic_light(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.model.set_orange_traffic_light();
        Ok(())
    }

    /// Escalate to RED.
    pub fn set_red_traffic_light(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.model.set_red_traffic_light();
        Ok(())
    }

    /// Close the run now and persist it.
    pub fn save_and_close(&mut self) -> Result<&TelemetryModel> {
        self.save_and_close_at(Local::now().naive_local())
    }

    /// Close the run as finished at `finished_at` and persist it.
    ///
    /// Run time is `finished_at - start`, floored at zero. A second call
    /// fails with `TelemetryObjectAlreadyClosed` and stores nothing.
    pub fn save_and_close_at(&mut self, finished_at: NaiveDateTime) -> Result<&TelemetryModel> {
        let run_time = (finished_at - self.model.start_date_time)
            .to_std()
            .map_or(0.0, |elapsed| elapsed.as_secs_f64());
        self.model.close(run_time)?;

        if let Err(error) = self.storage.store_telemetry(&self.model) {
            if let Some(logger) = self.logger.as_ref() {
                logger.error_envelope(
                    "telemetry.save.failed",
                    "Failed to store telemetry",
                    Some(self.log_fields()),
                    &error,
                );
            }
            return Err(error);
        }

        if let Some(logger) = self.logger.as_ref() {
            let mut fields = self.log_fields();
            fields.insert("runTimeSeconds".into(), Value::from(run_time));
            fields.insert(
                "trafficLight".into(),
                Value::from(self.model.traffic_light.as_str()),
            );
            logger.info("telemetry.save.completed", "Telemetry stored", Some(fields));
        }
        Ok(&self.model)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.model.is_closed() {
            return Err(TelemetryError::TelemetryObjectAlreadyClosed.into());
        }
        Ok(())
    }

    fn open_key(&self, sub_process: &str) -> Result<SubProcessKey> {
        self.ensure_open()?;
        if !self.process_type.has_sub_process(sub_process) {
            return Err(TelemetryError::InvalidSubProcess {
                process_type: self.process_type.name().to_string(),
                sub_process: sub_process.to_string(),
            }
            .into());
        }
        Ok(SubProcessKey::parse(sub_process)?)
    }

    fn initialized_data(&mut self, sub_process: &str) -> Result<&mut TelemetryData> {
        let key = self.open_key(sub_process)?;
        self.initialized_entry(&key)
    }

    fn initialized_entry(&mut self, key: &SubProcessKey) -> Result<&mut TelemetryData> {
        self.model.telemetry.get_mut(key).ok_or_else(|| {
            ErrorEnvelope::from(TelemetryError::BaseCountForSubProcessNotAdded {
                sub_process: key.to_string(),
            })
        })
    }

    fn log_fields(&self) -> LogFields {
        let mut fields = LogFields::new();
        fields.insert(
            "telemetryType".into(),
            Value::from(self.model.telemetry_type.as_str()),
        );
        fields.insert(
            "selector".into(),
            Value::from(self.model.selector().to_string()),
        );
        fields
    }
}
