//! Telemetry storage boundary contract.

use pipeline_telemetry_domain::{
    DateRangeRegistry, TelemetryModel, TelemetryQuery, TelemetryRecord,
};
use pipeline_telemetry_shared::{ErrorEnvelope, Result};

/// Lazy conversion of stored rows into models.
///
/// Rows are decoded one at a time; a corrupt row surfaces as an `Err` item
/// without discarding the rows already yielded.
#[derive(Debug)]
pub struct TelemetryList {
    records: std::vec::IntoIter<TelemetryRecord>,
}

impl TelemetryList {
    /// Wrap already-selected rows.
    #[must_use]
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl Iterator for TelemetryList {
    type Item = Result<TelemetryModel>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.into_model().map_err(ErrorEnvelope::from))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

/// Boundary contract for telemetry persistence.
///
/// Backends implement the three primitive operations; listing, aggregation
/// key derivation and replace-on-write are layered on top as default methods.
/// Replace-on-write is a delete followed by an insert with no transaction
/// around the pair, so concurrent writers to one window can race.
pub trait TelemetryStoragePort: Send + Sync {
    /// Persist one record. Fails when the backend is not initialized.
    fn store_telemetry(&self, telemetry: &TelemetryModel) -> Result<()>;

    /// Rows matching `query`; `from` inclusive, `to` exclusive.
    fn select_records(&self, query: &TelemetryQuery) -> Result<Vec<TelemetryRecord>>;

    /// Delete rows matching `query` and return how many went.
    fn delete_records(&self, query: &TelemetryQuery) -> Result<usize>;

    /// Models matching `query`, decoded lazily.
    fn telemetry_list(&self, query: &TelemetryQuery) -> Result<TelemetryList> {
        Ok(TelemetryList::new(self.select_records(query)?))
    }

    /// Delete any stored aggregation occupying the window of `telemetry`.
    ///
    /// The window is the one registered for `telemetry.telemetry_type` that
    /// contains the start date of `telemetry`.
    fn remove_existing_aggregation(
        &self,
        telemetry: &TelemetryModel,
        registry: &DateRangeRegistry,
    ) -> Result<usize> {
        let range = registry
            .range_for_single_date(telemetry.telemetry_type, telemetry.start_date_time.date())?;
        let query = TelemetryQuery::for_range(telemetry.telemetry_type, &telemetry.selector(), range);
        self.delete_records(&query)
    }

    /// Replace the aggregation for the window of `telemetry` with `telemetry`.
    fn store_aggregated_telemetry(
        &self,
        telemetry: &TelemetryModel,
        registry: &DateRangeRegistry,
    ) -> Result<()> {
        self.remove_existing_aggregation(telemetry, registry)?;
        self.store_telemetry(telemetry)
    }
}
