//! Per-request context passed explicitly through the aggregation pipeline

use std::time::Instant;

use super::dedup::AddressSet;
use crate::common::AggregatorError;

/// Everything one batch request owns: its id, its addresses, its clock
#[derive(Debug)]
pub struct RequestContext {
    correlation_id: String,
    addresses: AddressSet,
    started: Instant,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>, addresses: AddressSet) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            addresses,
            started: Instant::now(),
        }
    }

    /// Deduplicate `raw` and reject lists larger than `max_addresses`
    pub fn from_raw(
        correlation_id: impl Into<String>,
        raw: Vec<String>,
        max_addresses: usize,
    ) -> Result<Self, AggregatorError> {
        let addresses = AddressSet::from_raw(raw);
        if addresses.len() > max_addresses {
            return Err(AggregatorError::malformed(format!(
                "{} distinct addresses exceeds the limit of {}",
                addresses.len(),
                max_addresses
            )));
        }
        Ok(Self::new(correlation_id, addresses))
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
