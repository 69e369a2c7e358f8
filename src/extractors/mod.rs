//! Ordered extractor registry: path match → record extraction from a
//! freshly unmarshaled device subtree.
//!
//! Dispatch is first-match-wins (I5): registration order encodes
//! specificity, most specific first. `ifindex` is registered ahead of the
//! general interface-state extractor for exactly the reason worked through
//! in §4.5 — an `ifindex` leaf path also satisfies the interface-state
//! matcher, and without the ordering the wrong extractor would claim it.

mod bgp;
mod interface_ifindex;
mod interface_state;
mod isis;
mod system;
mod transceiver;

use crate::device::Device;
use crate::error::ExtractError;
use crate::path::{Matcher, Path};
use crate::record::{AnyRecord, RecordMeta};
use crate::schema::Schema;
use crate::unmarshal::unmarshal;

pub struct Extractor {
    pub name: &'static str,
    matcher: Matcher,
    extract: fn(&Device, &RecordMeta) -> Vec<AnyRecord>,
}

pub struct ExtractorRegistry {
    extractors: Vec<Extractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        ExtractorRegistry {
            extractors: vec![
                interface_ifindex::extractor(),
                interface_state::extractor(),
                isis::extractor(),
                bgp::extractor(),
                system::extractor(),
                transceiver::channel_extractor(),
                transceiver::thresholds_extractor(),
            ],
        }
    }

    /// Dispatches one `(prefix, update)` pair: finds the first matcher
    /// whose predicate holds over the merged path, unmarshals the device
    /// subtree, and runs that extractor's `extract_fn`. Returns an empty
    /// list if no extractor matches — this is not an error, just routine
    /// telemetry this processor doesn't model.
    pub fn dispatch(
        &self,
        schema: &Schema,
        prefix: &Path,
        update_path: &Path,
        value: &serde_json::Value,
        meta: &RecordMeta,
    ) -> Result<Vec<AnyRecord>, ExtractError> {
        let merged = Path::merged(prefix, update_path);

        for extractor in &self.extractors {
            if !extractor.matcher.matches(&merged) {
                continue;
            }

            let device = unmarshal(schema, prefix, update_path, value)?;
            return Ok((extractor.extract)(&device, meta));
        }

        Ok(Vec::new())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
