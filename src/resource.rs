//! ResourceArc Wrappers
//!
//! A corpus handle kept alive on the BEAM side between calls, so the index
//! snapshot is loaded once per handle.

use crate::config::CorpusConfig;
use crate::corpus::CorpusIndex;
use crate::error::Result;
use rustler::ResourceArc;
use std::path::Path;

/// Wrapper for CorpusIndex that can be stored in a ResourceArc
///
/// `CorpusIndex` is `Sync`; its snapshot is initialised once and glob
/// compilation locks internally, so no outer mutex is needed.
pub struct CorpusResource {
    pub corpus: CorpusIndex,
}

impl CorpusResource {
    pub fn open(path: &Path, config: CorpusConfig) -> Result<Self> {
        Ok(CorpusResource {
            corpus: CorpusIndex::with_config(path, config)?,
        })
    }
}

#[rustler::resource_impl]
impl rustler::Resource for CorpusResource {}

/// Type alias for the ResourceArc
pub type CorpusRef = ResourceArc<CorpusResource>;
