//! Apply context (§3/§4.6): the per-thread, per-pipeline mutable state
//! `CmmPipeline::apply` needs - the PCS mediator plus reusable scratch
//! buffers - kept out of the (immutable, `Sync`) sealed pipeline so many
//! threads can drive the same pipeline concurrently.

use crate::pipeline::mediator::PcsMediator;
use crate::pipeline::mru::MruCache;

/// Options that shape how a pipeline is applied, independent of any one
/// profile - rendering intent is per-kernel (latched at construction), but
/// these flags govern the apply loop itself.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    pub black_point_compensation: bool,
    pub clamp_output: bool,
    pub mru_capacity: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            black_point_compensation: false,
            clamp_output: true,
            mru_capacity: 0,
        }
    }
}

impl ApplyOptions {
    pub fn with_bpc(mut self) -> Self {
        self.black_point_compensation = true;
        self
    }

    pub fn with_mru(mut self, capacity: usize) -> Self {
        self.mru_capacity = capacity;
        self
    }
}

/// Scratch owned by one thread's use of a sealed `CmmPipeline`. Constructed
/// once via `CmmPipeline::new_apply()` and reused across many `apply` calls.
pub struct ApplyContext {
    pub(crate) mediator: PcsMediator,
    pub(crate) scratch_a: Vec<f64>,
    pub(crate) scratch_b: Vec<f64>,
    pub(crate) cache: Option<MruCache>,
    pub options: ApplyOptions,
}

impl ApplyContext {
    pub fn new(max_channels: usize, options: ApplyOptions) -> Self {
        Self {
            mediator: PcsMediator::new(),
            scratch_a: vec![0.0; max_channels],
            scratch_b: vec![0.0; max_channels],
            cache: (options.mru_capacity > 0).then(|| MruCache::new(options.mru_capacity)),
            options,
        }
    }

    pub fn reset(&mut self) {
        self.mediator = PcsMediator::new();
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    /// Entries currently held by the MRU cache, or `None` when this
    /// context was built without one.
    pub fn cache_len(&self) -> Option<usize> {
        self.cache.as_ref().map(|c| c.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_cache_by_default() {
        let ctx = ApplyContext::new(4, ApplyOptions::default());
        assert!(ctx.cache.is_none());
        assert_eq!(ctx.scratch_a.len(), 4);
    }

    #[test]
    fn mru_capacity_enables_cache() {
        let ctx = ApplyContext::new(4, ApplyOptions::default().with_mru(8));
        assert!(ctx.cache.is_some());
    }
}
