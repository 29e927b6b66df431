use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BnkError, Result};

/// Knobs for `Bank::decode_with`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DecodeOptions {
    /// Worker threads for chunk and object decode; 0 lets rayon pick.
    pub workers: usize,
    /// Decode HIRC objects on the pool instead of sequentially.
    pub parallel_hirc: bool,
    /// Treat a bank without DIDX as an error instead of a warning.
    pub require_media_index: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            workers: 0,
            parallel_hirc: true,
            require_media_index: false,
        }
    }
}

impl DecodeOptions {
    pub(crate) fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("bnk-decode-{i}"))
            .build()
            .map_err(|e| BnkError::ThreadPool(e.to_string()))
    }
}

/// Shared flag that stops an in-flight decode.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BnkError::Cancelled)
        } else {
            Ok(())
        }
    }
}
