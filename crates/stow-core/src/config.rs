use serde::{Deserialize, Serialize};

use crate::buffer::HEADROOM;
use crate::error::{StowError, StowResult};

/// Default block size of the save buffer (1 MiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Longest string the decoder accepts.
pub const DEFAULT_MAX_STRING_LEN: usize = 4095;

/// Engine-wide limits for encoding and decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StowConfig {
    /// Size of the block accumulated before each sink write.
    pub buffer_capacity: usize,
    /// Maximum byte length of any key, value or header string. May only
    /// tighten the format's 4095-byte limit, never raise it.
    pub max_string_len: usize,
    /// Maximum object nesting depth on decode; `None` is unbounded.
    pub max_depth: Option<usize>,
}

impl Default for StowConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_depth: None,
        }
    }
}

impl StowConfig {
    pub fn validate(&self) -> StowResult<()> {
        if self.buffer_capacity <= HEADROOM {
            return Err(StowError::InvalidConfig(format!(
                "buffer_capacity must exceed {HEADROOM} bytes, got {}",
                self.buffer_capacity
            )));
        }
        if self.max_string_len > DEFAULT_MAX_STRING_LEN {
            return Err(StowError::InvalidConfig(format!(
                "max_string_len {} exceeds the format limit of {DEFAULT_MAX_STRING_LEN}",
                self.max_string_len
            )));
        }
        Ok(())
    }
}

/// How a load combines decoded content with what the target already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadMode {
    /// Overwrite scalars and children by key, append array elements.
    #[default]
    Merge,
    /// Clear the target before taking the decoded content.
    Replace,
}

/// Per-call load settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub mode: LoadMode,
    /// Log a missing file as an error rather than at debug level.
    pub report_missing: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mode: LoadMode::Merge,
            report_missing: true,
        }
    }
}

impl LoadOptions {
    /// Options for a first run where the file may legitimately not exist yet.
    pub fn quiet() -> Self {
        Self {
            report_missing: false,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }
}
