//! Wwise SoundBank (`.bnk`) codec.
//!
//! A bank decodes into a [`Bank`] holding its chunks in file order; encoding
//! walks the same order and rebuilds every size field, so an unmodified bank
//! re-encodes byte for byte.

pub mod action;
mod codec;
pub mod error;
pub mod hirc;
pub mod options;
pub mod plugin;
pub mod process;
pub mod prop_table;
pub mod props;
pub mod reader;
pub mod serde_util;
pub mod types;
pub mod version;
pub mod writer;

pub use codec::GraphPoint;
pub use error::{BnkError, IntegrityError, Result};
pub use hirc::{Hirc, HircCategory, HircObj};
pub use options::{CancelToken, DecodeOptions};
pub use types::*;
pub use version::{SUPPORTED_VERSIONS, check_version};
