use thiserror::Error;

#[derive(Error, Debug)]
pub enum BnkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("Decode cancelled")]
    Cancelled,
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BnkError>,
    },

    // Format errors: the input is not something this codec can open.
    #[error("Not a sound bank: expected BKHD, found {found:?}")]
    NotSoundBank { found: [u8; 4] },
    #[error("BKHD must be the first chunk, found {found:?}")]
    BkhdNotFirst { found: [u8; 4] },
    #[error("Missing mandatory {0} chunk")]
    MissingChunk(&'static str),
    #[error("Legacy bank, version {0}")]
    LegacyVersion(u32),
    #[error("Custom engine build ({marker}), version {version:#010x}")]
    CustomBuild { version: u32, marker: &'static str },
    #[error("Unrecognized custom engine build, version {0:#010x}")]
    UnknownCustomBuild(u32),
    #[error("Encrypted bank header, version {0:#010x}")]
    Encrypted(u32),
    #[error("Unknown bank version {version}, supported: {supported:?}")]
    UnsupportedVersion {
        version: u32,
        supported: &'static [u32],
    },
    #[error("Truncated {context}: needed {needed} bytes, {available} available")]
    Truncated {
        context: &'static str,
        needed: u64,
        available: u64,
    },

    // Invariant errors: the decoder's model of the layout disagrees with the bytes.
    #[error("{context}: declared {declared} bytes but decoder consumed {consumed}")]
    SizeMismatch {
        context: String,
        declared: u64,
        /// A lower bound when the decoder ran off the end of the HIRC chunk.
        consumed: u64,
    },
    #[error("{context}: decoder consumed no bytes")]
    NothingConsumed { context: String },
    #[error("Duplicate hierarchy ID {id} in category {category}")]
    DuplicateHircId { category: &'static str, id: u32 },
    #[error("Invalid action type {action_type:#06x} for version {version}, inspect manually")]
    InvalidActionType { action_type: u16, version: u32 },
    #[error("Unknown property ID {pid:#04x} for version {version}")]
    UnknownPropertyId { pid: u8, version: u32 },
    #[error("Plugin {plugin_id:#010x}: declared {declared} parameter bytes, layout needs {required}")]
    PluginParamOverrun {
        plugin_id: u32,
        declared: u32,
        required: u32,
    },

    // Encode errors: the in-memory graph cannot be expressed in the format.
    #[error("{context}: {count} entries do not fit the count field")]
    CountOverflow { context: &'static str, count: usize },
    #[error("Action type {action_type:#06x} expects {expected} parameters, graph holds {found}")]
    ActionParamMismatch {
        action_type: u16,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Inconsistent object graph: {0}")]
    InvalidGraph(String),

    // Editing errors raised by in-memory mutations.
    #[error("Property ID {0:#04x} already present in bundle")]
    DuplicatePropertyId(u8),
    #[error("Property index {index} out of range (len {len})")]
    PropertyIndexOutOfRange { index: usize, len: usize },
    #[error("Property ID {0:#04x} not present in bundle")]
    MissingPropertyId(u8),
    #[error("Audio source {0} already present in DATA")]
    DuplicateAudio(u32),
    #[error("Audio source {0} not present in DATA")]
    MissingAudio(u32),
    #[error("Media index entry for source {0} already exists")]
    DuplicateMediaEntry(u32),
    #[error("Integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Disagreement between the DIDX media index and the DATA payload buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("bank has a media index but no DATA chunk")]
    MissingDataChunk,
    #[error("bank has a DATA chunk but no media index")]
    MissingMediaIndex,
    #[error("source {source_id} is indexed but has no DATA range")]
    MissingData { source_id: u32 },
    #[error("source {source_id}: index declares {index_size} bytes, DATA holds {data_size}")]
    SizeMismatch {
        source_id: u32,
        index_size: u32,
        data_size: u32,
    },
    #[error("source {source_id}: index offset {index_offset}, DATA offset {data_offset}")]
    OffsetMismatch {
        source_id: u32,
        index_offset: u32,
        data_offset: u32,
    },
    #[error("DATA holds source {source_id} which is not indexed")]
    OrphanData { source_id: u32 },
    #[error("DATA bytes {offset}..+{len} belong to no indexed source")]
    OrphanBytes { offset: u32, len: u32 },
}

pub type Result<T> = std::result::Result<T, BnkError>;

impl BnkError {
    /// Wrap this error with a description of where it happened.
    pub fn context(self, context: impl Into<String>) -> Self {
        BnkError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error is a read past the end of the input.
    pub fn is_eof(&self) -> bool {
        matches!(self.root(), BnkError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }

    /// Innermost error, skipping any context wrappers.
    pub fn root(&self) -> &BnkError {
        match self {
            BnkError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach context to the error side of a `Result`.
pub(crate) trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
