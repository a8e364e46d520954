#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line whose trailing checksum field does not match the mod-256 sum
    /// of the preceding characters.
    #[error("line {line}: checksum mismatch, computed {computed:02X} expected {expected:02X}")]
    Checksum {
        line: usize,
        computed: u8,
        expected: u8,
    },

    /// A malformed header or track field.
    #[error("line {line}: invalid {field}: {value:?}")]
    Format {
        line: usize,
        /// Name of the offending field or column
        field: &'static str,
        /// Raw text of the offending field
        value: String,
    },

    /// A mandatory header line that is absent or out of order.
    #[error("line {line}: missing header line {label:?}")]
    MissingHeader { line: usize, label: &'static str },

    /// A version tag outside the supported set. Distinct from [`Error::Format`]
    /// so callers can tell a corrupt file from one this decoder does not
    /// implement yet.
    #[error("line {line}: unsupported format revision {tag:?}")]
    UnsupportedRevision { line: usize, tag: String },
}

pub type Result<T> = std::result::Result<T, Error>;
