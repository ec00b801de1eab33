use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural problems found while reading or mutating a class file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid classfile magic: 0x{0:08x}")]
    InvalidMagic(u32),
    #[error("unsupported classfile version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("invalid constant pool tag: {0}")]
    InvalidConstantPoolTag(u8),
    #[error("constant pool type mismatch at index {index}: expected {expected}, found {found}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid method handle reference kind {kind} at index {index}")]
    InvalidReferenceKind { index: u16, kind: u8 },
    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,
    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),
    #[error("{0} trailing bytes after classfile")]
    TrailingBytes(usize),
    #[error("constant pool is full")]
    ConstantPoolOverflow,
    #[error("class attribute table is full")]
    AttributeTableFull,
    #[error("string constant of {0} bytes exceeds the u2 length limit")]
    Utf8TooLong(usize),
}
