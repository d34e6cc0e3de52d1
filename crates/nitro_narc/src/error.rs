//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
///
/// One variant per validation failure; every operation returns the first
/// error it encounters and nothing is retried.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// unable to open or read a source file or spec file
    #[error("invalid input file")]
    InvalidInputFile(#[source] std::io::Error),

    /// unable to create or write a destination file
    #[error("invalid output file")]
    InvalidOutputFile(#[source] std::io::Error),

    /// header magic is not "NARC"
    #[error("invalid header id")]
    InvalidHeaderId,

    /// byte-order mark is not 0xFFFE
    #[error("invalid byte order mark")]
    InvalidByteOrderMark,

    /// version is neither 0x0000 nor 0x0100
    #[error("invalid narc version")]
    InvalidVersion,

    /// header chunk size is not 16
    #[error("invalid header size")]
    InvalidHeaderSize,

    /// chunk count is not 3
    #[error("invalid chunk count")]
    InvalidChunkCount,

    /// allocation table magic is not "BTAF"
    #[error("invalid file allocation table id")]
    InvalidFileAllocationTableId,

    /// allocation table reserved field is not zero
    #[error("invalid file allocation table reserved section")]
    InvalidFileAllocationTableReserved,

    /// name table magic is not "BTNF"
    #[error("invalid file name table id")]
    InvalidFileNameTableId,

    /// malformed name table record (bad length, stream overrun, or a
    /// directory id outside the table)
    #[error("invalid file name table entry id")]
    InvalidFileNameTableEntryId,

    /// image blob magic is not "GMIF"
    #[error("invalid file images id")]
    InvalidFileImagesId,

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRw(#[from] binrw::Error),

    /// catch-all for conditions without a dedicated kind
    #[error("{0}")]
    Custom(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
