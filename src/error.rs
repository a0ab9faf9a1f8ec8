use thiserror::Error;

/// Errors surfaced by the FAT16 reader.
///
/// Only failures that make the image unusable are errors. Steady-state
/// conditions are values: `next_entry` returns `Ok(false)` at the end of a
/// directory and `read_from_cluster` returns a short count when the cluster
/// chain runs out before the request is satisfied.
#[derive(Error, Debug)]
pub enum Fat16Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed boot block: {0}")]
    MalformedBootBlock(String),
}
