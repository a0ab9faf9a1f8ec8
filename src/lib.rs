//! Read-only access to FAT16 disk images.
//!
//! [`Image`] wraps any random-access byte source (`Read + Seek`) and
//! exposes the decoded [`BootBlock`], directory iteration with
//! long-filename reassembly, and random-access file reads that follow FAT
//! cluster chains. It never writes, never caches cluster data, and never
//! interprets timestamps or labels beyond surfacing the raw fields.
//!
//! ```no_run
//! use std::fs::File;
//! use fat16_image::{Entry, Image};
//!
//! # fn main() -> Result<(), fat16_image::Fat16Error> {
//! let mut image = Image::open(File::open("floppy.img")?)?;
//! let mut cursor = Entry::default();
//! while image.next_entry(&mut cursor)? {
//!     println!("{}", cursor.filename_lossy());
//! }
//! # Ok(())
//! # }
//! ```

pub mod boot;
pub mod entry;
pub mod error;
pub mod image;

pub use boot::BootBlock;
pub use entry::{DirRecord, Entry, EntryKind, LfnRecord};
pub use error::Fat16Error;
pub use image::{ClusterId, Image, BAD_CLUSTER, END_OF_CHAIN};
