//! The image facade: FAT chain walking, cluster-chain reads and directory
//! iteration over a random-access byte source.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use crate::boot::{BootBlock, DIR_RECORD_SIZE};
use crate::entry::{DirRecord, Entry, EntryKind, LfnRecord, ATTR_DIRECTORY};
use crate::error::Fat16Error;

/// Index of an allocation unit. The data region is addressed starting at
/// cluster 2; values 0 and 1 never identify data.
pub type ClusterId = u16;

/// FAT values at or above this terminate a cluster chain.
pub const END_OF_CHAIN: ClusterId = 0xFFF8;

/// FAT value marking an unusable cluster.
pub const BAD_CLUSTER: ClusterId = 0xFFF7;

/// True when `cluster` cannot be followed any further.
fn chain_ends(cluster: ClusterId) -> bool {
    cluster < 2 || cluster >= END_OF_CHAIN
}

/// Read-only view over a FAT16 image.
///
/// Generic over any random-access byte source; an `io::Cursor` over a byte
/// vector and a `File` both qualify. Every operation seeks before it reads,
/// so the source's position between calls is unspecified. A single `Image`
/// must not be driven from multiple threads at once.
pub struct Image<R> {
    source: R,
    boot: BootBlock,
}

impl<R: Read + Seek> Image<R> {
    /// Open an image: reads and caches the boot block from offset 0.
    pub fn open(mut source: R) -> Result<Self, Fat16Error> {
        let boot = BootBlock::read_from(&mut source)?;
        debug!(
            "FAT16 geometry: fat @ {:#x}, root dir @ {:#x}, data @ {:#x}, {} bytes/cluster",
            boot.fat_region_start(),
            boot.root_directory_region_start(),
            boot.data_region_start(),
            boot.bytes_per_cluster()
        );
        Ok(Self { source, boot })
    }

    /// The decoded boot block.
    pub fn boot_block(&self) -> &BootBlock {
        &self.boot
    }

    /// Bytes covered by one allocation unit.
    pub fn bytes_per_cluster(&self) -> u32 {
        self.boot.bytes_per_cluster()
    }

    /// Give the underlying source back to the caller.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Look up the successor of `cluster` in the FAT.
    ///
    /// Returns the raw table value without interpreting it; whether a value
    /// terminates a chain is the reader's decision. A truncated FAT reads
    /// as 0, which callers treat as end of chain.
    pub fn successor_cluster(&mut self, cluster: ClusterId) -> Result<ClusterId, Fat16Error> {
        let offset = self.boot.fat_region_start() as u64 + cluster as u64 * 2;
        self.source.seek(SeekFrom::Start(offset))?;
        match self.source.read_u16::<LittleEndian>() {
            Ok(next) => Ok(next),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Read `dest.len()` bytes from the chain rooted at `start_cluster`,
    /// beginning `byte_offset` bytes into it.
    ///
    /// Returns the number of bytes actually read. The count falls short of
    /// the request when the chain or the image ends first; that is not an
    /// error. Chain walking is capped at the FAT's entry count so a cyclic
    /// table cannot loop forever.
    pub fn read_from_cluster(
        &mut self,
        dest: &mut [u8],
        byte_offset: u32,
        start_cluster: ClusterId,
    ) -> Result<usize, Fat16Error> {
        if dest.is_empty() {
            return Ok(0);
        }

        let bytes_per_cluster = self.boot.bytes_per_cluster();
        let mut cluster_offset = byte_offset % bytes_per_cluster;
        let skip = byte_offset / bytes_per_cluster;

        let max_steps = self.boot.fat_entry_count();
        let mut steps = 0u32;

        // Walk to the first cluster covering the requested range.
        let mut cluster = start_cluster;
        for _ in 0..skip {
            if chain_ends(cluster) {
                return Ok(0);
            }
            cluster = self.successor_cluster(cluster)?;
            steps += 1;
            if steps > max_steps {
                warn!("cluster chain from {start_cluster} exceeds the FAT entry count");
                return Ok(0);
            }
        }

        let data_start = self.boot.data_region_start() as u64;
        let mut done = 0usize;

        while done < dest.len() && !chain_ends(cluster) {
            let position =
                data_start + (cluster as u64 - 2) * bytes_per_cluster as u64 + cluster_offset as u64;
            let take = ((bytes_per_cluster - cluster_offset) as usize).min(dest.len() - done);

            self.source.seek(SeekFrom::Start(position))?;
            let got = read_some(&mut self.source, &mut dest[done..done + take])?;
            done += got;
            if got < take {
                break;
            }

            cluster_offset = 0;
            cluster = self.successor_cluster(cluster)?;
            steps += 1;
            if steps > max_steps {
                warn!("cluster chain from {start_cluster} exceeds the FAT entry count");
                break;
            }
        }

        Ok(done)
    }

    /// Advance `entry` to the next directory record.
    ///
    /// Long-filename slots preceding the record are accumulated on the
    /// cursor, then the 8.3 record itself is decoded. Deleted and dot
    /// records are reported as-is; filtering is the caller's job. Returns
    /// `Ok(false)` at the end of the directory: the root's record capacity
    /// is exhausted, a read comes up short, or the slot carries the 0x00
    /// end-of-directory marker.
    pub fn next_entry(&mut self, entry: &mut Entry) -> Result<bool, Fat16Error> {
        entry.long_name_records.clear();

        let mut slot = [0u8; DIR_RECORD_SIZE as usize];
        loop {
            if !self.read_directory_slot(entry, &mut slot)? {
                return Ok(false);
            }
            if !LfnRecord::is_long_name_slot(&slot) {
                break;
            }
            entry.long_name_records.push(LfnRecord::from_slot(&slot));
            entry.cursor_record += DIR_RECORD_SIZE;
        }

        let record = DirRecord::from_slot(&slot);
        if record.kind() == EntryKind::Unused {
            // End-of-directory marker; leave the cursor parked on it so
            // further calls keep reporting the end.
            return Ok(false);
        }

        entry.record = record;
        entry.cursor_record += DIR_RECORD_SIZE;
        Ok(true)
    }

    /// Begin iterating the subdirectory behind `parent`.
    ///
    /// Returns `None` when the parent record does not carry the DIRECTORY
    /// attribute. Note that "." and ".." records carry it too; callers that
    /// recurse should skip entries whose [`Entry::kind`] is not
    /// [`EntryKind::File`].
    pub fn first_entry_of(&self, parent: &Entry) -> Option<Entry> {
        if parent.record.attributes & ATTR_DIRECTORY == 0 {
            return None;
        }
        Some(Entry {
            root: parent.record.starting_cluster,
            ..Entry::default()
        })
    }

    /// Fetch the 32-byte slot at the cursor of `entry`. False when the
    /// directory's record capacity is exhausted or the read comes up short.
    fn read_directory_slot(
        &mut self,
        entry: &Entry,
        slot: &mut [u8; DIR_RECORD_SIZE as usize],
    ) -> Result<bool, Fat16Error> {
        if entry.root == 0 {
            if entry.cursor_record / DIR_RECORD_SIZE >= self.boot.root_dir_entries as u32 {
                return Ok(false);
            }
            let position =
                self.boot.root_directory_region_start() as u64 + entry.cursor_record as u64;
            self.source.seek(SeekFrom::Start(position))?;
            let got = read_some(&mut self.source, slot)?;
            Ok(got == slot.len())
        } else {
            let got = self.read_from_cluster(slot, entry.cursor_record, entry.root)?;
            Ok(got == slot.len())
        }
    }
}

/// Fill as much of `buf` as the source can provide. End of input is not an
/// error; the caller sees it as a short count.
fn read_some<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize, Fat16Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
