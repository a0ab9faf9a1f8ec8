//! Directory records: classic 8.3 slots, long-filename slots, and the
//! iteration cursor that pairs them back together.

use crate::image::ClusterId;

// Attribute bits at offset 11 of a directory slot.
pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// Classification of a directory slot by its leading filename byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An ordinary record (file or directory).
    File,
    /// A "." or ".." pseudo-entry (leading 0x2E).
    DotEntry,
    /// A slot freed by deletion (leading 0xE5).
    Deleted,
    /// A never-used slot; marks the end of the directory (leading 0x00).
    Unused,
}

/// A classic 8.3 directory record, decoded from one 32-byte slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirRecord {
    /// Raw filename stem, space padded. The first byte is overloaded; see
    /// [`DirRecord::kind`].
    pub name: [u8; 8],
    /// Raw extension, space padded.
    pub extension: [u8; 3],
    pub attributes: u8,
    /// Raw last-modified time field; not interpreted.
    pub modified_time: u16,
    /// Raw last-modified date field; not interpreted.
    pub modified_date: u16,
    /// First cluster of the record's data chain.
    pub starting_cluster: ClusterId,
    pub file_size: u32,
}

impl DirRecord {
    pub fn from_slot(slot: &[u8; 32]) -> Self {
        let mut name = [0u8; 8];
        name.copy_from_slice(&slot[0..8]);
        let mut extension = [0u8; 3];
        extension.copy_from_slice(&slot[8..11]);

        Self {
            name,
            extension,
            attributes: slot[11],
            modified_time: u16::from_le_bytes([slot[22], slot[23]]),
            modified_date: u16::from_le_bytes([slot[24], slot[25]]),
            starting_cluster: u16::from_le_bytes([slot[26], slot[27]]),
            file_size: u32::from_le_bytes([slot[28], slot[29], slot[30], slot[31]]),
        }
    }

    /// Classify the record from its leading filename byte.
    pub fn kind(&self) -> EntryKind {
        match self.name[0] {
            0x00 => EntryKind::Unused,
            0xE5 => EntryKind::Deleted,
            0x2E => EntryKind::DotEntry,
            _ => EntryKind::File,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes & ATTR_READ_ONLY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes & ATTR_HIDDEN != 0
    }

    pub fn is_system(&self) -> bool {
        self.attributes & ATTR_SYSTEM != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & ATTR_VOLUME_ID != 0
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    pub fn is_archive(&self) -> bool {
        self.attributes & ATTR_ARCHIVE != 0
    }

    /// True when the attribute byte carries the long-filename marker.
    pub fn is_long_name(&self) -> bool {
        self.attributes == ATTR_LONG_NAME
    }
}

/// One long-filename slot: up to 13 UTF-16 code units split across three
/// runs, plus chain bookkeeping.
///
/// On disk the slots of one name precede its 8.3 record, highest sequence
/// number first.
#[derive(Debug, Clone, Copy)]
pub struct LfnRecord {
    /// Position byte; bit 6 marks the last slot in name order.
    pub sequence: u8,
    pub name_part_1: [u16; 5],
    pub attributes: u8,
    pub entry_type: u8,
    /// Checksum of the paired 8.3 name. Carried, not validated.
    pub checksum: u8,
    pub name_part_2: [u16; 6],
    pub padding: u16,
    pub name_part_3: [u16; 2],
}

impl LfnRecord {
    /// True when the 32-byte slot has the long-filename layout: the LFN
    /// attribute marker plus a zero padding word at offset 26.
    pub fn is_long_name_slot(slot: &[u8; 32]) -> bool {
        slot[11] == ATTR_LONG_NAME && slot[26] == 0 && slot[27] == 0
    }

    pub fn from_slot(slot: &[u8; 32]) -> Self {
        let units = |range: std::ops::Range<usize>| {
            slot[range]
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
        };

        let mut part_1 = [0u16; 5];
        for (dst, unit) in part_1.iter_mut().zip(units(1..11)) {
            *dst = unit;
        }
        let mut part_2 = [0u16; 6];
        for (dst, unit) in part_2.iter_mut().zip(units(14..26)) {
            *dst = unit;
        }
        let mut part_3 = [0u16; 2];
        for (dst, unit) in part_3.iter_mut().zip(units(28..32)) {
            *dst = unit;
        }

        Self {
            sequence: slot[0],
            name_part_1: part_1,
            attributes: slot[11],
            entry_type: slot[12],
            checksum: slot[13],
            name_part_2: part_2,
            padding: u16::from_le_bytes([slot[26], slot[27]]),
            name_part_3: part_3,
        }
    }

    /// The record's 13 code units in name order.
    pub fn code_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.name_part_1
            .iter()
            .chain(self.name_part_2.iter())
            .chain(self.name_part_3.iter())
            .copied()
    }
}

/// Stateful directory iteration cursor.
///
/// A zero-initialised cursor points at the start of the root directory;
/// [`crate::Image::first_entry_of`] yields cursors for subdirectories. The
/// image advances the cursor on every `next_entry` call, leaving the most
/// recently decoded 8.3 record and its accumulated long-filename slots
/// readable here.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    /// Byte offset of the next slot to examine, relative to the start of
    /// the directory. Always a multiple of 32.
    pub(crate) cursor_record: u32,
    /// 0 when iterating the flat root region, otherwise the starting
    /// cluster of the subdirectory's chain.
    pub(crate) root: ClusterId,
    pub(crate) record: DirRecord,
    /// Long-filename slots collected for `record`, in on-disk order
    /// (highest sequence number first).
    pub(crate) long_name_records: Vec<LfnRecord>,
}

impl Entry {
    /// The most recently decoded 8.3 record.
    pub fn record(&self) -> &DirRecord {
        &self.record
    }

    /// Classification of the current record's leading filename byte.
    pub fn kind(&self) -> EntryKind {
        self.record.kind()
    }

    /// Byte offset of the next slot this cursor will examine.
    pub fn cursor_offset(&self) -> u32 {
        self.cursor_record
    }

    /// Long-filename slots accumulated for the current record, in on-disk
    /// order.
    pub fn long_name_records(&self) -> &[LfnRecord] {
        &self.long_name_records
    }

    /// Decode the current record's filename as UTF-16 code units.
    ///
    /// When long-filename slots were collected they are reassembled in
    /// reverse insertion order (ascending sequence number); a 0x0000 code
    /// unit terminates the whole name. Otherwise the 8.3 stem and extension
    /// are concatenated with space padding trimmed. No dot is inserted
    /// between stem and extension; that is the caller's policy.
    pub fn filename_utf16(&self) -> Vec<u16> {
        if !self.long_name_records.is_empty() {
            let mut name = Vec::new();
            'records: for record in self.long_name_records.iter().rev() {
                for unit in record.code_units() {
                    if unit == 0 {
                        break 'records;
                    }
                    name.push(unit);
                }
            }
            return name;
        }

        let mut bytes = self.record.name.to_vec();
        if self.record.kind() == EntryKind::DotEntry {
            bytes.remove(0);
        } else if bytes[0] == 0x05 {
            // 0x05 escapes a literal 0xE5 leading byte.
            bytes[0] = 0xE5;
        }
        while bytes.last() == Some(&b' ') {
            bytes.pop();
        }
        bytes.extend_from_slice(&self.record.extension);
        while bytes.last() == Some(&b' ') {
            bytes.pop();
        }

        bytes.into_iter().map(u16::from).collect()
    }

    /// Decode the current record's filename into a `String`, replacing
    /// unpaired surrogates.
    pub fn filename_lossy(&self) -> String {
        String::from_utf16_lossy(&self.filename_utf16())
    }
}
