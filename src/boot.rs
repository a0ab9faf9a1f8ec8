//! Boot-sector decoding and on-disk geometry.

use std::io::{Read, Seek, SeekFrom};

use log::warn;

use crate::error::Fat16Error;

/// Size of one directory record slot in bytes.
pub const DIR_RECORD_SIZE: u32 = 32;

/// Conventional signature word at offset 510. Read but not enforced:
/// images in the wild carry other values.
pub const BOOT_SIGNATURE: u16 = 0xAA55;

/// Decoded FAT16 boot sector (the first 512 bytes of the image).
///
/// All multi-byte fields are little-endian on disk. Label, id, geometry and
/// timestamp-adjacent fields are surfaced raw and never interpreted here.
#[derive(Debug, Clone)]
pub struct BootBlock {
    /// OEM name / manufacturer description, space padded.
    pub oem_name: [u8; 8],
    /// Logical sector size in bytes.
    pub bytes_per_block: u16,
    /// Sectors per allocation unit (cluster).
    pub blocks_per_allocation_unit: u8,
    /// Sectors before the first FAT.
    pub reserved_blocks: u16,
    /// Number of FAT copies (typically 2).
    pub num_fats: u8,
    /// Capacity of the root directory, in 32-byte records.
    pub root_dir_entries: u16,
    /// Total sector count, 16-bit variant (0 when the 32-bit one is used).
    pub total_blocks_short: u16,
    pub media_descriptor: u8,
    /// Sectors occupied by one FAT copy.
    pub blocks_per_fat: u16,
    pub blocks_per_track: u16,
    pub num_heads: u16,
    pub hidden_blocks: u32,
    /// Total sector count, 32-bit variant.
    pub total_blocks_long: u32,
    pub drive_number: u16,
    pub extended_boot_signature: u8,
    pub volume_id: u32,
    /// Volume label, raw bytes, space padded.
    pub volume_label: [u8; 11],
    /// Filesystem id string, raw bytes (typically "FAT16   ").
    pub filesystem_id: [u8; 8],
    /// Signature word at offset 510.
    pub signature: u16,
}

impl BootBlock {
    /// Read and decode the boot sector from offset 0 of `source`.
    pub fn read_from<R: Read + Seek>(source: &mut R) -> Result<Self, Fat16Error> {
        source.seek(SeekFrom::Start(0))?;

        let mut raw = [0u8; 512];
        source.read_exact(&mut raw).map_err(|e| {
            Fat16Error::MalformedBootBlock(format!("cannot read boot sector: {e}"))
        })?;

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&raw[3..11]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&raw[43..54]);
        let mut filesystem_id = [0u8; 8];
        filesystem_id.copy_from_slice(&raw[54..62]);

        let block = Self {
            oem_name,
            bytes_per_block: u16::from_le_bytes([raw[11], raw[12]]),
            blocks_per_allocation_unit: raw[13],
            reserved_blocks: u16::from_le_bytes([raw[14], raw[15]]),
            num_fats: raw[16],
            root_dir_entries: u16::from_le_bytes([raw[17], raw[18]]),
            total_blocks_short: u16::from_le_bytes([raw[19], raw[20]]),
            media_descriptor: raw[21],
            blocks_per_fat: u16::from_le_bytes([raw[22], raw[23]]),
            blocks_per_track: u16::from_le_bytes([raw[24], raw[25]]),
            num_heads: u16::from_le_bytes([raw[26], raw[27]]),
            hidden_blocks: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
            total_blocks_long: u32::from_le_bytes([raw[32], raw[33], raw[34], raw[35]]),
            drive_number: u16::from_le_bytes([raw[36], raw[37]]),
            extended_boot_signature: raw[38],
            volume_id: u32::from_le_bytes([raw[39], raw[40], raw[41], raw[42]]),
            volume_label,
            filesystem_id,
            signature: u16::from_le_bytes([raw[510], raw[511]]),
        };

        if block.bytes_per_block == 0 {
            return Err(Fat16Error::MalformedBootBlock(
                "bytes per block is zero".into(),
            ));
        }
        if block.blocks_per_allocation_unit == 0 {
            return Err(Fat16Error::MalformedBootBlock(
                "blocks per allocation unit is zero".into(),
            ));
        }
        if block.signature != BOOT_SIGNATURE {
            warn!(
                "boot sector signature is {:#06x}, expected {:#06x}",
                block.signature, BOOT_SIGNATURE
            );
        }

        Ok(block)
    }

    /// Byte offset of the first FAT.
    pub fn fat_region_start(&self) -> u32 {
        self.reserved_blocks as u32 * self.bytes_per_block as u32
    }

    /// Byte offset of the root directory region, right after the FAT copies.
    pub fn root_directory_region_start(&self) -> u32 {
        self.fat_region_start()
            + self.num_fats as u32 * self.blocks_per_fat as u32 * self.bytes_per_block as u32
    }

    /// Byte offset of the data region; cluster 2 starts here.
    pub fn data_region_start(&self) -> u32 {
        self.root_directory_region_start() + self.root_dir_entries as u32 * DIR_RECORD_SIZE
    }

    /// Bytes covered by one allocation unit.
    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_block as u32 * self.blocks_per_allocation_unit as u32
    }

    /// Number of 16-bit entries one FAT copy can hold.
    pub fn fat_entry_count(&self) -> u32 {
        self.blocks_per_fat as u32 * self.bytes_per_block as u32 / 2
    }
}
