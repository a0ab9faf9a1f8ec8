//! Walk a FAT16 image and copy every file into the host filesystem.
//!
//! Usage: fat16-extract <image> [output-dir]

use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fat16_image::{Entry, EntryKind, Image};

const CHUNK_SIZE: usize = 0x10000;

fn main() -> Result<()> {
    let mut args = std::env::args_os().skip(1);
    let image_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => bail!("usage: fat16-extract <image> [output-dir]"),
    };
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let file = File::open(&image_path)
        .with_context(|| format!("cannot open {}", image_path.display()))?;
    let mut image = Image::open(file)
        .with_context(|| format!("{} is not a usable FAT16 image", image_path.display()))?;

    extract_directory(&mut image, Entry::default(), &output_dir)
}

fn extract_directory<R: Read + Seek>(
    image: &mut Image<R>,
    mut cursor: Entry,
    dir: &Path,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    while image.next_entry(&mut cursor)? {
        // Deleted slots and the . / .. pseudo-entries are reported by the
        // iterator; recursing into them would loop.
        if cursor.kind() != EntryKind::File {
            continue;
        }

        let name = cursor.filename_lossy();
        if name.is_empty() {
            continue;
        }

        if cursor.record().is_directory() {
            if let Some(child) = image.first_entry_of(&cursor) {
                extract_directory(image, child, &dir.join(&name))?;
            }
            continue;
        }

        if cursor.record().is_archive() {
            extract_file(image, &cursor, &dir.join(&name))?;
        }
    }

    Ok(())
}

fn extract_file<R: Read + Seek>(
    image: &mut Image<R>,
    entry: &Entry,
    target: &Path,
) -> Result<()> {
    eprintln!("extracting {}", target.display());

    let mut out =
        File::create(target).with_context(|| format!("cannot create {}", target.display()))?;

    let start_cluster = entry.record().starting_cluster;
    let mut remaining = entry.record().file_size as usize;
    let mut offset = 0u32;
    let mut buffer = vec![0u8; CHUNK_SIZE];

    while remaining != 0 {
        let take = remaining.min(CHUNK_SIZE);
        let got = image.read_from_cluster(&mut buffer[..take], offset, start_cluster)?;
        if got == 0 {
            break;
        }

        out.write_all(&buffer[..got])?;
        remaining -= got;
        offset += got as u32;

        // A short count means the chain ended before the recorded size.
        if got < take {
            break;
        }
    }

    Ok(())
}
