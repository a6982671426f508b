//! Raw persistence of layer fields.
//!
//! A field stored under `key` is a text header `<key>_H` and a data file
//! `<key>_D`. The header follows the raw plotfile layout:
//!
//! ```text
//! 1                      version
//! 0                      one data file per field
//! 2                      components
//! (2,2,0)                ghost cells per axis
//! (2 0                   number of blocks
//! ((-4,0,0) (-1,15,0) (0,1,0))
//! ((16,0,0) (19,15,0) (0,1,0))
//! )
//! FabOnDisk: pml_Ex_fp_D 0
//! FabOnDisk: pml_Ex_fp_D 3456
//! ```
//!
//! Each block is written over its grown box as native-endian `f64` values,
//! component after component, each in Fortran order. Data files are only
//! portable between hosts of the same byte order.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::arrays::BlockField;
use crate::{Error, Result};

const VERSION: u32 = 1;
const HOW: u32 = 0;

fn header_path(key: &str) -> String {
    format!("{}_H", key)
}

fn data_path(key: &str) -> String {
    format!("{}_D", key)
}

fn ghost_line(ng: [i32; 3]) -> String {
    format!("({},{},{})", ng[0], ng[1], ng[2])
}

/// Write `field` under `key`.
pub fn write_field(field: &BlockField, key: &str) -> Result<()> {
    if let Some(parent) = Path::new(key).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data_file = data_path(key);
    let data_name = Path::new(&data_file)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Checkpoint(format!("invalid checkpoint key `{}`", key)))?
        .to_string();

    let mut data = BufWriter::new(File::create(&data_file)?);
    let mut offsets = Vec::with_capacity(field.len());
    let mut offset = 0usize;
    for blk in field.blocks() {
        offsets.push(offset);
        let bytes: &[u8] = bytemuck::cast_slice(blk.as_slice());
        data.write_all(bytes)?;
        offset += bytes.len();
    }
    data.flush()?;

    let mut header = BufWriter::new(File::create(header_path(key))?);
    writeln!(header, "{}", VERSION)?;
    writeln!(header, "{}", HOW)?;
    writeln!(header, "{}", field.ncomp())?;
    writeln!(header, "{}", ghost_line(field.n_grow()))?;
    writeln!(header, "({} 0", field.len())?;
    for bx in field.box_array() {
        writeln!(header, "{:?}", bx)?;
    }
    writeln!(header, ")")?;
    for off in &offsets {
        writeln!(header, "FabOnDisk: {} {}", data_name, off)?;
    }
    header.flush()?;

    log::trace!("wrote {} blocks to {}", field.len(), data_file);
    Ok(())
}

fn next_line(lines: &mut impl Iterator<Item = std::io::Result<String>>, key: &str, what: &str) -> Result<String> {
    match lines.next() {
        Some(line) => Ok(line?.trim().to_string()),
        None => Err(Error::Checkpoint(format!(
            "header of `{}` ends before the {} line",
            key, what
        ))),
    }
}

/// Read `field` back from `key`; the stored layout must match `field`.
pub fn read_field(field: &mut BlockField, key: &str) -> Result<()> {
    let hpath = header_path(key);
    if !Path::new(&hpath).exists() {
        return Err(Error::Checkpoint(format!(
            "no checkpoint data stored under `{}`",
            key
        )));
    }

    let mut lines = BufReader::new(File::open(&hpath)?).lines();
    let mismatch = |what: &str, found: &str, expected: &str| {
        Error::Checkpoint(format!(
            "`{}`: stored {} `{}` does not match `{}`",
            key, what, found, expected
        ))
    };

    let version = next_line(&mut lines, key, "version")?;
    if version != VERSION.to_string() {
        return Err(mismatch("version", &version, &VERSION.to_string()));
    }
    let _how = next_line(&mut lines, key, "layout")?;
    let ncomp = next_line(&mut lines, key, "component count")?;
    if ncomp != field.ncomp().to_string() {
        return Err(mismatch("component count", &ncomp, &field.ncomp().to_string()));
    }
    let ng = next_line(&mut lines, key, "ghost")?;
    if ng != ghost_line(field.n_grow()) {
        return Err(mismatch("ghost width", &ng, &ghost_line(field.n_grow())));
    }
    let _count = next_line(&mut lines, key, "block count")?;

    for bx in field.box_array() {
        let line = next_line(&mut lines, key, "block")?;
        let expected = format!("{:?}", bx);
        if line != expected {
            return Err(mismatch("block", &line, &expected));
        }
    }
    let close = next_line(&mut lines, key, "block list end")?;
    if close != ")" {
        return Err(mismatch("block list end", &close, ")"));
    }

    let mut entries = Vec::with_capacity(field.len());
    for line in lines {
        let line = line?;
        let mut parts = line.split_whitespace();
        if parts.next() != Some("FabOnDisk:") {
            continue;
        }
        let file = parts.next().unwrap_or_default().to_string();
        let offset: usize = parts
            .next()
            .and_then(|o| o.parse().ok())
            .ok_or_else(|| Error::Checkpoint(format!("`{}`: malformed line `{}`", key, line)))?;
        entries.push((file, offset));
    }
    if entries.len() != field.len() {
        return Err(Error::Checkpoint(format!(
            "`{}`: {} data entries for {} blocks",
            key,
            entries.len(),
            field.len()
        )));
    }

    let dir = Path::new(key).parent().unwrap_or_else(|| Path::new(""));
    let mut cache: Option<(String, Vec<u8>)> = None;
    for (blk, (file, offset)) in field.blocks_mut().iter_mut().zip(entries) {
        if cache.as_ref().map_or(true, |(name, _)| *name != file) {
            let bytes = fs::read(dir.join(&file))?;
            cache = Some((file.clone(), bytes));
        }
        let bytes = match &cache {
            Some((_, bytes)) => bytes,
            None => continue,
        };
        let dst = blk.as_mut_slice();
        let len = std::mem::size_of_val(dst);
        let src = bytes.get(offset..offset + len).ok_or_else(|| {
            Error::Checkpoint(format!(
                "`{}`: data file `{}` too short for block at offset {}",
                key, file, offset
            ))
        })?;
        bytemuck::cast_slice_mut::<f64, u8>(dst).copy_from_slice(src);
    }

    log::trace!("read {} blocks from {}", field.len(), key);
    Ok(())
}
