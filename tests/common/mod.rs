//! Common test utilities for reading generated workbooks back.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use rxorder::package::{Package, SheetValues};

// ============================================================================
// Archive Helpers
// ============================================================================

/// Entry names in archive order.
#[must_use]
pub fn entry_names(data: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

/// Decompressed text of an archive entry.
#[must_use]
pub fn part_text(data: &[u8], path: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    let mut file = archive.by_name(path).expect("part should exist");
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

/// Compressed bytes and CRC of an archive entry, as stored.
#[must_use]
pub fn raw_entry(data: &[u8], path: &str) -> (Vec<u8>, u32) {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    for i in 0..archive.len() {
        let mut file = archive.by_index_raw(i).unwrap();
        if file.name() == path {
            let crc = file.crc32();
            let mut raw = Vec::new();
            file.read_to_end(&mut raw).unwrap();
            return (raw, crc);
        }
    }
    panic!("entry {path} not found");
}

// ============================================================================
// Sheet Helpers
// ============================================================================

/// All non-null values of a sheet.
#[must_use]
pub fn sheet_values(data: &[u8], sheet: &str) -> SheetValues {
    Package::open(data)
        .expect("package should open")
        .read_values(sheet, None)
        .expect("sheet should read")
}

/// Raw XML of a sheet, looked up by name.
#[must_use]
pub fn sheet_xml(data: &[u8], sheet: &str) -> String {
    let mut package = Package::open(data).expect("package should open");
    let path = package.sheet_path(sheet).unwrap().to_string();
    package.read_part(&path).unwrap()
}

/// Attribute `key` of the `<c>` element at `cell_ref`, if the cell exists.
#[must_use]
pub fn cell_attr(xml: &str, cell_ref: &str, key: &str) -> Option<Option<String>> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let attr = |name: &str| {
                    e.attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == name.as_bytes())
                        .map(|a| a.unescape_value().unwrap().into_owned())
                };
                if attr("r").as_deref() == Some(cell_ref) {
                    return Some(attr(key));
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

/// Style index of a cell (`None` when the cell is missing or unstyled).
#[must_use]
pub fn cell_style(xml: &str, cell_ref: &str) -> Option<String> {
    cell_attr(xml, cell_ref, "s").flatten()
}

/// Width of the `<col>` element covering `col`.
#[must_use]
pub fn col_width(xml: &str, col: u32) -> Option<f64> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"col" => {
                let num = |name: &[u8]| {
                    e.attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == name)
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                };
                let min: u32 = num(b"min").unwrap().parse().unwrap();
                let max: u32 = num(b"max").unwrap().parse().unwrap();
                if (min..=max).contains(&col) {
                    return num(b"width").map(|w| w.parse().unwrap());
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}
