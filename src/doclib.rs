// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/doclib.rs - KiCad documentation library generator.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `doclib` Module
 *
 * Builds a KiCad documentation library (`.dcm`) from the header lines of a
 * directory of intermediate pin tables (`*.kipart.csv`).
 *
 * ## Usage Example
 *
 * ```no_run
 * use kicube::doclib::DocLibrary;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let doclib = DocLibrary::from_dir("kipart")?;
 *     doclib.save("nucleo.dcm")?;
 *     Ok(())
 * }
 * ```
 */

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::assembler::SymbolHeader;
use crate::error::Result;

/// File name suffix of intermediate pin tables.
pub const PIN_TABLE_SUFFIX: &str = ".kipart.csv";

const HEADER: &str = "EESchema-DOCLIB  Version 2.0";
const FOOTER: &str = "#End Doc Library";

/// The documentation of one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    pub name: String,
    /// `D` line.
    pub description: String,
    /// `K` line.
    pub keywords: String,
    /// `F` line.
    pub datasheet: String,
}

impl From<SymbolHeader> for DocEntry {
    fn from(header: SymbolHeader) -> Self {
        Self {
            name: header.symbol_name,
            description: header.short_description,
            keywords: header.long_description,
            datasheet: header.datasheet_url,
        }
    }
}

/// Lists the intermediate pin tables in `dir`, sorted by path.
pub fn find_pin_tables<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pin_table = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(PIN_TABLE_SUFFIX))
            .unwrap_or(false);
        if is_pin_table && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Reads the documentation entry from the header of a pin table. Returns
/// `None` if the header has no symbol name.
pub fn read_entry<P: AsRef<Path>>(path: P) -> Result<Option<DocEntry>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let header = SymbolHeader::from_line(line.trim_end_matches(['\r', '\n']))?;
    Ok(header.map(DocEntry::from))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocLibrary {
    pub entries: Vec<DocEntry>,
}

impl DocLibrary {
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut entries = Vec::new();
        for path in find_pin_tables(dir)? {
            match read_entry(&path)? {
                Some(entry) => entries.push(entry),
                None => debug!("No symbol name in {}", path.display()),
            }
        }
        debug!("Collected {} documentation entries", entries.len());
        Ok(Self { entries })
    }

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", HEADER)?;
        for entry in &self.entries {
            writeln!(out, "#")?;
            writeln!(out, "$CMP {}", entry.name)?;
            writeln!(out, "D {}", entry.description)?;
            writeln!(out, "K {}", entry.keywords)?;
            writeln!(out, "F {}", entry.datasheet)?;
            writeln!(out, "$ENDCMP")?;
        }
        writeln!(out, "#")?;
        writeln!(out, "{}", FOOTER)
    }

    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        let _ = self.write(&mut buffer);
        String::from_utf8_lossy(&buffer).to_string()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("kicube-doclib-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_empty_library() {
        assert_eq!(
            DocLibrary::default().to_text(),
            "EESchema-DOCLIB  Version 2.0\n#\n#End Doc Library\n"
        );
    }

    #[test]
    fn collects_pin_table_headers_in_path_order() {
        let dir = scratch_dir("collect");
        fs::write(
            dir.join("f446re.kipart.csv"),
            "\"F446RE;NUCLEO64\", \"CN\", \"NUCLEO64\", \"https://example.com/um64.pdf\", \"NUCLEO64-F446RE\", \"NUCLEO64-F446RE;Nucleo64 STM32F446RE\"\n\"Pin\", \"Unit\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("f030r8.kipart.csv"),
            "\"F030R8;NUCLEO64\", \"CN\", \"NUCLEO64\", \"\", \"NUCLEO64-F030R8\"\r\n",
        )
        .unwrap();
        fs::write(dir.join("notes.csv"), "\"IGNORED\", \"CN\"\n").unwrap();
        fs::write(dir.join("empty.kipart.csv"), "").unwrap();

        let doclib = DocLibrary::from_dir(&dir).unwrap();
        let expected = concat!(
            "EESchema-DOCLIB  Version 2.0\n",
            "#\n",
            "$CMP F030R8;NUCLEO64\n",
            "D ~\n",
            "K ~\n",
            "F \n",
            "$ENDCMP\n",
            "#\n",
            "$CMP F446RE;NUCLEO64\n",
            "D NUCLEO64-F446RE\n",
            "K Nucleo64 STM32F446RE\n",
            "F https://example.com/um64.pdf\n",
            "$ENDCMP\n",
            "#\n",
            "#End Doc Library\n",
        );
        assert_eq!(doclib.to_text(), expected);

        fs::remove_dir_all(&dir).unwrap();
    }
}
