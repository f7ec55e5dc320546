// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/pin.rs - Pin record parser for STM32CubeMX pin exports.
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
 * # `pin` Module
 *
 * This module parses the pin table exported by STM32CubeMX ("Pinout" ->
 * "Export pinout with Alt. Functions") into [PinRecord]s.
 *
 * Each row has exactly five fields:
 *
 * ```text
 * "Position","Name","Type","Signal","Label"
 * "B12","PB3","I/O","GPIO_Output","LD2[Green]"
 * ```
 *
 * ## Usage Example
 *
 * ```no_run
 * use kicube::pin::read_pin_table_file;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let pins = read_pin_table_file("f767zi.csv")?;
 *     for pin in &pins {
 *         println!("{} {} ({})", pin.position, pin.name, pin.trimmed_name());
 *     }
 *     Ok(())
 * }
 * ```
 */

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv;

use crate::error::{Error, Result};

/// Number of fields in every pin table row.
pub const FIELD_COUNT: usize = 5;

/// The electrical kind CubeMX reports for a pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PinKind {
    Io,
    Input,
    Output,
    Power,
    Reset,
    Boot,
    Nc,
    /// Any kind string this library does not know about.
    Other(String),
}

impl PinKind {
    /// Returns `true` for kinds that are routed through the signal rules.
    pub fn is_io(&self) -> bool {
        matches!(self, PinKind::Io | PinKind::Input | PinKind::Output)
    }
}

impl From<&str> for PinKind {
    fn from(kind: &str) -> Self {
        match kind {
            "I/O" => PinKind::Io,
            "Input" => PinKind::Input,
            "Output" => PinKind::Output,
            "Power" => PinKind::Power,
            "Reset" => PinKind::Reset,
            "Boot" => PinKind::Boot,
            "NC" => PinKind::Nc,
            other => PinKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            PinKind::Io => "I/O",
            PinKind::Input => "Input",
            PinKind::Output => "Output",
            PinKind::Power => "Power",
            PinKind::Reset => "Reset",
            PinKind::Boot => "Boot",
            PinKind::Nc => "NC",
            PinKind::Other(kind) => kind,
        };
        f.write_str(kind)
    }
}

/// Sort key for a physical pin position.
///
/// Package pins are either plain numbers (`"14"`) or ball-grid coordinates
/// (`"B12"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionKey {
    Numeric(u32),
    Grid(char, u32),
    /// A position in neither form, kept verbatim so it still sorts.
    Text(String),
}

impl PositionKey {
    /// Parses `position`, returning [PositionKey::Text] if it is neither
    /// numeric nor a ball-grid coordinate.
    pub fn parse(position: &str) -> Self {
        if let Ok(number) = position.parse::<u32>() {
            return PositionKey::Numeric(number);
        }

        let mut chars = position.chars();
        if let Some(row) = chars.next() {
            let column = chars.as_str();
            if row.is_ascii_alphabetic() && column.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(column) = column.parse::<u32>() {
                    return PositionKey::Grid(row, column);
                }
            }
        }

        PositionKey::Text(position.to_string())
    }

    /// Returns `true` unless the position fell back to [PositionKey::Text].
    pub fn is_recognized(&self) -> bool {
        !matches!(self, PositionKey::Text(_))
    }
}

/// One row of a CubeMX pin export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRecord {
    /// The physical package position (e.g. `"B12"`, `"14"`).
    pub position: String,
    /// The vendor logical name (e.g. `"PB3"`, `"VSS"`, `"PC14-OSC32_IN"`).
    pub name: String,
    /// The electrical kind.
    pub kind: PinKind,
    /// The internal peripheral signal (e.g. `"UART7_RX"`), possibly empty.
    pub signal: String,
    /// The user label, with a leading `_` already rewritten to `~`.
    pub label: String,
}

impl PinRecord {
    /// Builds a record from its five fields.
    ///
    /// CubeMX user labels that start with `_` are active low; the `_` is
    /// replaced with the KiCad negation marker `~`.
    pub fn new(position: &str, name: &str, kind: PinKind, signal: &str, label: &str) -> Self {
        let label = match label.strip_prefix('_') {
            Some(rest) => format!("~{}", rest),
            None => label.to_string(),
        };

        Self {
            position: position.to_string(),
            name: name.to_string(),
            kind,
            signal: signal.to_string(),
            label,
        }
    }

    /// Parses a single pin table row.
    pub fn from_row(row: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(row.as_bytes());

        match reader.byte_records().next() {
            Some(result) => Self::from_byte_record(&result?),
            None => Err(Error::MalformedRow { line: 1, found: 0 }),
        }
    }

    fn from_byte_record(record: &csv::ByteRecord) -> Result<Self> {
        if record.len() != FIELD_COUNT {
            return Err(Error::MalformedRow {
                line: record.position().map_or(0, |p| p.line()),
                found: record.len(),
            });
        }

        let field = |index: usize| String::from_utf8_lossy(&record[index]).to_string();
        Ok(Self::new(
            &field(0),
            &field(1),
            PinKind::from(field(2).as_str()),
            &field(3),
            &field(4),
        ))
    }

    /// The name with any alternate-function suffix removed.
    ///
    /// Truncates at the first `/` or `-`, so `"PA9/OSC"` becomes `"PA9"` and
    /// `"PC14-OSC32_IN"` becomes `"PC14"`.
    pub fn trimmed_name(&self) -> &str {
        match self.name.find(['/', '-']) {
            Some(index) => &self.name[..index],
            None => &self.name,
        }
    }

    /// The sort key for [PinRecord::position].
    pub fn position_key(&self) -> PositionKey {
        PositionKey::parse(&self.position)
    }
}

impl fmt::Display for PinRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4} {:6} {:15} {:20} {}",
            self.position,
            self.name,
            self.kind.to_string(),
            self.signal,
            self.label
        )
    }
}

/// Reads a whole pin table, skipping its header line.
pub fn read_pin_table<R: Read>(reader: R) -> Result<Vec<PinRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut pins = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        pins.push(PinRecord::from_byte_record(&record)?);
    }

    Ok(pins)
}

/// Reads a pin table from a file.
pub fn read_pin_table_file<P: AsRef<Path>>(path: P) -> Result<Vec<PinRecord>> {
    let file = File::open(path)?;
    read_pin_table(BufReader::new(file))
}
