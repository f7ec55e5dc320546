// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/assembler.rs - Intermediate pin table assembly for kipart.
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
 * # `assembler` Module
 *
 * This module joins classified chip pins with the connector bindings of a
 * carrier board and produces the intermediate pin table that `kipart` turns
 * into a schematic symbol.
 *
 * The table looks like this:
 *
 * ```text
 * "F030R8;NUCLEO64", "CN", "NUCLEO64", "https://...", "NUCLEO64-F030R8", "NUCLEO64-F030R8;Nucleo64 STM32F030R8"
 * "Pin", "Unit", "Type", "Name", "Style", "Side"
 * "1035", "PA", "output", "PA2(USART2_TX)", "line", "right"
 * ...
 * ,,,,,,
 *
 * ```
 */

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use csv;

use crate::board::ResolvedBinding;
use crate::classifier::{ClassifiedPin, ElectricalType, Side, Style, Unit, classify};
use crate::error::{Result, Warning};
use crate::pin::{PinKind, PinRecord};

/// Board binding names that are carrier-board supply or ground rails.
pub const POWER_BINDING_NAMES: &[&str] = &[
    "GND", "AGND", "E5V", "U5V", "+3.3V", "+5V", "AVDD", "VIN", "IOREF",
];

/// Board binding names wired to the reset button.
pub const RESET_BINDING_NAMES: &[&str] = &["RESET"];

/// Prefix of unconnected board positions (`NC1`, `NC2`, ...).
pub const NO_CONNECT_PREFIX: &str = "NC";

/// Classified chip pins keyed by their trimmed name.
pub type ChipPinTable = HashMap<String, ClassifiedPin>;

/// Builds a [ChipPinTable]. A later pin with the same trimmed name replaces
/// an earlier one.
pub fn chip_pin_table<I: IntoIterator<Item = ClassifiedPin>>(pins: I) -> ChipPinTable {
    pins.into_iter()
        .map(|pin| (pin.trimmed_name().to_string(), pin))
        .collect()
}

/// One row of the intermediate pin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateRow {
    pub position: String,
    pub unit: Unit,
    pub electrical_type: ElectricalType,
    pub display_name: String,
    pub style: Style,
    pub side: Side,
}

impl From<&ClassifiedPin> for IntermediateRow {
    fn from(pin: &ClassifiedPin) -> Self {
        Self {
            position: pin.position.clone(),
            unit: pin.unit.clone(),
            electrical_type: pin.electrical_type,
            display_name: pin.display_name.clone(),
            style: pin.style,
            side: pin.side,
        }
    }
}

/// The rows of an assembled symbol and the warnings raised on the way.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub rows: Vec<IntermediateRow>,
    pub warnings: Vec<Warning>,
}

/// Stable-sorts pins by `(unit, unit_sort)` and turns them into rows.
fn sorted_rows(mut pins: Vec<ClassifiedPin>) -> Vec<IntermediateRow> {
    pins.sort_by(|a, b| (&a.unit, &a.unit_sort).cmp(&(&b.unit, &b.unit_sort)));
    pins.iter().map(IntermediateRow::from).collect()
}

fn synthesize(
    position: &str,
    name: &str,
    kind: PinKind,
    warnings: &mut Vec<Warning>,
) -> ClassifiedPin {
    let classification = classify(&PinRecord::new(position, name, kind, "", ""));
    warnings.extend(classification.warnings);
    classification.pin
}

/// Lays out a chip mounted on a carrier board.
///
/// Supply, reset and no-connect positions get synthetic pins. Every other
/// position takes the chip pin of the same name, moved to the connector
/// position. Names with no chip pin are reported and left out.
pub fn assemble(chip_pins: &ChipPinTable, bindings: &[ResolvedBinding]) -> Assembly {
    let mut warnings = Vec::new();
    let mut pins = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let position = binding.position.to_string();
        let name = binding.name;

        let pin = if POWER_BINDING_NAMES.contains(&name) {
            synthesize(&position, name, PinKind::Power, &mut warnings)
        } else if RESET_BINDING_NAMES.contains(&name) {
            synthesize(&position, name, PinKind::Reset, &mut warnings)
        } else if name.starts_with(NO_CONNECT_PREFIX) {
            synthesize(&position, name, PinKind::Nc, &mut warnings)
        } else if let Some(chip_pin) = chip_pins.get(name) {
            let mut pin = chip_pin.clone();
            pin.relocate(&position);
            pin
        } else {
            warnings.push(Warning::UnboundName {
                position: binding.position,
                name: name.to_string(),
            });
            continue;
        };

        pins.push(pin);
    }

    Assembly {
        rows: sorted_rows(pins),
        warnings,
    }
}

/// Lays out a bare chip, keeping every pin at its package position.
pub fn assemble_chip(pins: &[ClassifiedPin]) -> Vec<IntermediateRow> {
    sorted_rows(pins.to_vec())
}

/// The first line of the intermediate pin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolHeader {
    pub symbol_name: String,
    pub ref_prefix: String,
    pub footprint: String,
    pub datasheet_url: String,
    pub manufacturer_number: String,
    pub short_description: String,
    pub long_description: String,
}

impl SymbolHeader {
    /// Parses a header line.
    ///
    /// Fields are trimmed of spaces and quotes. Missing fields are left
    /// empty, except the descriptions, which default to `~`. Returns `None`
    /// if the line has no symbol name.
    pub fn from_line(line: &str) -> Result<Option<Self>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(line.as_bytes());

        let record = match reader.byte_records().next() {
            Some(result) => result?,
            None => return Ok(None),
        };
        let field = |index: usize| {
            record
                .get(index)
                .map(|value| {
                    String::from_utf8_lossy(value)
                        .trim_matches(|c| c == ' ' || c == '"')
                        .to_string()
                })
                .unwrap_or_default()
        };

        let symbol_name = field(0);
        if symbol_name.is_empty() {
            return Ok(None);
        }

        let descriptions = field(5);
        let mut descriptions = descriptions.split(';').map(str::trim);
        let mut description = || match descriptions.next() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => "~".to_string(),
        };
        let short_description = description();
        let long_description = description();

        Ok(Some(Self {
            symbol_name,
            ref_prefix: field(1),
            footprint: field(2),
            datasheet_url: field(3),
            manufacturer_number: field(4),
            short_description,
            long_description,
        }))
    }
}

fn write_fields<W: Write>(out: &mut W, fields: [&str; 6]) -> io::Result<()> {
    let quoted: Vec<String> = fields.iter().map(|field| format!("\"{}\"", field)).collect();
    writeln!(out, "{}", quoted.join(", "))
}

/// The complete intermediate pin table for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateTable {
    pub header: SymbolHeader,
    pub rows: Vec<IntermediateRow>,
}

impl IntermediateTable {
    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let header = &self.header;
        let description = format!("{};{}", header.short_description, header.long_description);
        write_fields(
            out,
            [
                &header.symbol_name,
                &header.ref_prefix,
                &header.footprint,
                &header.datasheet_url,
                &header.manufacturer_number,
                &description,
            ],
        )?;
        write_fields(out, ["Pin", "Unit", "Type", "Name", "Style", "Side"])?;

        for row in &self.rows {
            write_fields(
                out,
                [
                    &row.position,
                    &row.unit.to_string(),
                    &row.electrical_type.to_string(),
                    &row.display_name,
                    &row.style.to_string(),
                    &row.side.to_string(),
                ],
            )?;
        }

        // kipart needs an empty row and a blank line to close the table.
        writeln!(out, ",,,,,,")?;
        writeln!(out)
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
    use crate::classifier::UnitSort;
    use rstest::*;

    fn chip(rows: &[&str]) -> ChipPinTable {
        chip_pin_table(
            rows.iter()
                .map(|row| classify(&PinRecord::from_row(row).unwrap()).pin),
        )
    }

    fn binding(position: u16, name: &'static str) -> ResolvedBinding {
        ResolvedBinding { position, name }
    }

    #[test]
    fn relocates_chip_pins_to_connector_positions() {
        let pins = chip(&[r#""16","PA2","I/O","USART2_TX","""#]);
        let assembly = assemble(&pins, &[binding(1035, "PA2")]);
        assert_eq!(assembly.rows.len(), 1);
        assert_eq!(assembly.rows[0].position, "1035");
        assert_eq!(assembly.rows[0].display_name, "PA2(USART2_TX)");
        assert_eq!(pins["PA2"].position, "16");
        assert!(assembly.warnings.is_empty());
    }

    #[rstest]
    #[case("GND", "ZPWR", ElectricalType::PowerIn, "GND(PI)")]
    #[case("+3.3V", "ZPWR", ElectricalType::PowerOut, "+3.3V(PO)")]
    #[case("E5V", "ZPWR", ElectricalType::PowerIn, "E5V(PI)")]
    #[case("RESET", "YMISC", ElectricalType::Input, "RESET")]
    #[case("NC4", "YMISC", ElectricalType::NoConnect, "NC4")]
    fn synthesizes_board_pins(
        #[case] name: &'static str,
        #[case] unit: &str,
        #[case] electrical_type: ElectricalType,
        #[case] display_name: &str,
    ) {
        let assembly = assemble(&ChipPinTable::new(), &[binding(714, name)]);
        let row = &assembly.rows[0];
        assert_eq!(row.position, "714");
        assert_eq!(row.unit.to_string(), unit);
        assert_eq!(row.electrical_type, electrical_type);
        assert_eq!(row.display_name, display_name);
        assert!(assembly.warnings.is_empty());
    }

    #[test]
    fn drops_unbound_names_with_warning() {
        let pins = chip(&[r#""2","PC13","I/O","","""#]);
        let assembly = assemble(&pins, &[binding(733, "VBAT"), binding(723, "PC13")]);
        assert_eq!(assembly.rows.len(), 1);
        assert_eq!(
            assembly.warnings,
            vec![Warning::UnboundName {
                position: 733,
                name: "VBAT".to_string()
            }]
        );
    }

    #[test]
    fn same_chip_pin_can_appear_twice() {
        let pins = chip(&[r#""61","PB8","I/O","","""#]);
        let assembly = assemble(&pins, &[binding(738, "PB8"), binding(1003, "PB8")]);
        let positions: Vec<&str> = assembly.rows.iter().map(|r| r.position.as_str()).collect();
        assert_eq!(positions, vec!["738", "1003"]);
    }

    #[test]
    fn rows_are_sorted_by_unit_then_sort_key() {
        let pins = chip(&[
            r#""10","PA10","I/O","","""#,
            r#""2","PA2","I/O","","""#,
            r#""20","PB0","I/O","","""#,
        ]);
        let bindings = [
            binding(1001, "GND"),
            binding(1002, "PB0"),
            binding(1003, "PA10"),
            binding(1004, "+5V"),
            binding(1005, "PA2"),
            binding(1006, "NC1"),
            binding(1007, "AGND"),
        ];
        let assembly = assemble(&pins, &bindings);
        let names: Vec<&str> = assembly
            .rows
            .iter()
            .map(|r| r.display_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["PA2", "PA10", "PB0", "NC1", "GND(PI)", "AGND(PI)", "+5V(PO)"]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let pins: Vec<ClassifiedPin> = ["PA1", "PA1", "PA1"]
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut pin =
                    classify(&PinRecord::new("5", name, PinKind::Io, "", "")).pin;
                pin.display_name = format!("{}#{}", name, index);
                pin
            })
            .collect();
        let rows = assemble_chip(&pins);
        let names: Vec<&str> = rows.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["PA1#0", "PA1#1", "PA1#2"]);
    }

    #[test]
    fn bare_chip_keeps_package_positions() {
        let pins: Vec<ClassifiedPin> = [
            r#""64","VDD","Power","","""#,
            r#""63","VSS","Power","","""#,
            r#""7","NRST","Reset","","""#,
            r#""14","PA0","I/O","","""#,
        ]
        .iter()
        .map(|row| classify(&PinRecord::from_row(row).unwrap()).pin)
        .collect();
        let rows = assemble_chip(&pins);
        let positions: Vec<&str> = rows.iter().map(|r| r.position.as_str()).collect();
        assert_eq!(positions, vec!["14", "7", "63", "64"]);
        assert!(matches!(pins[0].unit_sort, UnitSort::Tagged(..)));
    }

    fn sample_header() -> SymbolHeader {
        SymbolHeader {
            symbol_name: "F030R8;NUCLEO64".to_string(),
            ref_prefix: "CN".to_string(),
            footprint: "NUCLEO64".to_string(),
            datasheet_url: "https://example.com/um.pdf".to_string(),
            manufacturer_number: "NUCLEO64-F030R8".to_string(),
            short_description: "NUCLEO64-F030R8".to_string(),
            long_description: "Nucleo64 STM32F030R8".to_string(),
        }
    }

    #[test]
    fn writes_intermediate_table() {
        let table = IntermediateTable {
            header: sample_header(),
            rows: vec![IntermediateRow {
                position: "1035".to_string(),
                unit: Unit::Port("PA".to_string()),
                electrical_type: ElectricalType::Output,
                display_name: "PA2(USART2_TX)".to_string(),
                style: Style::Line,
                side: Side::Right,
            }],
        };
        let expected = concat!(
            "\"F030R8;NUCLEO64\", \"CN\", \"NUCLEO64\", \"https://example.com/um.pdf\", ",
            "\"NUCLEO64-F030R8\", \"NUCLEO64-F030R8;Nucleo64 STM32F030R8\"\n",
            "\"Pin\", \"Unit\", \"Type\", \"Name\", \"Style\", \"Side\"\n",
            "\"1035\", \"PA\", \"output\", \"PA2(USART2_TX)\", \"line\", \"right\"\n",
            ",,,,,,\n",
            "\n",
        );
        assert_eq!(table.to_text(), expected);
    }

    #[test]
    fn reads_back_written_header() {
        let table = IntermediateTable {
            header: sample_header(),
            rows: vec![],
        };
        let text = table.to_text();
        let first_line = text.lines().next().unwrap();
        assert_eq!(
            SymbolHeader::from_line(first_line).unwrap(),
            Some(sample_header())
        );
    }

    #[rstest]
    #[case("", None)]
    #[case(r#""", "CN""#, None)]
    #[case(r#""X", "U", "QFP""#, Some(("X", "~", "~")))]
    #[case(r#""X", "U", "QFP", "", "", "Short only""#, Some(("X", "Short only", "~")))]
    fn parses_partial_headers(
        #[case] line: &str,
        #[case] expected: Option<(&str, &str, &str)>,
    ) {
        let header = SymbolHeader::from_line(line).unwrap();
        let actual = header.as_ref().map(|h| {
            (
                h.symbol_name.as_str(),
                h.short_description.as_str(),
                h.long_description.as_str(),
            )
        });
        assert_eq!(actual, expected);
    }
}
