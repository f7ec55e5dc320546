// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/project.rs - STM32CubeMX project files and the conversion driver.
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
 * # `project` Module
 *
 * This module reads the few settings kicube needs from an STM32CubeMX
 * project (`.ioc`) file and drives a complete conversion of a pin export
 * into an intermediate pin table.
 *
 * ## Usage Example
 *
 * ```no_run
 * use kicube::board::PinSelections;
 * use kicube::pin::read_pin_table_file;
 * use kicube::project::Project;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let project = Project::from_path("f030r8.ioc")?;
 *     let pins = read_pin_table_file("f030r8.csv")?;
 *
 *     let selections: PinSelections = ["PC0", "PC1"].iter().map(|s| s.to_string()).collect();
 *     let conversion = project.convert(&pins, &selections)?;
 *     conversion.table.save("f030r8.kipart.csv")?;
 *
 *     Ok(())
 * }
 * ```
 */

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::assembler::{
    IntermediateTable, SymbolHeader, assemble, assemble_chip, chip_pin_table,
};
use crate::board::{BoardFamily, PinSelections, resolve_bindings};
use crate::classifier::{ClassifiedPin, classify};
use crate::error::{Error, Result, Warning};
use crate::pin::PinRecord;

const BOARD_PREFIX: &str = "NUCLEO-";
const MCU_PREFIX: &str = "STM32";

/// The settings read from a `.ioc` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    /// The upper-cased file stem, e.g. `F030R8` for `f030r8.ioc`.
    pub base_name: String,
    /// `Mcu.Name`, without a trailing `x` wildcard.
    pub mcu_name: String,
    /// `board`, empty for a bare chip.
    pub board_name: String,
    /// `Mcu.Package`.
    pub package: String,
}

/// What the symbol is drawn for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A chip on a Nucleo carrier board, drawn with the board's connectors.
    Board {
        family: BoardFamily,
        processor: String,
    },
    /// A bare chip, drawn with its package pins.
    Chip { processor: String, package: String },
}

impl Target {
    pub fn footprint(&self) -> String {
        match self {
            Target::Board { family, .. } => family.name().to_string(),
            Target::Chip { package, .. } => package.to_uppercase(),
        }
    }

    pub fn ref_prefix(&self) -> &'static str {
        match self {
            Target::Board { .. } => "CN",
            Target::Chip { .. } => "U",
        }
    }

    pub fn datasheet_url(&self) -> &'static str {
        match self {
            Target::Board { family, .. } => family.datasheet_url(),
            Target::Chip { .. } => "",
        }
    }

    fn title(&self) -> String {
        match self {
            Target::Board { family, .. } => family.title().to_string(),
            Target::Chip { package, .. } => package.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Board { family, processor } => write!(f, "{} board with {}", family, processor),
            Target::Chip { processor, package } => write!(f, "{} in {}", processor, package),
        }
    }
}

/// The result of [Project::convert].
#[derive(Debug, Clone)]
pub struct Conversion {
    pub target: Target,
    pub table: IntermediateTable,
    pub warnings: Vec<Warning>,
}

impl Project {
    /// Reads a `.ioc` file. The base name is taken from the file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&base_name, &text))
    }

    /// Extracts the settings from `.ioc` text. Unknown keys are ignored.
    pub fn parse(base_name: &str, text: &str) -> Self {
        let mut project = Self {
            base_name: base_name.to_uppercase(),
            ..Self::default()
        };

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(name) = line.strip_prefix("Mcu.Name=") {
                project.mcu_name = name.strip_suffix('x').unwrap_or(name).to_string();
            } else if let Some(board) = line.strip_prefix("board=") {
                project.board_name = board.to_string();
            } else if let Some(package) = line.strip_prefix("Mcu.Package=") {
                project.package = package.to_string();
            }
        }

        project
    }

    /// Works out what to draw.
    ///
    /// # Errors
    ///
    /// [Error::UnknownBoard] if the board is not a supported Nucleo board,
    /// or if there is no board and the MCU is not an STM32.
    pub fn target(&self) -> Result<Target> {
        if !self.board_name.is_empty() {
            let processor = self
                .board_name
                .strip_prefix(BOARD_PREFIX)
                .ok_or_else(|| Error::UnknownBoard(self.board_name.clone()))?;
            let family = BoardFamily::for_processor(processor)?;
            return Ok(Target::Board {
                family,
                processor: processor.to_string(),
            });
        }

        match self.mcu_name.strip_prefix(MCU_PREFIX) {
            Some(processor) if !processor.is_empty() => Ok(Target::Chip {
                processor: processor.to_string(),
                package: self.package.clone(),
            }),
            _ => Err(Error::UnknownBoard(self.mcu_name.clone())),
        }
    }

    /// The first line of the intermediate pin table for `target`.
    pub fn header(&self, target: &Target) -> SymbolHeader {
        let base = &self.base_name;
        let footprint = target.footprint();
        SymbolHeader {
            symbol_name: format!("{};{}", base, footprint),
            ref_prefix: target.ref_prefix().to_string(),
            datasheet_url: target.datasheet_url().to_string(),
            manufacturer_number: format!("{}-{}", footprint, base),
            short_description: format!("{}-{}", footprint, base),
            long_description: format!("{} {}{}", target.title(), MCU_PREFIX, base),
            footprint,
        }
    }

    /// Converts a pin export into an intermediate pin table.
    ///
    /// Warnings are logged and returned with the table. An error means
    /// nothing should be written.
    pub fn convert(&self, pins: &[PinRecord], selections: &PinSelections) -> Result<Conversion> {
        let target = self.target()?;
        debug!("Converting {} pins for {}", pins.len(), target);

        let mut warnings = Vec::new();
        let classified: Vec<ClassifiedPin> = pins
            .iter()
            .map(|record| {
                let classification = classify(record);
                warnings.extend(classification.warnings);
                classification.pin
            })
            .collect();

        let rows = match &target {
            Target::Board { family, processor } => {
                let bindings = resolve_bindings(*family, processor, selections)?;
                debug!("Resolved {} connector positions", bindings.len());
                let assembly = assemble(&chip_pin_table(classified), &bindings);
                warnings.extend(assembly.warnings);
                assembly.rows
            }
            Target::Chip { .. } => assemble_chip(&classified),
        };
        debug!("Assembled {} rows", rows.len());

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(Conversion {
            table: IntermediateTable {
                header: self.header(&target),
                rows,
            },
            target,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::read_pin_table;
    use rstest::*;

    macro_rules! test_data {
        ($fname:expr) => {
            std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test/",
                $fname
            ))
            .unwrap()
        };
    }

    fn default_selections() -> PinSelections {
        ["PC0", "PC1"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_ioc_settings() {
        let project = Project::parse("f030r8", &test_data!("f030r8.ioc"));
        assert_eq!(
            project,
            Project {
                base_name: "F030R8".to_string(),
                mcu_name: "STM32F030R8T".to_string(),
                board_name: "NUCLEO-F030R8".to_string(),
                package: "LQFP64".to_string(),
            }
        );
    }

    #[test]
    fn reads_base_name_from_path() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/test/f030r8.ioc");
        let project = Project::from_path(path).unwrap();
        assert_eq!(project.base_name, "F030R8");
    }

    #[rstest]
    #[case("NUCLEO-F030R8", "STM32F030R8T", Target::Board { family: BoardFamily::Nucleo64, processor: "F030R8".to_string() })]
    #[case("NUCLEO-F767ZI", "STM32F767ZIT", Target::Board { family: BoardFamily::Nucleo144, processor: "F767ZI".to_string() })]
    #[case("", "STM32F030R8T", Target::Chip { processor: "F030R8T".to_string(), package: "LQFP64".to_string() })]
    fn selects_target(#[case] board_name: &str, #[case] mcu_name: &str, #[case] expected: Target) {
        let project = Project {
            base_name: "TEST".to_string(),
            mcu_name: mcu_name.to_string(),
            board_name: board_name.to_string(),
            package: "LQFP64".to_string(),
        };
        assert_eq!(project.target().unwrap(), expected);
    }

    #[rstest]
    #[case("DISCO-F030R8", "STM32F030R8T")]
    #[case("NUCLEO-F999ZZ", "STM32F999ZZT")]
    #[case("", "GD32F103")]
    fn rejects_unknown_targets(#[case] board_name: &str, #[case] mcu_name: &str) {
        let project = Project {
            mcu_name: mcu_name.to_string(),
            board_name: board_name.to_string(),
            ..Project::default()
        };
        assert!(matches!(project.target(), Err(Error::UnknownBoard(_))));
    }

    #[test]
    fn builds_board_header() {
        let project = Project::parse("f030r8", &test_data!("f030r8.ioc"));
        let header = project.header(&project.target().unwrap());
        assert_eq!(header.symbol_name, "F030R8;NUCLEO64");
        assert_eq!(header.ref_prefix, "CN");
        assert_eq!(header.footprint, "NUCLEO64");
        assert_eq!(header.datasheet_url, BoardFamily::Nucleo64.datasheet_url());
        assert_eq!(header.manufacturer_number, "NUCLEO64-F030R8");
        assert_eq!(header.short_description, "NUCLEO64-F030R8");
        assert_eq!(header.long_description, "Nucleo64 STM32F030R8");
    }

    #[test]
    fn converts_board_project() {
        let project = Project::parse("f030r8", &test_data!("f030r8.ioc"));
        let pins = read_pin_table(test_data!("nucleo-f030r8.csv").as_bytes()).unwrap();
        let conversion = project.convert(&pins, &default_selections()).unwrap();

        let rows = &conversion.table.rows;
        let tx = rows
            .iter()
            .find(|row| row.display_name == "PA2(USART2_TX)")
            .unwrap();
        assert_eq!(tx.position, "1035");
        assert!(rows.iter().all(|row| row.position.len() == 3 || row.position.len() == 4));
        assert!(conversion.warnings.contains(&Warning::UnboundName {
            position: 733,
            name: "VBAT".to_string(),
        }));
    }

    #[test]
    fn converts_bare_chip_project() {
        let project = Project::parse("bare", &test_data!("bare.ioc"));
        let pins = read_pin_table(test_data!("nucleo-f030r8.csv").as_bytes()).unwrap();
        let conversion = project.convert(&pins, &PinSelections::new()).unwrap();

        assert_eq!(conversion.table.header.symbol_name, "BARE;LQFP64");
        assert_eq!(conversion.table.header.ref_prefix, "U");
        assert_eq!(conversion.table.rows.len(), pins.len());
        let nrst = conversion
            .table
            .rows
            .iter()
            .find(|row| row.display_name == "NRST")
            .unwrap();
        assert_eq!(nrst.position, "7");
    }
}
