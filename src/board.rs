// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/board.rs - Connector pin bindings for STM32 Nucleo boards.
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
 * # `board` Module
 *
 * Static tables mapping the connector positions of STM32 Nucleo carrier
 * boards to the chip pins routed to them.
 *
 * Connector positions are encoded as `CCPP`, where `CC` is the connector
 * number and `PP` the pin on it (so `1101` is CN11 pin 1).
 *
 * Some positions carry a different pin depending on the processor fitted
 * (see [Alternate]), and some can be bridged to one of two pins with a
 * solder bridge. The latter are written `A:B` and must be resolved with a
 * set of pin selections.
 *
 * ## Usage Example
 *
 * ```
 * use std::collections::BTreeSet;
 *
 * use kicube::board::{resolve_bindings, BoardFamily};
 *
 * let selections: BTreeSet<String> = ["PC0", "PC1"].iter().map(|s| s.to_string()).collect();
 * let bindings = resolve_bindings(BoardFamily::Nucleo64, "F030R8", &selections).unwrap();
 * assert_eq!(bindings[0].position, 701);
 * assert_eq!(bindings[0].name, "PC10");
 * ```
 */

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator between the two options of a bridged connector position.
pub const SHARED_SEPARATOR: char = ':';

/// Names chosen for bridged connector positions.
pub type PinSelections = BTreeSet<String>;

/// A processor-specific replacement for a binding's default name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alternate {
    pub name: &'static str,
    pub processors: &'static [&'static str],
}

/// One connector position of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardBinding {
    pub position: u16,
    pub name: &'static str,
    pub alternates: &'static [Alternate],
}

/// A connector position with its name resolved for one processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub position: u16,
    pub name: &'static str,
}

const fn bind(position: u16, name: &'static str) -> BoardBinding {
    BoardBinding {
        position,
        name,
        alternates: &[],
    }
}

const fn bind_alt(
    position: u16,
    name: &'static str,
    alternates: &'static [Alternate],
) -> BoardBinding {
    BoardBinding {
        position,
        name,
        alternates,
    }
}

/// A family of carrier boards sharing one connector layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardFamily {
    Nucleo144,
    Nucleo64,
}

impl BoardFamily {
    /// Families in the order a processor is looked up in.
    pub const ALL: [BoardFamily; 2] = [BoardFamily::Nucleo144, BoardFamily::Nucleo64];

    /// The footprint name used in symbol names, e.g. `NUCLEO144`.
    pub fn name(self) -> &'static str {
        match self {
            BoardFamily::Nucleo144 => "NUCLEO144",
            BoardFamily::Nucleo64 => "NUCLEO64",
        }
    }

    /// The human-readable family name, e.g. `Nucleo144`.
    pub fn title(self) -> &'static str {
        match self {
            BoardFamily::Nucleo144 => "Nucleo144",
            BoardFamily::Nucleo64 => "Nucleo64",
        }
    }

    /// The board user manual.
    pub fn datasheet_url(self) -> &'static str {
        match self {
            BoardFamily::Nucleo144 => {
                "https://www.st.com/resource/en/user_manual/dm00244518-stm32-nucleo144-boards-stmicroelectronics.pdf"
            }
            BoardFamily::Nucleo64 => {
                "https://www.st.com/resource/en/user_manual/dm00105823-stm32-nucleo-64-boards-mb1136-stmicroelectronics.pdf"
            }
        }
    }

    /// Processors (without the `STM32` prefix) this family is built with.
    pub fn processors(self) -> &'static [&'static str] {
        match self {
            BoardFamily::Nucleo144 => NUCLEO144_PROCESSORS,
            BoardFamily::Nucleo64 => NUCLEO64_PROCESSORS,
        }
    }

    /// The unresolved connector table, in declaration order.
    pub fn bindings(self) -> &'static [BoardBinding] {
        match self {
            BoardFamily::Nucleo144 => NUCLEO144_BINDINGS,
            BoardFamily::Nucleo64 => NUCLEO64_BINDINGS,
        }
    }

    pub fn supports(self, processor: &str) -> bool {
        self.processors().contains(&processor)
    }

    /// Finds the family of the `NUCLEO-<processor>` board.
    pub fn for_processor(processor: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.supports(processor))
            .ok_or_else(|| Error::UnknownBoard(format!("NUCLEO-{}", processor)))
    }
}

impl fmt::Display for BoardFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "NUCLEO144" => Ok(BoardFamily::Nucleo144),
            "NUCLEO64" => Ok(BoardFamily::Nucleo64),
            _ => Err(Error::UnknownBoard(s.to_string())),
        }
    }
}

/// Returns the connector table of `family`, checking that the board is
/// built with `processor`.
pub fn bindings_for(family: BoardFamily, processor: &str) -> Result<&'static [BoardBinding]> {
    if !family.supports(processor) {
        return Err(Error::UnknownProcessor {
            family: family.to_string(),
            processor: processor.to_string(),
        });
    }
    Ok(family.bindings())
}

/// Resolves the chip pin name at one connector position.
///
/// Every alternate listing `processor` replaces the name, so when several
/// apply the last one wins. A bridged `A:B` name then resolves to whichever
/// option is in `selections`, preferring `A`.
pub fn resolve_name(
    binding: &BoardBinding,
    processor: &str,
    selections: &PinSelections,
) -> Result<&'static str> {
    let mut name = binding.name;
    for alternate in binding.alternates {
        if alternate.processors.contains(&processor) {
            name = alternate.name;
        }
    }

    match name.split_once(SHARED_SEPARATOR) {
        None => Ok(name),
        Some((first, _)) if selections.contains(first) => Ok(first),
        Some((_, second)) if selections.contains(second) => Ok(second),
        Some((first, second)) => Err(Error::AmbiguousPinSelection {
            position: binding.position,
            first: first.to_string(),
            second: second.to_string(),
        }),
    }
}

/// Resolves every connector position of `family` for `processor`, sorted by
/// position.
pub fn resolve_bindings(
    family: BoardFamily,
    processor: &str,
    selections: &PinSelections,
) -> Result<Vec<ResolvedBinding>> {
    let mut resolved = bindings_for(family, processor)?
        .iter()
        .map(|binding| {
            Ok(ResolvedBinding {
                position: binding.position,
                name: resolve_name(binding, processor, selections)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    resolved.sort_by_key(|binding| binding.position);
    Ok(resolved)
}

// FIXME: The F303ZE board may be slightly different.
static NUCLEO144_PROCESSORS: &[&str] = &[
    "F207ZG", "F303ZE", "F412ZG", "F413ZG", "F429ZI", "F746ZG", "F767ZI", "H743ZI",
];

static NUCLEO64_PROCESSORS: &[&str] = &[
    "F030R8", "F070RB", "F334R8", "F303RE", "F091RC", "F072RB", "F103RB", "F302RB", "F401RE",
    "F411RE", "F446RE", "L053R8", "L073RZ", "L152RE", "L452RE", "L476RG", "F410RB",
];

// ZIO connectors CN11 and CN12.
#[rustfmt::skip]
static NUCLEO144_BINDINGS: &[BoardBinding] = &[
    bind(1101, "PC10"), bind(1102, "PC11"), bind(1201, "PC9"), bind(1202, "PC8"),
    bind(1103, "PC12"), bind(1104, "PD2"), bind(1203, "PB8"), bind(1204, "PC6"),
    bind(1105, "VDD"), bind(1106, "E5V"), bind(1205, "PB9"), bind(1206, "PC5"),
    bind(1107, "BOOT0"), bind(1108, "GND"), bind(1207, "AVDD"), bind(1208, "U5V"),
    bind(1109, "PF6"), bind(1110, "NC1"), bind(1209, "GND"), bind(1210, "PD8"),
    bind(1111, "PF7"), bind(1112, "IOREF"), bind(1211, "PA5"), bind(1212, "PA12"),
    bind(1113, "PA13"), bind(1114, "RESET"), bind(1213, "PA6"), bind(1214, "PA11"),
    bind(1115, "PA14"), bind(1116, "+3.3V"), bind(1215, "PA7"), bind(1216, "PB12"),
    bind(1117, "PA15"), bind(1118, "+5V"), bind(1217, "PB6"), bind(1218, "PB11"),
    bind(1119, "GND"), bind(1120, "GND"), bind(1219, "PC7"), bind(1220, "GND"),
    bind(1121, "PB7"), bind(1122, "GND"), bind(1221, "PA9"), bind(1222, "PB2"),
    bind(1123, "PC13"), bind(1124, "VIN"), bind(1223, "PA8"), bind(1224, "PB1"),
    bind(1125, "PC14"), bind(1126, "NC2"), bind(1225, "PB10"), bind(1226, "PB15"),
    bind(1127, "PC15"), bind(1128, "PA0"), bind(1227, "PB4"), bind(1228, "PB14"),
    bind(1129, "PH0"), bind(1130, "PA1"), bind(1229, "PB5"), bind(1230, "PB13"),
    bind(1131, "PH1"), bind(1132, "PA4"), bind(1231, "PB3"), bind(1232, "AGND"),
    bind(1133, "VBAT"), bind(1134, "PB0"), bind(1233, "PA10"), bind(1234, "PC4"),
    bind(1135, "PC2"), bind(1136, "PC1"), bind(1235, "PA2"), bind(1236, "PF5"),
    bind(1137, "PC3"), bind(1138, "PC0"), bind(1237, "PA3"), bind(1238, "PF4"),
    bind(1139, "PD4"), bind(1140, "PD3"), bind(1239, "GND"), bind(1240, "PE8"),
    bind(1141, "PD5"), bind(1142, "PG2"), bind(1241, "PD13"), bind(1242, "PF10"),
    bind(1143, "PD6"), bind(1144, "PG3"), bind(1243, "PD12"), bind(1244, "PE7"),
    bind(1145, "PD7"), bind(1146, "PE2"), bind(1245, "PD11"), bind(1246, "PD14"),
    bind(1147, "PE3"), bind(1148, "PE4"), bind(1247, "PE10"), bind(1248, "PD15"),
    bind(1149, "GND"), bind(1150, "PE5"), bind(1249, "PE12"), bind(1250, "PF14"),
    bind(1151, "PF1"), bind(1152, "PF2"), bind(1251, "PE14"), bind(1252, "PE9"),
    bind(1153, "PF0"), bind(1154, "PF8"), bind(1253, "PE15"), bind(1254, "GND"),
    bind(1155, "PD1"), bind(1156, "PF9"), bind(1255, "PE13"), bind(1256, "PE11"),
    bind(1157, "PD0"), bind(1158, "PG1"), bind(1257, "PF13"), bind(1258, "PF3"),
    bind(1159, "PG0"), bind(1160, "GND"), bind(1259, "PF12"), bind(1260, "PF15"),
    bind(1161, "PE1"), bind(1162, "PE6"), bind(1261, "PG14"), bind(1262, "PF11"),
    bind(1163, "PG9"), bind(1164, "PG15"), bind(1263, "GND"), bind(1264, "PE0"),
    bind(1165, "PG12"), bind(1166, "PG10"), bind(1265, "PD10"), bind(1266, "PG8"),
    bind(1167, "NC3"), bind(1168, "PG13"), bind(1267, "PG7"), bind(1268, "PG5"),
    bind(1169, "PD9"), bind(1170, "PG11"), bind(1269, "PG4"), bind(1270, "PG6"),
];

// Morpho connectors CN7 and CN10.
#[rustfmt::skip]
static NUCLEO64_BINDINGS: &[BoardBinding] = &[
    bind(701, "PC10"),
    bind(703, "PC12"),
    bind(705, "VDD"),
    bind_alt(707, "BOOT0", &[Alternate { name: "PH3:BT0", processors: &["L452RE"] }]),
    bind_alt(709, "NC1", &[Alternate { name: "PF6", processors: &["F030R8"] }]),
    bind_alt(711, "NC2", &[Alternate { name: "PF7", processors: &["F030R8"] }]),
    bind(713, "PA13"),
    bind(715, "PA14"),
    bind(717, "PA15"),
    bind(719, "GND"),
    bind(721, "PB7"),
    bind(723, "PC13"),
    bind(725, "PC14"),
    bind(727, "PC15"),
    bind_alt(
        729,
        "PF0",
        &[
            Alternate { name: "PD0", processors: &["F103RB"] },
            Alternate {
                name: "PH0",
                processors: &["F446RE", "L152RE", "L452RE", "F476RG", "F410RB"],
            },
        ],
    ),
    bind_alt(
        731,
        "PF1",
        &[
            Alternate { name: "PD1", processors: &["F103RB"] },
            Alternate {
                name: "PH1",
                processors: &["F446RE", "L152RE", "L452RE", "F476RG", "F410RB"],
            },
        ],
    ),
    bind_alt(
        733,
        "VBAT",
        &[
            Alternate { name: "VDD", processors: &["F070RB"] },
            Alternate { name: "VLCD", processors: &["L152RE"] },
        ],
    ),
    bind(735, "PC2"),
    bind(737, "PC3"),
    bind(702, "PC11"),
    bind(704, "PD2"),
    bind(706, "E5V"),
    bind(708, "GND"),
    bind(710, "NC3"),
    bind(712, "IOREF"),
    bind(714, "RESET"),
    bind(716, "+3.3V"),
    bind(718, "+5V"),
    bind(720, "GND"),
    bind(722, "GND"),
    bind(724, "VIN"),
    bind(726, "NC4"),
    bind(728, "PA0"),
    bind(730, "PA1"),
    bind(732, "PA4"),
    bind(734, "PB0"),
    bind(736, "PC1:PB9"),
    bind(738, "PC0:PB8"),
    bind(1001, "PC9"),
    bind(1003, "PB8"),
    bind(1005, "PB9"),
    bind(1007, "AVDD"),
    bind(1009, "GND"),
    bind_alt(1011, "PA5", &[Alternate { name: "PB13", processors: &["F302R8"] }]),
    bind_alt(1013, "PA6", &[Alternate { name: "PB14", processors: &["F302R8"] }]),
    bind_alt(1015, "PA7", &[Alternate { name: "PB15", processors: &["F302R8"] }]),
    bind(1017, "PB6"),
    bind(1019, "PC7"),
    bind(1021, "PA9"),
    bind(1023, "PA8"),
    bind(1025, "PB10"),
    bind(1027, "PB4"),
    bind(1029, "PB5"),
    bind(1031, "PB3"),
    bind(1033, "PA10"),
    bind(1035, "PA2"),
    bind(1037, "PA3"),
    bind(1002, "PC8"),
    bind(1004, "PC6"),
    bind(1006, "PC5"),
    bind(1008, "U5V"),
    bind(1010, "NC5"),
    bind(1012, "PA12"),
    bind(1014, "PA11"),
    bind(1016, "PB12"),
    bind(1018, "PB11"),
    bind(1020, "GND"),
    bind(1022, "PB2"),
    bind(1024, "PB1"),
    bind_alt(1026, "PB15", &[Alternate { name: "PA7", processors: &["F302R8"] }]),
    bind_alt(1028, "PB14", &[Alternate { name: "PA6", processors: &["F302R8"] }]),
    bind_alt(1030, "PB13", &[Alternate { name: "PA5", processors: &["F302R8"] }]),
    bind(1032, "AGND"),
    bind(1034, "PC4"),
    bind_alt(1036, "NC6", &[Alternate { name: "PF5", processors: &["F030R8"] }]),
    bind_alt(1038, "NC7", &[Alternate { name: "PF4", processors: &["F030R8"] }]),
];
