// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/classifier.rs - Schematic pin classification for STM32 pin records.
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
 * # `classifier` Module
 *
 * This module derives the schematic attributes of a pin (the symbol unit it
 * is drawn in, its KiCad electrical type, line style, side and decorated
 * name) from a parsed [PinRecord].
 *
 * Classification is a pure function. Anything it does not recognize is
 * reported as a [Warning] next to the result and mapped to a fallback value,
 * so a conversion of a large pin table always runs to completion.
 *
 * ## Usage Example
 *
 * ```
 * use kicube::classifier::{classify, ElectricalType};
 * use kicube::pin::PinRecord;
 *
 * let record = PinRecord::from_row(r#""B12","PB3","I/O","GPIO_Output","LD2[Green]""#).unwrap();
 * let classification = classify(&record);
 * assert_eq!(classification.pin.unit.to_string(), "PB");
 * assert_eq!(classification.pin.electrical_type, ElectricalType::Output);
 * assert_eq!(classification.pin.display_name, "PB3(NUCELO_GREEN_LED)*");
 * assert!(classification.warnings.is_empty());
 * ```
 */

use std::fmt;

use crate::error::Warning;
use crate::pin::{PinKind, PinRecord, PositionKey};

/// Power pins that are drawn as ground.
pub const GROUND_NAMES: &[&str] = &["VSS", "VSSA", "GND", "AGND"];

/// Power pins that are supply inputs.
pub const SUPPLY_NAMES: &[&str] = &[
    "VDD", "AVDD", "VBAT", "VIN", "VREF+", "VDDA", "VCAP_1", "VCAP_2", "VDDUSB", "VDDSDMMC",
    "E5V",
];

/// Power pins that a carrier board drives out.
pub const OUTPUT_SUPPLY_NAMES: &[&str] = &["+5V", "+3.3V", "U5V", "IOREF"];

/// The symbol unit a pin is drawn in.
///
/// The variant order matches the order of the unit names as strings, so
/// sorting by [Unit] sorts the way KiCad lists the units.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    /// `?`: an I/O pin whose name is not a port pin.
    Unknown,
    /// A GPIO port, e.g. `PA`.
    Port(String),
    /// `YMISC`: reset, boot and no-connect pins.
    Misc,
    /// `ZPWR`: power and ground pins.
    Power,
    /// `~`: a pin of an unrecognized kind.
    Unclassified,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Unknown => f.write_str("?"),
            Unit::Port(port) => f.write_str(port),
            Unit::Misc => f.write_str("YMISC"),
            Unit::Power => f.write_str("ZPWR"),
            Unit::Unclassified => f.write_str("~"),
        }
    }
}

/// Group tag of a power or miscellaneous pin. Ordered as `?`, `G`, `V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortTag {
    Unknown,
    Ground,
    Supply,
}

impl SortTag {
    pub fn as_char(&self) -> char {
        match self {
            SortTag::Unknown => '?',
            SortTag::Ground => 'G',
            SortTag::Supply => 'V',
        }
    }
}

/// Ordering of a pin within its unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitSort {
    Unresolved,
    /// The numeric suffix of a port pin (`PA10` -> 10).
    Port(u32),
    Tagged(SortTag, PositionKey),
}

/// KiCad pin electrical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElectricalType {
    NoConnect,
    Input,
    Output,
    Bidirectional,
    Passive,
    PowerIn,
    PowerOut,
}

impl fmt::Display for ElectricalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElectricalType::NoConnect => "no_connect",
            ElectricalType::Input => "input",
            ElectricalType::Output => "output",
            ElectricalType::Bidirectional => "bidirectional",
            ElectricalType::Passive => "passive",
            ElectricalType::PowerIn => "power_in",
            ElectricalType::PowerOut => "power_out",
        })
    }
}

/// KiCad pin line styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Line,
    Inverted,
    NonLogic,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Style::Line => "line",
            Style::Inverted => "inverted",
            Style::NonLogic => "non_logic",
        })
    }
}

/// The side of the symbol a pin is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// A pin record together with its schematic attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPin {
    /// The record the attributes were derived from.
    pub record: PinRecord,
    /// The pin position, which may differ from `record.position` once the
    /// pin has been relocated to a carrier board connector.
    pub position: String,
    pub unit: Unit,
    pub unit_sort: UnitSort,
    pub electrical_type: ElectricalType,
    pub style: Style,
    pub side: Side,
    /// The record name decorated with its signal or label tag.
    pub display_name: String,
}

impl ClassifiedPin {
    pub fn trimmed_name(&self) -> &str {
        self.record.trimmed_name()
    }

    /// Moves the pin to a different physical position.
    pub fn relocate(&mut self, position: &str) {
        self.position = position.to_string();
        if let UnitSort::Tagged(_, key) = &mut self.unit_sort {
            *key = PositionKey::parse(position);
        }
    }
}

/// The result of [classify].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pin: ClassifiedPin,
    pub warnings: Vec<Warning>,
}

/// What a [SignalRule] decides about an I/O pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalOutcome {
    pub electrical_type: ElectricalType,
    /// Text placed in parentheses after the pin name.
    pub tag: Option<String>,
    /// Whether the decoration already ends in `*`.
    pub starred: bool,
    pub warning: Option<Warning>,
}

impl SignalOutcome {
    fn new(electrical_type: ElectricalType, tag: &str) -> Self {
        Self {
            electrical_type,
            tag: Some(tag.to_string()),
            starred: false,
            warning: None,
        }
    }

    fn starred(mut self) -> Self {
        self.starred = true;
        self
    }

    fn warn(mut self, warning: Warning) -> Self {
        self.warning = Some(warning);
        self
    }
}

/// One entry of the ordered I/O signal rule table.
pub struct SignalRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub classify: fn(&PinRecord) -> SignalOutcome,
}

/// I/O signal rules in precedence order. The first matching rule wins.
pub static SIGNAL_RULES: &[SignalRule] = &[
    SignalRule {
        name: "unused",
        matches: str::is_empty,
        classify: unused,
    },
    SignalRule {
        name: "ethernet",
        matches: is_ethernet,
        classify: ethernet,
    },
    SignalRule {
        name: "external_interrupt",
        matches: is_external_interrupt,
        classify: external_interrupt,
    },
    SignalRule {
        name: "gpio_input",
        matches: is_gpio_input,
        classify: gpio_input,
    },
    SignalRule {
        name: "gpio_output",
        matches: is_gpio_output,
        classify: gpio_output,
    },
    SignalRule {
        name: "i2c",
        matches: is_i2c,
        classify: i2c,
    },
    SignalRule {
        name: "rcc",
        matches: is_rcc,
        classify: rcc,
    },
    SignalRule {
        name: "sys",
        matches: is_sys,
        classify: sys,
    },
    SignalRule {
        name: "timer",
        matches: is_timer,
        classify: timer,
    },
    SignalRule {
        name: "uart",
        matches: is_uart,
        classify: uart,
    },
    SignalRule {
        name: "usb",
        matches: is_usb,
        classify: usb,
    },
];

/// Returns the rule that handles `signal`, if any.
pub fn signal_rule(signal: &str) -> Option<&'static SignalRule> {
    SIGNAL_RULES.iter().find(|rule| (rule.matches)(signal))
}

fn is_ethernet(signal: &str) -> bool {
    signal.starts_with("ETH_")
}

fn is_external_interrupt(signal: &str) -> bool {
    signal.starts_with("GPIO_EXT")
}

fn is_gpio_input(signal: &str) -> bool {
    signal.starts_with("GPIO_") && signal.ends_with("_Input")
}

fn is_gpio_output(signal: &str) -> bool {
    signal.starts_with("GPIO_") && signal.ends_with("_Output")
}

fn is_i2c(signal: &str) -> bool {
    signal.starts_with("I2C")
}

fn is_rcc(signal: &str) -> bool {
    signal.starts_with("RCC_")
}

fn is_sys(signal: &str) -> bool {
    signal.starts_with("SYS_")
}

fn is_timer(signal: &str) -> bool {
    signal.starts_with("TIM")
}

fn is_uart(signal: &str) -> bool {
    signal.starts_with("UART") || signal.starts_with("USART")
}

fn is_usb(signal: &str) -> bool {
    signal.starts_with("USB_")
}

fn unused(_: &PinRecord) -> SignalOutcome {
    SignalOutcome {
        electrical_type: ElectricalType::NoConnect,
        tag: None,
        starred: false,
        warning: None,
    }
}

fn ethernet(record: &PinRecord) -> SignalOutcome {
    SignalOutcome::new(ElectricalType::Bidirectional, &record.signal)
}

fn external_interrupt(record: &PinRecord) -> SignalOutcome {
    let tag = if record.label.is_empty() {
        record.signal.strip_prefix("GPIO_").unwrap_or(&record.signal)
    } else {
        &record.label
    };
    SignalOutcome::new(ElectricalType::Input, tag)
}

fn gpio_input(record: &PinRecord) -> SignalOutcome {
    let label = &record.label;
    if label.is_empty() {
        SignalOutcome::new(ElectricalType::Input, "GPIN")
    } else if label.starts_with("USB_OverCurrent") {
        SignalOutcome::new(ElectricalType::Input, "USB_OVER_CURRENT")
    } else if label.contains('[') {
        SignalOutcome::new(ElectricalType::Input, label).warn(Warning::UnhandledLabel {
            direction: "Input",
            label: label.clone(),
        })
    } else {
        SignalOutcome::new(ElectricalType::Input, label)
    }
}

fn gpio_output(record: &PinRecord) -> SignalOutcome {
    let label = &record.label;
    if label.is_empty() {
        SignalOutcome::new(ElectricalType::Output, "GPOUT")
    } else if label.starts_with("USB_PowerSwitchOn") {
        SignalOutcome::new(ElectricalType::Output, "USB_POWER_ON")
    } else if let Some(color) = nucleo_led_color(label) {
        let tag = format!("NUCELO_{}_LED", color.to_uppercase());
        SignalOutcome::new(ElectricalType::Output, &tag)
    } else if label.contains('[') {
        SignalOutcome::new(ElectricalType::Output, label).warn(Warning::UnhandledLabel {
            direction: "Output",
            label: label.clone(),
        })
    } else {
        SignalOutcome::new(ElectricalType::Output, label)
    }
}

/// Extracts `Green` from Nucleo LED labels such as `LD2[Green]`.
fn nucleo_led_color(label: &str) -> Option<&str> {
    if !label.starts_with("LD") {
        return None;
    }
    let (_, color) = label.split_once('[')?;
    Some(color.strip_suffix(']').unwrap_or(color))
}

fn i2c(record: &PinRecord) -> SignalOutcome {
    let signal = &record.signal;
    if signal.ends_with("_SDA") || signal.ends_with("_SCL") {
        SignalOutcome::new(ElectricalType::Bidirectional, signal)
    } else {
        SignalOutcome::new(ElectricalType::NoConnect, signal)
            .warn(Warning::UnrecognizedI2cSignal(signal.clone()))
    }
}

fn rcc(record: &PinRecord) -> SignalOutcome {
    let signal = &record.signal;
    let tag = signal.strip_prefix("RCC_").unwrap_or(signal);
    let outcome = if signal.ends_with("_IN") {
        SignalOutcome::new(ElectricalType::Passive, tag)
    } else if signal.ends_with("_OUT") {
        SignalOutcome::new(ElectricalType::Output, tag)
    } else {
        SignalOutcome::new(ElectricalType::NoConnect, tag)
            .warn(Warning::UnrecognizedRccSignal(signal.clone()))
    };
    outcome.starred()
}

fn sys(record: &PinRecord) -> SignalOutcome {
    let tag = record.signal.strip_prefix("SYS_").unwrap_or(&record.signal);
    SignalOutcome::new(ElectricalType::Bidirectional, tag).starred()
}

fn timer(record: &PinRecord) -> SignalOutcome {
    SignalOutcome::new(ElectricalType::Output, &record.signal)
}

fn uart(record: &PinRecord) -> SignalOutcome {
    let signal = &record.signal;
    if signal.ends_with("_RX") {
        SignalOutcome::new(ElectricalType::Input, signal)
    } else if signal.ends_with("_TX") {
        SignalOutcome::new(ElectricalType::Output, signal)
    } else {
        SignalOutcome::new(ElectricalType::Bidirectional, signal)
            .warn(Warning::UnrecognizedUartSignal(signal.clone()))
    }
}

fn usb(record: &PinRecord) -> SignalOutcome {
    let signal = &record.signal;
    match signal.strip_prefix("USB_OTG_FS_") {
        Some(rest) => {
            let tag = format!("USB_OTG_{}", rest);
            SignalOutcome::new(ElectricalType::Bidirectional, &tag).starred()
        }
        None => {
            let tag = signal.strip_prefix("USB_").unwrap_or(signal);
            SignalOutcome::new(ElectricalType::Bidirectional, tag)
                .starred()
                .warn(Warning::UnhandledUsbSignal(signal.clone()))
        }
    }
}

/// Attributes shared by every kind branch before the name is decorated.
struct Attributes {
    unit: Unit,
    unit_sort: UnitSort,
    electrical_type: ElectricalType,
    style: Style,
    side: Side,
    tag: Option<String>,
    starred: bool,
}

impl Attributes {
    fn new(unit: Unit, unit_sort: UnitSort) -> Self {
        Self {
            unit,
            unit_sort,
            electrical_type: ElectricalType::NoConnect,
            style: Style::NonLogic,
            side: Side::Right,
            tag: None,
            starred: false,
        }
    }
}

/// Splits a port pin name such as `PA10` into its unit and sort key.
fn port_unit(trimmed_name: &str) -> Option<(Unit, UnitSort)> {
    let bytes = trimmed_name.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'P' || !bytes[1].is_ascii_uppercase() {
        return None;
    }
    let suffix = &trimmed_name[2..];
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = suffix.parse::<u32>().ok()?;
    Some((Unit::Port(trimmed_name[..2].to_string()), UnitSort::Port(number)))
}

fn classify_io(record: &PinRecord, warnings: &mut Vec<Warning>) -> Attributes {
    let trimmed_name = record.trimmed_name();
    let (unit, unit_sort) = port_unit(trimmed_name).unwrap_or_else(|| {
        warnings.push(Warning::UnparseablePortName {
            name: record.name.clone(),
            trimmed_name: trimmed_name.to_string(),
        });
        (Unit::Unknown, UnitSort::Unresolved)
    });

    let mut attributes = Attributes::new(unit, unit_sort);
    attributes.style = if record.label.starts_with('~') {
        Style::Inverted
    } else {
        Style::Line
    };

    match signal_rule(&record.signal) {
        Some(rule) => {
            let outcome = (rule.classify)(record);
            attributes.electrical_type = outcome.electrical_type;
            attributes.tag = outcome.tag;
            attributes.starred = outcome.starred;
            warnings.extend(outcome.warning);
        }
        None => warnings.push(Warning::UnrecognizedSignal {
            name: record.name.clone(),
            signal: record.signal.clone(),
        }),
    }

    attributes
}

fn classify_power(
    record: &PinRecord,
    position_key: PositionKey,
    warnings: &mut Vec<Warning>,
) -> Attributes {
    let name = record.name.as_str();
    let (tag, electrical_type, side, pin_tag) = if GROUND_NAMES.contains(&name) {
        (SortTag::Ground, ElectricalType::PowerIn, Side::Right, Some("PI"))
    } else if SUPPLY_NAMES.contains(&name) {
        (SortTag::Supply, ElectricalType::PowerIn, Side::Left, Some("PI"))
    } else if OUTPUT_SUPPLY_NAMES.contains(&name) {
        (SortTag::Supply, ElectricalType::PowerOut, Side::Left, Some("PO"))
    } else {
        warnings.push(Warning::UnrecognizedPower(record.name.clone()));
        (SortTag::Unknown, ElectricalType::NoConnect, Side::Right, None)
    };

    let mut attributes = Attributes::new(Unit::Power, UnitSort::Tagged(tag, position_key));
    attributes.electrical_type = electrical_type;
    attributes.style = Style::Line;
    attributes.side = side;
    attributes.tag = pin_tag.map(String::from);
    attributes
}

/// Classifies a single pin record.
pub fn classify(record: &PinRecord) -> Classification {
    let mut warnings = Vec::new();

    let position_key = record.position_key();
    if !position_key.is_recognized() {
        warnings.push(Warning::UnparseablePosition(record.position.clone()));
    }

    let attributes = match &record.kind {
        kind if kind.is_io() => classify_io(record, &mut warnings),
        PinKind::Power => classify_power(record, position_key, &mut warnings),
        PinKind::Reset | PinKind::Boot => {
            let mut attributes = Attributes::new(
                Unit::Misc,
                UnitSort::Tagged(SortTag::Unknown, position_key),
            );
            attributes.electrical_type = ElectricalType::Input;
            attributes.style = Style::Line;
            attributes
        }
        PinKind::Nc => Attributes::new(
            Unit::Misc,
            UnitSort::Tagged(SortTag::Unknown, position_key),
        ),
        kind => {
            warnings.push(Warning::UnrecognizedKind {
                name: record.name.clone(),
                kind: kind.to_string(),
            });
            Attributes::new(Unit::Unclassified, UnitSort::Unresolved)
        }
    };

    let mut display_name = record.name.clone();
    if let Some(tag) = &attributes.tag {
        display_name.push('(');
        display_name.push_str(tag);
        display_name.push(')');
    }
    if attributes.starred || record.label.contains('[') {
        display_name.push('*');
    }

    Classification {
        pin: ClassifiedPin {
            record: record.clone(),
            position: record.position.clone(),
            unit: attributes.unit,
            unit_sort: attributes.unit_sort,
            electrical_type: attributes.electrical_type,
            style: attributes.style,
            side: attributes.side,
            display_name,
        },
        warnings,
    }
}
