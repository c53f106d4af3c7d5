//! Component value parsing
//!
//! Turns BOM value strings such as `10k`, `100nF` or `4.7uH` into a numeric
//! value in base units. Three families are tried in order (resistor,
//! capacitor, inductor) and the first match wins. Anything else is
//! unparseable, which is not an error: LEDs, connectors and ICs carry
//! free-text values.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::str::FromStr;

use solderline_models::{ComponentValue, ValueUnit};

static RESISTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|\.\d+)\s*([kmr])?\s*(?:Ω|ohms?)?$").expect("valid resistor regex")
});

/// RKM notation: the multiplier replaces the decimal point (`4k7`, `4R7`, `1M2`).
static RESISTOR_RKM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)([kmr])(\d+)\s*(?:Ω|ohms?)?$").expect("valid RKM regex")
});

static CAPACITOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|\.\d+)\s*([pnuµμm])?F$").expect("valid capacitor regex")
});

static INDUCTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|\.\d+)\s*([nuµμm])?H$").expect("valid inductor regex")
});

/// Parses a raw BOM value. Returns `None` when no family matches.
pub fn parse_component_value(raw: &str) -> Option<ComponentValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_resistor(raw)
        .or_else(|| parse_capacitor(raw))
        .or_else(|| parse_inductor(raw))
}

fn parse_resistor(raw: &str) -> Option<ComponentValue> {
    if let Some(caps) = RESISTOR.captures(raw) {
        let number = Decimal::from_str(&caps[1]).ok()?;
        let multiplier = multiplier_char(&caps)
            .map(resistor_multiplier)
            .unwrap_or(Decimal::ONE);
        return Some(ComponentValue::new(number.checked_mul(multiplier)?, ValueUnit::Ohm));
    }

    let caps = RESISTOR_RKM.captures(raw)?;
    let combined = format!("{}.{}", &caps[1], &caps[3]);
    let number = Decimal::from_str(&combined).ok()?;
    let multiplier = multiplier_char(&caps).map(resistor_multiplier)?;
    Some(ComponentValue::new(number.checked_mul(multiplier)?, ValueUnit::Ohm))
}

fn parse_capacitor(raw: &str) -> Option<ComponentValue> {
    let caps = CAPACITOR.captures(raw)?;
    let number = Decimal::from_str(&caps[1]).ok()?;
    let multiplier = multiplier_char(&caps)
        .map(submultiplier)
        .unwrap_or(Decimal::ONE);
    Some(ComponentValue::new(number.checked_mul(multiplier)?, ValueUnit::Farad))
}

fn parse_inductor(raw: &str) -> Option<ComponentValue> {
    let caps = INDUCTOR.captures(raw)?;
    let number = Decimal::from_str(&caps[1]).ok()?;
    let multiplier = multiplier_char(&caps)
        .map(submultiplier)
        .unwrap_or(Decimal::ONE);
    Some(ComponentValue::new(number.checked_mul(multiplier)?, ValueUnit::Henry))
}

fn multiplier_char(caps: &Captures<'_>) -> Option<char> {
    caps.get(2).and_then(|m| m.as_str().chars().next())
}

fn resistor_multiplier(c: char) -> Decimal {
    match c.to_ascii_lowercase() {
        'k' => Decimal::from(1_000),
        'm' => Decimal::from(1_000_000),
        _ => Decimal::ONE,
    }
}

fn submultiplier(c: char) -> Decimal {
    match c {
        'p' | 'P' => Decimal::new(1, 12),
        'n' | 'N' => Decimal::new(1, 9),
        'u' | 'U' | 'µ' | 'μ' | 'Μ' => Decimal::new(1, 6),
        'm' | 'M' => Decimal::new(1, 3),
        _ => Decimal::ONE,
    }
}
