//! Conversion between mass and molar concentration units
//!
//! Units are written as a ratio of an SI-prefixed amount (`g` or `mol`) over an SI-prefixed
//! volume (`L`, `l` or `ℓ`), for example `pg/mL`, `pmol/L` or `ng/dL`. Switching between mass
//! and moles uses the molar mass of the analyte.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unsupported unit token \"{0}\"")]
    UnsupportedToken(String),
    #[error("Unsupported prefix \"{prefix}\" in \"{token}\"")]
    UnsupportedPrefix { prefix: String, token: String },
    #[error("Expected a ratio like \"pg/mL\", got \"{0}\"")]
    NotARatio(String),
    #[error("Only mass/volume or mol/volume units are supported (got \"{0}\")")]
    UnsupportedRatio(String),
}

/// Analytes with a known molar mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hormone {
    Cholesterol,
    Testosterone,
    Dihydrotestosterone,
    Dehydroepiandrosterone,
    Estrone,
    Estradiol,
    Estriol,
    Estetrol,
    Progesterone,
    Aldosterone,
    Androstenedione,
    Cortisol,
    Gonadorelin,
    #[serde(rename = "Follicle-stimulating hormone")]
    FollicleStimulatingHormone,
    #[serde(rename = "Luteinising hormone")]
    LuteinisingHormone,
    #[serde(rename = "Thyroid-stimulating hormone")]
    ThyroidStimulatingHormone,
    #[serde(rename = "Sex hormone-binding globulin")]
    SexHormoneBindingGlobulin,
    Prolactin,
    Thyroxine,
    Triiodothyronine,
    #[serde(rename = "Vitamin D3")]
    VitaminD3,
    #[serde(rename = "Vitamin B12")]
    VitaminB12,
}

impl Hormone {
    /// Molar mass in g/mol
    pub fn molar_mass(&self) -> f64 {
        match self {
            Hormone::Cholesterol => 386.65,
            Hormone::Testosterone => 288.431,
            Hormone::Dihydrotestosterone => 290.447,
            Hormone::Dehydroepiandrosterone => 288.424,
            Hormone::Estrone => 270.336,
            Hormone::Estradiol => 272.38,
            Hormone::Estriol => 288.387,
            Hormone::Estetrol => 304.386,
            Hormone::Progesterone => 314.469,
            Hormone::Aldosterone => 360.45,
            Hormone::Androstenedione => 286.415,
            Hormone::Cortisol => 362.46,
            Hormone::Gonadorelin => 1182.311,
            Hormone::FollicleStimulatingHormone => 30000.0,
            Hormone::LuteinisingHormone => 33000.0,
            Hormone::ThyroidStimulatingHormone => 28000.0,
            Hormone::SexHormoneBindingGlobulin => 43700.0,
            Hormone::Prolactin => 22892.0,
            Hormone::Thyroxine => 776.87,
            Hormone::Triiodothyronine => 650.977,
            Hormone::VitaminD3 => 384.64,
            Hormone::VitaminB12 => 1355.388,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base {
    Gram,
    Mole,
    Liter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quantity {
    base: Base,
    exponent: i32,
}

fn prefix_exponent(prefix: &str) -> Option<i32> {
    let exponent = match prefix {
        "y" => -24,
        "z" => -21,
        "a" => -18,
        "f" => -15,
        "p" => -12,
        "n" => -9,
        "µ" | "μ" | "u" => -6,
        "m" => -3,
        "c" => -2,
        "d" => -1,
        "" => 0,
        "da" => 1,
        "h" => 2,
        "k" => 3,
        "M" => 6,
        "G" => 9,
        "T" => 12,
        "P" => 15,
        "E" => 18,
        "Z" => 21,
        "Y" => 24,
        _ => return None,
    };
    Some(exponent)
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let t: String = token.chars().filter(|c| !c.is_whitespace()).collect();

        // `mol` is matched before the volume suffix so its trailing `l` is not read as litres.
        let (base, prefix) = if let Some(prefix) = t.strip_suffix("mol") {
            (Base::Mole, prefix)
        } else if let Some(prefix) = t.strip_suffix('g') {
            (Base::Gram, prefix)
        } else if let Some(prefix) = t.strip_suffix(['L', 'l', 'ℓ']) {
            (Base::Liter, prefix)
        } else {
            return Err(UnitError::UnsupportedToken(token.to_string()));
        };

        let exponent = prefix_exponent(prefix).ok_or_else(|| UnitError::UnsupportedPrefix {
            prefix: prefix.to_string(),
            token: token.to_string(),
        })?;

        Ok(Quantity { base, exponent })
    }
}

/// A concentration unit such as `pg/mL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcentrationUnit {
    symbol: String,
    numerator: Quantity,
    denominator: Quantity,
}

impl ConcentrationUnit {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Whether the amount is expressed in moles
    pub fn is_molar(&self) -> bool {
        self.numerator.base == Base::Mole
    }
}

impl FromStr for ConcentrationUnit {
    type Err = UnitError;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        let (num, den) = unit
            .split_once('/')
            .filter(|(num, den)| !num.trim().is_empty() && !den.trim().is_empty() && !den.contains('/'))
            .ok_or_else(|| UnitError::NotARatio(unit.to_string()))?;

        let numerator: Quantity = num.parse()?;
        let denominator: Quantity = den.parse()?;

        if numerator.base == Base::Liter || denominator.base != Base::Liter {
            return Err(UnitError::UnsupportedRatio(unit.to_string()));
        }

        Ok(ConcentrationUnit {
            symbol: unit.trim().to_string(),
            numerator,
            denominator,
        })
    }
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Convert `value` of `hormone` from one concentration unit to another
pub fn convert(value: f64, hormone: Hormone, from: &ConcentrationUnit, to: &ConcentrationUnit) -> f64 {
    let prefix = (from.numerator.exponent + to.denominator.exponent)
        - (from.denominator.exponent + to.numerator.exponent);

    let mass = hormone.molar_mass();
    let base_factor = match (from.numerator.base, to.numerator.base) {
        (Base::Mole, Base::Gram) => mass,
        (Base::Gram, Base::Mole) => 1.0 / mass,
        _ => 1.0,
    };

    value * 10_f64.powi(prefix) * base_factor
}

/// Parse both units and convert
pub fn convert_hormone(value: f64, hormone: Hormone, from: &str, to: &str) -> Result<f64, UnitError> {
    let from: ConcentrationUnit = from.parse()?;
    let to: ConcentrationUnit = to.parse()?;
    Ok(convert(value, hormone, &from, &to))
}

pub fn convert_estradiol(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    convert_hormone(value, Hormone::Estradiol, from, to)
}

pub fn convert_testosterone(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    convert_hormone(value, Hormone::Testosterone, from, to)
}

pub fn convert_progesterone(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    convert_hormone(value, Hormone::Progesterone, from, to)
}
