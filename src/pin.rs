use std::fmt;

use anyhow::{anyhow, Context};
use serde::Deserialize;

/// One GPIO line, addressed by its number in the controller's global
/// numbering space (bank base + index within the bank).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pin {
  pub number: u32,
  pub name: String,
  pub default_mode: PinMode,
}

impl Pin {
  pub fn new(name: impl Into<String>, number: u32, default_mode: PinMode) -> Self {
    Self {
      number,
      name: name.into(),
      default_mode,
    }
  }
}

impl fmt::Display for Pin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "gpio {} ({})", self.number, self.name)
  }
}

/// Direction plus initial level applied when a pin is initialized.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
  Input,
  OutputLow,
  OutputHigh,
}

// (mode, device-tree keyword property, sysfs direction word),
// indexed by discriminant.
const MODE_TABLE: &[(PinMode, &str, &str)] = &[
  (PinMode::Input, "input", "in"),
  (PinMode::OutputLow, "output-low", "low"),
  (PinMode::OutputHigh, "output-high", "high"),
];

impl PinMode {
  /// Mode denoted by a keyword property on a pin description node,
  /// if the property name is one of the three keywords.
  pub fn from_dt_keyword(prop: &str) -> Option<Self> {
    MODE_TABLE
      .iter()
      .find(|(_, kw, _)| *kw == prop)
      .map(|(mode, _, _)| *mode)
  }

  /// Word accepted by the sysfs `direction` file for this mode.
  /// `low` and `high` configure output with that initial level.
  pub fn sysfs_word(self) -> &'static str {
    MODE_TABLE[self as usize].2
  }
}

/// Current direction of a pin as reported by the sysfs `direction`
/// file.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  In,
  Out,
}

impl Direction {
  pub fn sysfs_word(self) -> &'static str {
    match self {
      Direction::In => "in",
      Direction::Out => "out",
    }
  }

  pub fn from_sysfs_word(word: &str) -> Option<Self> {
    match word {
      "in" => Some(Direction::In),
      "out" => Some(Direction::Out),
      _ => None,
    }
  }
}

/// Splits a pin description node name of the form `name@index` into
/// the pin name and its index within the bank.
///
/// A missing `@` or a non-numeric index is an error; a pin must never
/// be registered under a number it was not actually described with.
pub fn parse_pin_label(label: &str) -> anyhow::Result<(&str, u32)> {
  let (name, index) = label
    .split_once('@')
    .ok_or_else(|| anyhow!("pin node name {:?} has no @index suffix", label))?;
  if name.is_empty() {
    return Err(anyhow!("pin node name {:?} has an empty name part", label));
  }
  let index = index
    .parse::<u32>()
    .with_context(|| format!("bad pin index in node name {:?}", label))?;
  Ok((name, index))
}
