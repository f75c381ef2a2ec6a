use std::{collections::HashMap, path::PathBuf};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::sysfs::Sysfs;

static DEFAULT_BANK_BASES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
  let mut m = HashMap::new();
  for (i, bank) in ["gpio0", "gpio1", "gpio2", "gpio3", "gpio4", "gpio5", "gpio6"]
    .iter()
    .enumerate()
  {
    m.insert(*bank, i as u32 * 32);
  }
  m
});

/// Library configuration, deserialized from JSON. All fields are
/// optional; the defaults target the live system.
#[derive(Deserialize, Default, Debug)]
pub struct Config {
  /// Prefix prepended to every sysfs path. Tests point this at a
  /// scratch directory mirroring the real layout.
  #[serde(default)]
  pub sysfs_root: Option<PathBuf>,

  /// Bank name to base pin number, overriding the built-in table.
  #[serde(default)]
  pub banks: Option<BankMap>,
}

impl Config {
  pub fn from_json(data: &[u8]) -> Self {
    serde_json::from_slice(data).unwrap_or_else(|e| {
      tracing::error!("failed to parse config, using default: {}", e);
      Config::default()
    })
  }

  pub fn sysfs(&self) -> Sysfs {
    match &self.sysfs_root {
      Some(root) => Sysfs::new(root),
      None => Sysfs::default(),
    }
  }

  pub fn bank_map(&self) -> BankMap {
    self.banks.clone().unwrap_or_default()
  }
}

/// Mapping from a bank name (as used in device tree aliases) to the
/// base pin number of that bank.
#[derive(Deserialize, Clone, Debug)]
#[serde(transparent)]
pub struct BankMap(HashMap<String, u32>);

impl Default for BankMap {
  fn default() -> Self {
    Self(
      DEFAULT_BANK_BASES
        .iter()
        .map(|(bank, base)| (bank.to_string(), *base))
        .collect(),
    )
  }
}

impl BankMap {
  pub fn contains(&self, bank: &str) -> bool {
    self.0.contains_key(bank)
  }

  /// Base pin number of a bank. Unknown banks resolve to base 0.
  pub fn base(&self, bank: &str) -> u32 {
    self.0.get(bank).copied().unwrap_or(0)
  }

  pub fn pin_number(&self, bank: &str, index: u32) -> u32 {
    self.base(bank) + index
  }
}
