use std::{collections::HashMap, io};

use anyhow::{anyhow, Context};
use fdt::{node::FdtNode, Fdt};

use crate::{
  config::BankMap,
  pin::{parse_pin_label, Pin, PinMode},
  sysfs::Sysfs,
};

/// Immutable name-to-pin snapshot built by one discovery pass.
///
/// Construction is explicit; once built the registry never changes,
/// so it can be shared across threads without synchronization.
#[derive(Default, Debug)]
pub struct Registry {
  pins: HashMap<String, Pin>,
  chips: Vec<Chip>,
}

impl Registry {
  pub fn get(&self, name: &str) -> Option<&Pin> {
    self.pins.get(name)
  }

  pub fn len(&self) -> usize {
    self.pins.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pins.is_empty()
  }

  pub fn pins(&self) -> impl Iterator<Item = &Pin> {
    self.pins.values()
  }

  /// Controller records collected during discovery. Descriptive
  /// only; no driver operation consumes them.
  pub fn chips(&self) -> &[Chip] {
    &self.chips
  }

  /// Registers a pin under its name. A second registration under the
  /// same name replaces the first.
  pub fn register(&mut self, pin: Pin) {
    self.pins.insert(pin.name.clone(), pin);
  }
}

/// Pin range and compatible strings of one GPIO controller node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chip {
  pub base: u32,
  pub count: u32,
  pub compatible: Vec<String>,
}

/// One pin description that could not be fully processed. The scan
/// is best-effort: a bad description never aborts discovery.
#[derive(Debug)]
pub struct Issue {
  /// Name of the device tree node the problem was found on.
  pub node: String,
  pub error: anyhow::Error,
}

/// Result of a discovery pass: the registry plus the per-node
/// problems encountered along the way.
#[derive(Default, Debug)]
pub struct Discovery {
  pub registry: Registry,
  pub issues: Vec<Issue>,
}

/// Walks the device tree and materializes a pin registry.
///
/// Aliases whose property name contains `gpio` map a bank name to a
/// controller node; each child of a matched `gpio-controller` node
/// describes one pin as `name@index` plus a mode keyword property.
/// Discovered pins that are not yet exported are exported here, so
/// their control files exist by the time a caller drives them.
pub fn discover(tree: &Fdt, banks: &BankMap, fs: &Sysfs) -> Discovery {
  let aliases = gather_aliases(tree);
  let mut discovery = Discovery::default();

  for node in tree.all_nodes() {
    if node.property("gpio-controller").is_none() {
      continue;
    }
    for (bank, short_name) in &aliases {
      if short_name != node.name {
        continue;
      }
      if !banks.contains(bank) {
        tracing::warn!(bank = bank.as_str(), "unknown gpio bank, using base 0");
      }
      discovery.registry.chips.push(chip_of(&node, banks.base(bank)));

      for child in node.children() {
        match pin_of(&child, bank, banks) {
          Ok(pin) => {
            if !fs.is_exported(&pin) {
              if let Err(error) = fs.export(&pin) {
                tracing::warn!(pin = %pin, %error, "failed to export discovered pin");
                discovery.issues.push(Issue {
                  node: child.name.to_string(),
                  error: export_issue(&pin, error),
                });
              }
            }
            discovery.registry.register(pin);
          }
          Err(error) => {
            tracing::warn!(node = child.name, %error, "skipping pin description");
            discovery.issues.push(Issue {
              node: child.name.to_string(),
              error,
            });
          }
        }
      }
    }
  }

  discovery
}

/// Discovers pins from the live tree at `{root}/sys/firmware/fdt`.
/// An absent blob yields an empty registry, not an error.
pub fn discover_system(fs: &Sysfs, banks: &BankMap) -> anyhow::Result<Discovery> {
  let path = fs.root().join("sys/firmware/fdt");
  let blob = match std::fs::read(&path) {
    Ok(blob) => blob,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      tracing::debug!(path = %path.display(), "no device tree blob, registry stays empty");
      return Ok(Discovery::default());
    }
    Err(e) => {
      return Err(e).with_context(|| format!("failed to read {}", path.display()));
    }
  };
  let tree =
    Fdt::new(&blob).map_err(|e| anyhow!("invalid device tree blob {}: {:?}", path.display(), e))?;
  Ok(discover(&tree, banks, fs))
}

// Alias properties point at controller nodes by path; the last path
// segment is the controller's node name.
fn gather_aliases(tree: &Fdt) -> Vec<(String, String)> {
  let mut aliases = Vec::new();
  if let Some(node) = tree.find_node("/aliases") {
    for prop in node.properties() {
      if !prop.name.contains("gpio") {
        continue;
      }
      let path = match first_string(prop.value) {
        Some(path) => path,
        None => continue,
      };
      let short_name = path.rsplit('/').next().unwrap_or(path);
      aliases.push((prop.name.to_string(), short_name.to_string()));
    }
  }
  aliases
}

fn pin_of(child: &FdtNode, bank: &str, banks: &BankMap) -> anyhow::Result<Pin> {
  let (name, index) = parse_pin_label(child.name)?;
  let mode = child
    .properties()
    .find_map(|p| PinMode::from_dt_keyword(p.name))
    .ok_or_else(|| {
      anyhow!(
        "pin node {:?} has no input/output-low/output-high keyword",
        child.name
      )
    })?;
  Ok(Pin::new(name, banks.pin_number(bank, index), mode))
}

fn chip_of(node: &FdtNode, base: u32) -> Chip {
  let count = node
    .property("ngpios")
    .and_then(|p| p.as_usize())
    .unwrap_or(32) as u32;
  let compatible = node
    .compatible()
    .map(|c| c.all().map(str::to_string).collect())
    .unwrap_or_default();
  Chip {
    base,
    count,
    compatible,
  }
}

fn export_issue(pin: &Pin, error: io::Error) -> anyhow::Error {
  anyhow::Error::new(error).context(format!("failed to export {}", pin))
}

// Property values holding strings are NUL-terminated; take the first
// string in the value.
fn first_string(value: &[u8]) -> Option<&str> {
  let bytes = value.split(|b| *b == 0).next()?;
  match std::str::from_utf8(bytes) {
    Ok(s) if !s.is_empty() => Some(s),
    _ => None,
  }
}
