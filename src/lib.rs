//! Userspace GPIO pin registry and sysfs driver.
//!
//! Pins described in a flattened device tree are discovered once into
//! a name-keyed [`Registry`] snapshot, then driven through the Linux
//! `/sys/class/gpio` interface via [`Sysfs`]. Aliases in the tree map
//! bank names to controller nodes; each child of a `gpio-controller`
//! node names one pin as `name@index` with a mode keyword property,
//! and its flattened number is the bank base plus the index.
//!
//! ```no_run
//! use gpiomap::{discover_system, BankMap, Sysfs};
//!
//! # fn main() -> anyhow::Result<()> {
//! let fs = Sysfs::default();
//! let discovery = discover_system(&fs, &BankMap::default())?;
//! if let Some(led) = discovery.registry.get("led") {
//!   fs.apply_default(led)?;
//!   fs.set_value(led, true)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Device tree parsing belongs to the `fdt` crate; this crate only
//! walks the parsed tree. All I/O is synchronous, one file handle per
//! operation, no caching.

pub mod config;
pub mod pin;
pub mod registry;
pub mod sysfs;

pub use config::{BankMap, Config};
pub use pin::{parse_pin_label, Direction, Pin, PinMode};
pub use registry::{discover, discover_system, Chip, Discovery, Issue, Registry};
pub use sysfs::Sysfs;
