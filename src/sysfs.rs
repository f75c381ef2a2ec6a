use std::{
  fs::{self, File},
  io::{self, Write},
  path::{Path, PathBuf},
};

use crate::pin::{Direction, Pin, PinMode};

/// Handle on the sysfs GPIO interface under a given filesystem root.
///
/// The root is `/` in production; tests point it at a scratch
/// directory mirroring the `sys/class/gpio` layout. Every operation
/// opens, uses and closes one file, so the handle itself holds no
/// open descriptors and can be cloned and shared freely.
#[derive(Clone, Debug)]
pub struct Sysfs {
  root: PathBuf,
}

impl Default for Sysfs {
  fn default() -> Self {
    Self::new("/")
  }
}

impl Sysfs {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn gpio_dir(&self) -> PathBuf {
    self.root.join("sys/class/gpio")
  }

  fn pin_file(&self, pin: &Pin, op: &str) -> PathBuf {
    self
      .gpio_dir()
      .join(format!("gpio{}", pin.number))
      .join(op)
  }

  /// Asks the kernel to expose the pin's control files by writing its
  /// number to the controller-wide `export` file.
  pub fn export(&self, pin: &Pin) -> io::Result<()> {
    let mut f = File::options().write(true).open(self.gpio_dir().join("export"))?;
    writeln!(f, "{}", pin.number)
  }

  /// Whether the pin's control files are present. Any stat failure
  /// reads as "not exported"; this is a probe, not a fallible call.
  pub fn is_exported(&self, pin: &Pin) -> bool {
    fs::metadata(self.pin_file(pin, "value")).is_ok()
  }

  pub fn direction(&self, pin: &Pin) -> io::Result<Direction> {
    let word = read_token(&self.pin_file(pin, "direction"))?;
    Direction::from_sysfs_word(&word)
      .ok_or_else(|| invalid_data(format!("unexpected direction {:?}", word)))
  }

  pub fn set_direction(&self, pin: &Pin, dir: Direction) -> io::Result<()> {
    write_line(&self.pin_file(pin, "direction"), dir.sysfs_word())
  }

  /// Writes the mode word to the `direction` file. Unlike plain
  /// `out` (which starts low), `low` and `high` configure output and
  /// set the initial level in one glitch-free kernel operation.
  pub fn set_mode(&self, pin: &Pin, mode: PinMode) -> io::Result<()> {
    write_line(&self.pin_file(pin, "direction"), mode.sysfs_word())
  }

  pub fn value(&self, pin: &Pin) -> io::Result<bool> {
    let token = read_token(&self.pin_file(pin, "value"))?;
    let v = token
      .parse::<i64>()
      .map_err(|_| invalid_data(format!("unexpected value {:?}", token)))?;
    Ok(v != 0)
  }

  pub fn set_value(&self, pin: &Pin, v: bool) -> io::Result<()> {
    write_line(&self.pin_file(pin, "value"), if v { "1" } else { "0" })
  }

  /// Applies the pin's discovered default mode.
  pub fn apply_default(&self, pin: &Pin) -> io::Result<()> {
    self.set_mode(pin, pin.default_mode)
  }
}

fn read_token(path: &Path) -> io::Result<String> {
  let contents = fs::read_to_string(path)?;
  match contents.split_whitespace().next() {
    Some(token) => Ok(token.to_string()),
    None => Err(invalid_data(format!("empty file {}", path.display()))),
  }
}

fn write_line(path: &Path, word: &str) -> io::Result<()> {
  let mut f = File::options().write(true).open(path)?;
  f.write_all(word.as_bytes())?;
  f.write_all(b"\n")
}

fn invalid_data(msg: String) -> io::Error {
  io::Error::new(io::ErrorKind::InvalidData, msg)
}
