//! Minimal flattened-device-tree serializer for test fixtures.

const FDT_MAGIC: u32 = 0xd00d_feed;
const FDT_BEGIN_NODE: u32 = 0x1;
const FDT_END_NODE: u32 = 0x2;
const FDT_PROP: u32 = 0x3;
const FDT_END: u32 = 0x9;

const HEADER_LEN: usize = 40;
const RSVMAP_LEN: usize = 16; // one all-zero terminator entry

#[derive(Default)]
pub struct DtbBuilder {
  structure: Vec<u8>,
  strings: Vec<u8>,
  depth: usize,
}

impl DtbBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn begin_node(&mut self, name: &str) -> &mut Self {
    push_u32(&mut self.structure, FDT_BEGIN_NODE);
    self.structure.extend_from_slice(name.as_bytes());
    self.structure.push(0);
    pad4(&mut self.structure);
    self.depth += 1;
    self
  }

  pub fn end_node(&mut self) -> &mut Self {
    assert!(self.depth > 0, "end_node without matching begin_node");
    push_u32(&mut self.structure, FDT_END_NODE);
    self.depth -= 1;
    self
  }

  pub fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
    let nameoff = self.intern(name);
    push_u32(&mut self.structure, FDT_PROP);
    push_u32(&mut self.structure, value.len() as u32);
    push_u32(&mut self.structure, nameoff);
    self.structure.extend_from_slice(value);
    pad4(&mut self.structure);
    self
  }

  /// String property, NUL-terminated as in a real blob.
  pub fn prop_str(&mut self, name: &str, value: &str) -> &mut Self {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    self.prop(name, &bytes)
  }

  /// Boolean/marker property with an empty value.
  pub fn prop_empty(&mut self, name: &str) -> &mut Self {
    self.prop(name, &[])
  }

  pub fn prop_u32(&mut self, name: &str, value: u32) -> &mut Self {
    self.prop(name, &value.to_be_bytes())
  }

  pub fn build(mut self) -> Vec<u8> {
    assert_eq!(self.depth, 0, "unclosed node");
    push_u32(&mut self.structure, FDT_END);

    let off_struct = HEADER_LEN + RSVMAP_LEN;
    let off_strings = off_struct + self.structure.len();
    let totalsize = off_strings + self.strings.len();

    let mut blob = Vec::with_capacity(totalsize);
    push_u32(&mut blob, FDT_MAGIC);
    push_u32(&mut blob, totalsize as u32);
    push_u32(&mut blob, off_struct as u32);
    push_u32(&mut blob, off_strings as u32);
    push_u32(&mut blob, HEADER_LEN as u32);
    push_u32(&mut blob, 17); // version
    push_u32(&mut blob, 16); // last compatible version
    push_u32(&mut blob, 0); // boot cpu
    push_u32(&mut blob, self.strings.len() as u32);
    push_u32(&mut blob, self.structure.len() as u32);
    blob.extend_from_slice(&[0u8; RSVMAP_LEN]);
    blob.extend_from_slice(&self.structure);
    blob.extend_from_slice(&self.strings);
    blob
  }

  fn intern(&mut self, name: &str) -> u32 {
    let off = self.strings.len() as u32;
    self.strings.extend_from_slice(name.as_bytes());
    self.strings.push(0);
    off
  }
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
  buf.extend_from_slice(&v.to_be_bytes());
}

fn pad4(buf: &mut Vec<u8>) {
  while buf.len() % 4 != 0 {
    buf.push(0);
  }
}
