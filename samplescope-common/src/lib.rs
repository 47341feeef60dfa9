//! # Sample Database Layout (profiler ↔ reader)
//!
//! Defines the on-disk structures of a profiler sample database. The file is
//! written by an external profiling daemon and only ever read here, so every
//! type mirrors the writer's `#[repr(C)]` layout byte for byte.
//!
//! ## File Layout
//!
//! ```text
//! ┌──────────────────────┐ offset 0
//! │ OpdHeader (88 bytes) │  magic, event config, is_kernel, mtime, ...
//! ├──────────────────────┤ offset 88
//! │ OdbDescriptor (32)   │  node capacity, nodes in use
//! ├──────────────────────┤ offset 120
//! │ OdbNode[current_size]│  (key = vma, value = hit count, next)
//! ├──────────────────────┤
//! │ hash index (unused)  │
//! └──────────────────────┘
//! ```
//!
//! Node 0 is reserved by the writer and always carries key 0. A node whose
//! key is 0 is an empty slot.
//!
//! All multi-byte fields are little-endian.

#![no_std]

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes at the start of every sample file: `\x7fOPD`
pub const OPD_MAGIC: [u8; 4] = [0x7f, b'O', b'P', b'D'];

/// Header version produced by current profiler daemons
pub const OPD_VERSION: u32 = 0x11;

/// Size of [`OpdHeader`] on disk
pub const OPD_HEADER_SIZE: usize = 88;

/// Size of [`OdbDescriptor`] on disk
pub const ODB_DESCRIPTOR_SIZE: usize = 32;

/// Size of one [`OdbNode`] on disk
pub const ODB_NODE_SIZE: usize = 16;

/// Offset of the first node (node 0, the reserved sentinel)
pub const ODB_NODES_OFFSET: usize = OPD_HEADER_SIZE + ODB_DESCRIPTOR_SIZE;

/// Key value marking an empty slot
pub const ODB_EMPTY_KEY: u64 = 0;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Sample file header written before the hash table
///
/// Describes the event configuration the samples were collected with and
/// whether the sampled image lives in kernel address space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpdHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub cpu_type: u32,
    pub ctr_event: u32,
    pub ctr_um: u32,
    pub ctr_count: u32,
    /// Non-zero when the sampled image is the kernel or a kernel module
    pub is_kernel: u32,
    pub cpu_speed: f64,
    /// Modification time of the sampled binary when profiling started
    pub mtime: u64,
    pub cg_to_is_kernel: u32,
    pub spu_profile: u32,
    pub embedded_offset: u64,
    pub anon_start: u64,
    pub cg_to_anon_start: u64,
    pub reserved: u32,
}

impl OpdHeader {
    /// Decode a header from the first [`OPD_HEADER_SIZE`] bytes of `buf`
    ///
    /// Returns `None` if `buf` is too short. The magic is not checked here.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < OPD_HEADER_SIZE {
            return None;
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[0..4]);
        Some(Self {
            magic,
            version: read_u32(buf, 4)?,
            cpu_type: read_u32(buf, 8)?,
            ctr_event: read_u32(buf, 12)?,
            ctr_um: read_u32(buf, 16)?,
            ctr_count: read_u32(buf, 20)?,
            is_kernel: read_u32(buf, 24)?,
            cpu_speed: f64::from_bits(read_u64(buf, 32)?),
            mtime: read_u64(buf, 40)?,
            cg_to_is_kernel: read_u32(buf, 48)?,
            spu_profile: read_u32(buf, 52)?,
            embedded_offset: read_u64(buf, 56)?,
            anon_start: read_u64(buf, 64)?,
            cg_to_anon_start: read_u64(buf, 72)?,
            reserved: read_u32(buf, 80)?,
        })
    }

    /// Encode the header into its on-disk representation
    #[must_use]
    pub fn encode(&self) -> [u8; OPD_HEADER_SIZE] {
        let mut out = [0u8; OPD_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        write_u32(&mut out, 4, self.version);
        write_u32(&mut out, 8, self.cpu_type);
        write_u32(&mut out, 12, self.ctr_event);
        write_u32(&mut out, 16, self.ctr_um);
        write_u32(&mut out, 20, self.ctr_count);
        write_u32(&mut out, 24, self.is_kernel);
        write_u64(&mut out, 32, self.cpu_speed.to_bits());
        write_u64(&mut out, 40, self.mtime);
        write_u32(&mut out, 48, self.cg_to_is_kernel);
        write_u32(&mut out, 52, self.spu_profile);
        write_u64(&mut out, 56, self.embedded_offset);
        write_u64(&mut out, 64, self.anon_start);
        write_u64(&mut out, 72, self.cg_to_anon_start);
        write_u32(&mut out, 80, self.reserved);
        out
    }

    /// Check the magic bytes
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == OPD_MAGIC
    }
}

impl Default for OpdHeader {
    fn default() -> Self {
        Self {
            magic: OPD_MAGIC,
            version: OPD_VERSION,
            cpu_type: 0,
            ctr_event: 0,
            ctr_um: 0,
            ctr_count: 0,
            is_kernel: 0,
            cpu_speed: 0.0,
            mtime: 0,
            cg_to_is_kernel: 0,
            spu_profile: 0,
            embedded_offset: 0,
            anon_start: 0,
            cg_to_anon_start: 0,
            reserved: 0,
        }
    }
}

/// Hash table descriptor following the header
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OdbDescriptor {
    /// Node capacity of the table (a power of two)
    pub size: u32,
    /// Nodes in use, plus one for the reserved node 0
    pub current_size: u32,
}

impl OdbDescriptor {
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        Some(Self { size: read_u32(buf, 0)?, current_size: read_u32(buf, 4)? })
    }

    #[must_use]
    pub fn encode(&self) -> [u8; ODB_DESCRIPTOR_SIZE] {
        let mut out = [0u8; ODB_DESCRIPTOR_SIZE];
        write_u32(&mut out, 0, self.size);
        write_u32(&mut out, 4, self.current_size);
        out
    }
}

/// One hash table slot: a sampled address and its hit count
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OdbNode {
    pub key: u64,
    pub value: u32,
    /// Index of the next node in the same bucket chain
    pub next: u32,
}

impl OdbNode {
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        Some(Self { key: read_u64(buf, 0)?, value: read_u32(buf, 8)?, next: read_u32(buf, 12)? })
    }

    #[must_use]
    pub fn encode(&self) -> [u8; ODB_NODE_SIZE] {
        let mut out = [0u8; ODB_NODE_SIZE];
        write_u64(&mut out, 0, self.key);
        write_u32(&mut out, 8, self.value);
        write_u32(&mut out, 12, self.next);
        out
    }

    /// Returns true if this slot holds no sample
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key == ODB_EMPTY_KEY
    }
}

// ============================================================================
// Byte helpers
// ============================================================================

fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u64(buf: &[u8], offset: usize) -> Option<u64> {
    let bytes = buf.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_offsets() {
        let header = OpdHeader { is_kernel: 1, ctr_count: 100_000, mtime: 42, ..OpdHeader::default() };
        let bytes = header.encode();

        assert_eq!(&bytes[0..4], &OPD_MAGIC);
        assert_eq!(bytes[24], 1, "is_kernel lives at offset 24");
        assert_eq!(u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 100_000);
        assert_eq!(OpdHeader::decode(&bytes), Some(header));
    }

    #[test]
    fn test_header_decode_short_buffer() {
        assert!(OpdHeader::decode(&[0u8; OPD_HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn test_bad_magic_detected() {
        let header = OpdHeader { magic: *b"ELF\0", ..OpdHeader::default() };
        assert!(!header.has_valid_magic());
        assert!(OpdHeader::default().has_valid_magic());
    }

    #[test]
    fn test_node_layout() {
        let node = OdbNode { key: 0x1000, value: 5, next: 3 };
        let bytes = node.encode();

        assert_eq!(&bytes[0..8], &0x1000u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &5u32.to_le_bytes());
        assert!(!node.is_empty());
        assert!(OdbNode::default().is_empty());
        assert!(OdbNode::decode(&bytes[..ODB_NODE_SIZE - 1]).is_none());
    }
}
