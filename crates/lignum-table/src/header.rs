//! Grammar table header (64 bytes).
//!
//! Section order: Header → Tables → DfaTable → DfaBlob. Offsets are computed
//! from the sizes and counts stored here, every section 64-byte aligned.

use super::{MAGIC, SECTION_ALIGN, VERSION};

/// File header - first 64 bytes of a grammar table.
///
/// Layout:
/// - 0-23: identity and sizes (magic, version, checksum, total_size, tables_size, dfa_blob_size)
/// - 24-35: wide counts (3 × u32): states, productions, lex modes
/// - 36-45: narrow counts (5 × u16): symbols, fields, lexemes, DFAs, externals
/// - 46-63: reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Header {
    /// Magic bytes: b"LGNM"
    pub magic: [u8; 4],
    /// Engine ABI version the table was built for.
    pub version: u32,
    /// CRC32 checksum of everything after the header.
    pub checksum: u32,
    /// Total file size in bytes.
    pub total_size: u32,
    /// Size of the postcard-encoded tables section.
    pub tables_size: u32,
    /// Size of the serialized DFA blob.
    pub dfa_blob_size: u32,

    pub state_count: u32,
    pub production_count: u32,
    pub lex_mode_count: u32,

    pub symbol_count: u16,
    pub field_count: u16,
    pub lexeme_count: u16,
    pub dfa_count: u16,
    pub external_count: u16,

    pub _reserved: [u8; 18],
}

const _: () = assert!(std::mem::size_of::<Header>() == 64);

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            total_size: 0,
            tables_size: 0,
            dfa_blob_size: 0,
            state_count: 0,
            production_count: 0,
            lex_mode_count: 0,
            symbol_count: 0,
            field_count: 0,
            lexeme_count: 0,
            dfa_count: 0,
            external_count: 0,
            _reserved: [0; 18],
        }
    }
}

/// Section offsets derived from header sizes and counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionOffsets {
    pub tables: u32,
    pub dfa_table: u32,
    pub dfa_blob: u32,
    /// End of the last section, before final padding.
    pub end: u32,
}

#[inline]
fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[inline]
fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl Header {
    /// Decode header from the first 64 bytes.
    ///
    /// Returns `None` when fewer than 64 bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 64 {
            return None;
        }

        let mut reserved = [0u8; 18];
        reserved.copy_from_slice(&bytes[46..64]);

        Some(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32_at(bytes, 4),
            checksum: u32_at(bytes, 8),
            total_size: u32_at(bytes, 12),
            tables_size: u32_at(bytes, 16),
            dfa_blob_size: u32_at(bytes, 20),
            state_count: u32_at(bytes, 24),
            production_count: u32_at(bytes, 28),
            lex_mode_count: u32_at(bytes, 32),
            symbol_count: u16_at(bytes, 36),
            field_count: u16_at(bytes, 38),
            lexeme_count: u16_at(bytes, 40),
            dfa_count: u16_at(bytes, 42),
            external_count: u16_at(bytes, 44),
            _reserved: reserved,
        })
    }

    /// Encode header to 64 bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.tables_size.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.dfa_blob_size.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.state_count.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.production_count.to_le_bytes());
        bytes[32..36].copy_from_slice(&self.lex_mode_count.to_le_bytes());
        bytes[36..38].copy_from_slice(&self.symbol_count.to_le_bytes());
        bytes[38..40].copy_from_slice(&self.field_count.to_le_bytes());
        bytes[40..42].copy_from_slice(&self.lexeme_count.to_le_bytes());
        bytes[42..44].copy_from_slice(&self.dfa_count.to_le_bytes());
        bytes[44..46].copy_from_slice(&self.external_count.to_le_bytes());
        bytes[46..64].copy_from_slice(&self._reserved);
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == VERSION
    }

    /// Compute section offsets from sizes and counts.
    ///
    /// The DFA table holds one u32 blob offset per DFA plus a sentinel.
    pub fn compute_offsets(&self) -> SectionOffsets {
        let align = SECTION_ALIGN as u64;

        let tables = align;
        let dfa_table = align_up(tables + self.tables_size as u64, align);
        let dfa_table_size = (self.dfa_count as u64 + 1) * 4;
        let dfa_blob = align_up(dfa_table + dfa_table_size, align);
        let end = dfa_blob + self.dfa_blob_size as u64;

        SectionOffsets {
            tables: saturate(tables),
            dfa_table: saturate(dfa_table),
            dfa_blob: saturate(dfa_blob),
            end: saturate(end),
        }
    }
}

/// Round up to the next multiple of `align`.
fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

// Offsets of a corrupt header may not fit; saturating keeps them out of bounds.
fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
