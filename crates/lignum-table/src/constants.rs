//! Grammar table format constants.

/// Magic bytes identifying a lignum grammar table.
pub const MAGIC: [u8; 4] = *b"LGNM";

/// Engine ABI version. Tables built for any other version are rejected.
pub const VERSION: u32 = 1;

/// Section alignment in bytes.
pub const SECTION_ALIGN: usize = 64;
