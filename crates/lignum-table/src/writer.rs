//! Grammar table emission.
//!
//! Assembles the header, the postcard-encoded tables and the DFA blob into
//! one checksummed buffer.

use super::data::TableData;
use super::error::EmitError;
use super::header::Header;
use super::SECTION_ALIGN;

/// Serialize a table and its DFAs (`to_bytes_little_endian` output, indexed by
/// `Matcher::Pattern::dfa`) into the binary grammar table format.
pub fn emit(data: &TableData, dfas: &[Vec<u8>]) -> Result<Vec<u8>, EmitError> {
    let symbol_count = narrow("symbols", data.symbols.len())?;
    let field_count = narrow("fields", data.fields.len())?;
    let lexeme_count = narrow("lexemes", data.lexemes.len())?;
    let dfa_count = narrow("DFAs", dfas.len())?;
    let external_count = narrow("external tokens", data.externals.len())?;

    let tables = postcard::to_allocvec(data)?;
    let (dfa_blob, dfa_table) = emit_dfas(dfas);

    let mut output = vec![0u8; 64];
    emit_section(&mut output, &tables);
    emit_section(&mut output, &dfa_table);
    emit_section(&mut output, &dfa_blob);
    pad_to_section(&mut output);

    let mut header = Header {
        total_size: wide("bytes", output.len())?,
        tables_size: wide("bytes", tables.len())?,
        dfa_blob_size: wide("bytes", dfa_blob.len())?,
        state_count: wide("states", data.states.len())?,
        production_count: wide("productions", data.productions.len())?,
        lex_mode_count: wide("lex modes", data.lex_modes.len())?,
        symbol_count,
        field_count,
        lexeme_count,
        dfa_count,
        external_count,
        ..Default::default()
    };
    header.checksum = crc32fast::hash(&output[64..]);
    output[..64].copy_from_slice(&header.to_bytes());

    Ok(output)
}

/// Concatenate DFAs (each 4-byte aligned) and build the offset table with a
/// trailing sentinel holding the blob size.
fn emit_dfas(dfas: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let mut blob = Vec::new();
    let mut table = Vec::with_capacity((dfas.len() + 1) * 4);

    for dfa in dfas {
        let rem = blob.len() % 4;
        if rem != 0 {
            blob.resize(blob.len() + (4 - rem), 0);
        }
        table.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        blob.extend_from_slice(dfa);
    }
    table.extend_from_slice(&(blob.len() as u32).to_le_bytes());

    (blob, table)
}

fn pad_to_section(buf: &mut Vec<u8>) {
    let rem = buf.len() % SECTION_ALIGN;
    if rem != 0 {
        buf.resize(buf.len() + (SECTION_ALIGN - rem), 0);
    }
}

fn emit_section(output: &mut Vec<u8>, data: &[u8]) {
    pad_to_section(output);
    output.extend_from_slice(data);
}

fn narrow(what: &'static str, count: usize) -> Result<u16, EmitError> {
    u16::try_from(count).map_err(|_| EmitError::TooMany {
        what,
        count,
        max: u16::MAX as usize,
    })
}

fn wide(what: &'static str, count: usize) -> Result<u32, EmitError> {
    u32::try_from(count).map_err(|_| EmitError::TooMany {
        what,
        count,
        max: u32::MAX as usize,
    })
}
