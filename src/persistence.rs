// File: src/persistence.rs
use crate::core::phrase_table::PhraseTable;
use crate::error::{DecoderError, Result};
use log::info;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes the binary phrase-table cache. The file is written to a temporary
/// sibling and renamed into place, so readers never see a partial table.
pub fn save_phrase_table(table: &PhraseTable, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| DecoderError::io(parent_dir, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| DecoderError::io(parent_dir, e))?;
    let mut writer = BufWriter::new(&temp_file);
    bincode::serialize_into(&mut writer, table)?;
    writer.flush().map_err(|e| DecoderError::io(temp_file.path(), e))?;
    drop(writer);

    temp_file.persist(path).map_err(|e| DecoderError::io(path, e.error))?;
    info!("wrote {} phrase pairs to {}", table.len(), path.display());
    Ok(())
}

pub fn load_phrase_table(path: &Path) -> Result<PhraseTable> {
    let file = File::open(path).map_err(|e| DecoderError::io(path, e))?;
    let reader = BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}
