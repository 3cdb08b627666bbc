use std::{fs, path::Path};

use crate::{
    config::tmp_path,
    errors::Result,
    ledger::Ledger,
    storage::json_backend::load_ledger_from_path,
};

/// Writes the provided ledger to disk atomically by staging to a temporary file.
pub fn save_ledger_to_file(ledger: &Ledger, path: &Path) -> Result<()> {
    let tmp = tmp_path(path);
    let json = serde_json::to_string_pretty(ledger)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Loads a ledger snapshot from disk, rejecting snapshots from a newer schema.
pub fn load_ledger_from_file(path: &Path) -> Result<Ledger> {
    load_ledger_from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_roundtrip_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let ledger = Ledger::new("Plain file");
        save_ledger_to_file(&ledger, &path).unwrap();
        assert!(!tmp_path(&path).exists());
        assert_eq!(load_ledger_from_file(&path).unwrap().name, "Plain file");
    }
}
