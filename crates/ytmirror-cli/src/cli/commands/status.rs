//! `ytmirror status` – list archive ledger entries.

use anyhow::Result;
use ytmirror_core::ledger::ArchiveLedger;

pub fn run_status() -> Result<()> {
    let path = ArchiveLedger::default_path()?;
    let ledger = ArchiveLedger::load(&path)?;
    if ledger.is_empty() {
        println!("Archive ledger is empty ({}).", path.display());
        return Ok(());
    }

    println!("{:<16} {:<8} PATH", "ID", "FILE");
    for (id, target) in ledger.iter() {
        let file = if target.exists() { "ok" } else { "missing" };
        println!("{:<16} {:<8} {}", id, file, target.display());
    }
    let noun = if ledger.len() == 1 { "entry" } else { "entries" };
    println!("{} {} in {}", ledger.len(), noun, path.display());
    Ok(())
}
