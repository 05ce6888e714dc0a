//! Checksum command: print the size and hash upload would announce for each file.

use anyhow::Result;
use depo_core::config::DepoConfig;
use depo_core::files::RootDir;
use depo_core::upload::hash;
use std::path::Path;

/// Names are opened under `root` exactly as the uploader opens a sheet's
/// file column, and hashed with the same chunk size.
pub async fn run_checksum(cfg: &DepoConfig, root: &Path, files: &[String]) -> Result<()> {
    let root = RootDir::new(root);
    let mut failed = 0usize;
    for name in files {
        let (mut file, size) = match root.open(name).await {
            Ok(opened) => opened,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed += 1;
                continue;
            }
        };
        match hash::sha256_reader(&mut file, cfg.hash_chunk_bytes).await {
            Ok(digest) => println!("{}  {:>12}  {}", digest, size, name),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be hashed", failed, files.len());
    }
    Ok(())
}
