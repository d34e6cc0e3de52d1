use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nitro_narc::NarcArchive;
use std::fs::File;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListArgs {
    /// An input NARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;

        let stem = self
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let archive = NarcArchive::new(f)?;
        for (path, entry) in archive.paths(&stem).iter().zip(archive.fat_entries()) {
            println!("{:>10}  {}", entry.len(), path);
        }

        Ok(())
    }
}
