use clap::Args;
use miette::Result;
use nitro_narc::read::unpack;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct UnpackArgs {
    /// An input NARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A parent directory for the unpacked files
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,
}

impl UnpackArgs {
    pub fn handle(&self) -> Result<()> {
        info!(
            "unpacking {} into {}",
            self.file.display(),
            self.directory.display()
        );

        unpack(&self.file, &self.directory)?;

        Ok(())
    }
}
