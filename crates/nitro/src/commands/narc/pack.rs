use clap::Args;
use miette::Result;
use super::naix;
use nitro_narc::types::Version;
use nitro_narc::write::{pack, PackOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct PackArgs {
    /// A target NARC file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A file listing the packing order of the root directory, overriding
    /// its .narcorder file
    #[arg(short, long, value_name = "ORDER_FILE")]
    order: Option<PathBuf>,

    /// A file listing file-patterns to ignore for packing
    #[arg(short, long, value_name = "IGNORE_FILE")]
    ignore: Option<PathBuf>,

    /// A file listing file-patterns to keep during packing, overriding
    /// those matching patterns in IGNORE_FILE
    #[arg(short, long, value_name = "KEEP_FILE")]
    keep: Option<PathBuf>,

    /// Build a filename table recording the directory tree
    #[arg(long, default_value_t = false)]
    filename_table: bool,

    /// Output the NARC as version 0 spec
    #[arg(short = 'z', long, default_value_t = false)]
    version_zero: bool,

    /// Output a C-style .naix header next to the NARC
    #[arg(short, long, default_value_t = false)]
    naix: bool,

    /// Prefix entries in the output .naix header with the NARC's stem;
    /// dependent on --naix
    #[arg(long, default_value_t = false, requires = "naix")]
    prefix_naix_entries: bool,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", self.file.display());

        let options = PackOptions::builder()
            .filename_table(self.filename_table)
            .version(if self.version_zero {
                Version::V0
            } else {
                Version::V1
            })
            .maybe_order(self.order.clone())
            .maybe_ignore(self.ignore.clone())
            .maybe_keep(self.keep.clone())
            .build();

        let packed = pack(&self.directory, &self.file, options)?;
        info!("packed {} files", packed.len());

        if self.naix {
            naix::write_header(&self.file, &packed, self.prefix_naix_entries)?;
        }

        Ok(())
    }
}
