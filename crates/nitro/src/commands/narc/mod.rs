pub mod list;
pub mod naix;
pub mod pack;
pub mod unpack;

#[derive(clap::Subcommand)]
pub enum NarcCommands {
    /// Pack a directory into a NARC file
    Pack(pack::PackArgs),
    /// Unpack a NARC file into a directory
    Unpack(unpack::UnpackArgs),
    /// List the contents of a NARC file
    List(list::ListArgs),
}

impl NarcCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            NarcCommands::Pack(pack) => pack.handle(),
            NarcCommands::Unpack(unpack) => unpack.handle(),
            NarcCommands::List(list) => list.handle(),
        }
    }
}
