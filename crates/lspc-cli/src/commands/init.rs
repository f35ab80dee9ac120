use std::path::Path;

use clap::Args;

use lspc_core::ClientConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ClientConfig::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
