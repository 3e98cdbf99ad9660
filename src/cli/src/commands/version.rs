//! `autorun version` command.

use clap::Args;

#[derive(Args, Debug)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> autorun_core::Result<i32> {
    println!("autorun version {}", autorun_core::VERSION);
    Ok(0)
}
