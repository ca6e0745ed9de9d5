//! Version command implementation

use crate::error::Result;
use crate::pipeline::Pipeline;

/// Run version command
pub fn run() -> Result<()> {
    println!("deskset {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", rustc_version());
    println!("  Profile: {}", build_profile());
    println!();
    println!("Steps:");
    for name in Pipeline::standard().names() {
        println!("  {name}");
    }

    Ok(())
}

fn rustc_version() -> &'static str {
    env!("CARGO_PKG_RUST_VERSION")
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
