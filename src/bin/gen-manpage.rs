//! Renders the avrdetect(1) man page from the clap definition
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]
//!
//! The page lands in `man/avrdetect.1` unless another directory is given.

use clap::CommandFactory;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;
#[allow(dead_code)]
#[path = "../programmers.rs"]
mod programmers;

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("man"), PathBuf::from);
    std::fs::create_dir_all(&output_dir)?;

    let mut page = Vec::new();
    clap_mangen::Man::new(cli::Cli::command()).render(&mut page)?;

    let output_path = output_dir.join("avrdetect.1");
    std::fs::write(&output_path, page)?;

    println!("Wrote {}", output_path.display());
    println!("Preview with: man -l {}", output_path.display());
    Ok(())
}
