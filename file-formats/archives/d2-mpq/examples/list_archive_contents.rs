//! List the files named in an archive's (listfile)
//!
//! ```text
//! cargo run --example list_archive_contents -- d2data.mpq [d2exp.mpq ...]
//! ```

use d2_mpq::OpenOptions;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: list_archive_contents <archive.mpq>...");
        std::process::exit(2);
    }

    for archive_path in &paths {
        println!("\n=== Contents of {archive_path} ===");

        let archive = OpenOptions::new().ignore_case(true).open(archive_path)?;
        println!(
            "Sector size: {} bytes, {} hash entries, {} blocks",
            archive.sector_size(),
            archive.hash_table().size(),
            archive.block_table().size()
        );

        let files = match archive.list() {
            Ok(files) => files,
            Err(e) => {
                println!("No (listfile) or error reading it: {e}");
                continue;
            }
        };

        println!("Total files: {}", files.len());
        for (i, entry) in files.iter().enumerate() {
            let mut notes = Vec::new();
            if entry.is_compressed() {
                notes.push(format!("{} packed", entry.compressed_size));
            }
            if entry.is_encrypted() {
                notes.push("encrypted".to_string());
            }
            if entry.is_single_unit() {
                notes.push("single unit".to_string());
            }

            if notes.is_empty() {
                println!("{i}: {} ({} bytes)", entry.name, entry.size);
            } else {
                println!("{i}: {} ({} bytes, {})", entry.name, entry.size, notes.join(", "));
            }
        }
    }

    Ok(())
}
