use anyhow::{Context, Result};
use std::{env, fs};

fn main() -> Result<()> {
    // Usage: scb <payment_report.xlsx> [more.xlsx ...]
    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        println!("Usage: scb <payment_report.xlsx> [more.xlsx ...]");
        return Ok(());
    }

    for path in &files {
        println!("📖 Parsing {}", path);
        let bytes = fs::read(path).with_context(|| format!("reading {}", path))?;
        let table = scb::parse_bytes(&bytes, path)?;
        println!("  → {} transaction(s)", table.len());
        for line in table.to_text_rows().iter().take(6) {
            println!("  {}", line.join(" | "));
        }
    }
    Ok(())
}
