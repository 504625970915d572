use anyhow::{Context, Result};
use std::{env, fs};

fn main() -> Result<()> {
    // Usage: kbank <statement.xls> [more.xls ...]
    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        println!("Usage: kbank <statement.xls> [more.xls ...]");
        return Ok(());
    }

    for path in &files {
        println!("📖 Parsing {}", path);
        let bytes = fs::read(path).with_context(|| format!("reading {}", path))?;
        let table = kbank::parse_bytes(&bytes, path)?;
        println!("  → {} transaction(s)", table.len());
        for line in table.to_text_rows().iter().take(6) {
            println!("  {}", line.join(" | "));
        }
    }
    Ok(())
}
