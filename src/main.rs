use anyhow::{Context, Result};
use data_fixtures::{Config, LoaderRegistry, setup_logging};
use std::{env, path::PathBuf};

fn main() -> Result<()> {
    setup_logging()?;

    let path = get_path(&Config::from_env())?;
    let data = LoaderRegistry::new()
        .load(&path)
        .with_context(|| format!("cannot load {}", path.display()))?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &data)?;
    std::io::Write::write_all(&mut stdout, b"\n")?;

    Ok(())
}

// Relative paths which don't exist as given are looked up in the fixture directory
fn get_path(config: &Config) -> Result<PathBuf> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Usage: data-fixtures <data-file>"))?;
    if path.is_relative() && !path.exists() {
        return Ok(config.resolve(&path));
    }
    Ok(path)
}
