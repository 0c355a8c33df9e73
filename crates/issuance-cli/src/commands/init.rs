use std::path::Path;

use issuance_core::IssuanceFile;

pub fn init(path: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join("issuance.toml");
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    std::fs::write(&output, IssuanceFile::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path().to_str().unwrap()).unwrap();

        let file = IssuanceFile::from_file(&dir.path().join("issuance.toml")).unwrap();
        assert_eq!(file.controller.target_ratio, 200_000_000_000_000_000);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("issuance.toml"), "keep me").unwrap();
        assert!(init(dir.path().to_str().unwrap()).is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("issuance.toml")).unwrap(),
            "keep me"
        );
    }
}
