use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::ResolvedStage;

/// A file sitting in a stage
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    /// Path relative to the stage root, `/` separated
    pub name: String,
    pub size: u64,
}

/// Stage storage under an account directory
pub struct StageStore {
    stages_dir: PathBuf,
}

impl StageStore {
    pub fn new(account_dir: &Path) -> Result<Self> {
        let stages_dir = account_dir.join("stages");
        fs::create_dir_all(&stages_dir).context("Failed to create stage directory")?;
        Ok(Self { stages_dir })
    }

    /// Directory backing one stage
    pub fn stage_dir(&self, stage: &ResolvedStage) -> PathBuf {
        self.stages_dir.join(
            format!("{}.{}.{}", stage.database, stage.schema, stage.name).to_ascii_lowercase(),
        )
    }

    /// Path of the staged file a reference points at; the file must exist
    pub fn file_path(&self, stage: &ResolvedStage) -> Result<PathBuf> {
        let Some(name) = &stage.path else {
            bail!("Stage reference {} does not name a file", stage);
        };
        let path = self.stage_dir(stage).join(name);
        if !path.is_file() {
            bail!("Remote file '{}' was not found in stage {}", name, stage);
        }
        Ok(path)
    }

    /// Where a put into the stage should land. The reference's path is a
    /// folder inside the stage; the file keeps its own name.
    pub fn destination(&self, stage: &ResolvedStage, file_name: &str) -> Result<PathBuf> {
        let is_plain_name = Path::new(file_name)
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if file_name.is_empty() || !is_plain_name {
            bail!("Invalid staged file name '{}'", file_name);
        }

        let mut dest = self.stage_dir(stage);
        if let Some(folder) = &stage.path {
            dest.push(folder);
        }
        dest.push(file_name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create stage directory {:?}", parent))?;
        }
        Ok(dest)
    }

    /// Copy a local file into the stage
    pub fn put_file(&self, stage: &ResolvedStage, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Source has no file name: {:?}", source))?;
        let dest = self.destination(stage, file_name)?;
        fs::copy(source, &dest)
            .with_context(|| format!("Failed to copy {:?} into {}", source, stage))?;
        Ok(dest)
    }

    /// List staged files, sorted by name
    pub fn list(&self, stage: &ResolvedStage) -> Result<Vec<StagedFile>> {
        let root = self.stage_dir(stage);
        let mut files = Vec::new();
        if root.is_dir() {
            collect_files(&root, &root, &mut files)?;
        }
        if let Some(prefix) = &stage.path {
            files.retain(|f| f.name.starts_with(prefix.as_str()));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Remove staged files matching the reference, returning how many were removed
    pub fn remove(&self, stage: &ResolvedStage) -> Result<usize> {
        let root = self.stage_dir(stage);
        let files = self.list(stage)?;
        for file in &files {
            fs::remove_file(root.join(&file.name))
                .with_context(|| format!("Failed to remove {}", file.name))?;
        }
        Ok(files.len())
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<StagedFile>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(StagedFile {
                name,
                size: entry.metadata()?.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageRef;

    fn stage(text: &str) -> ResolvedStage {
        StageRef::parse(text).unwrap().resolve("RETAIL_DB", "SALES")
    }

    #[test]
    fn test_put_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = StageStore::new(dir.path()).unwrap();

        let src = dir.path().join("sales.csv");
        fs::write(&src, "a,b\n1,2\n").unwrap();

        let dest = store.put_file(&stage("@SALES_STAGE"), &src).unwrap();
        assert!(dest.ends_with("retail_db.sales.sales_stage/sales.csv"));
        let q1 = dir.path().join("q1.csv");
        fs::write(&q1, "a,b\n1,2\n").unwrap();
        store.put_file(&stage("@SALES_STAGE/2025"), &q1).unwrap();

        let files = store.list(&stage("@sales_stage")).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["2025/q1.csv", "sales.csv"]);
        assert_eq!(files[1].size, 8);

        assert_eq!(store.remove(&stage("@SALES_STAGE/2025")).unwrap(), 1);
        assert_eq!(store.list(&stage("@SALES_STAGE")).unwrap().len(), 1);
    }

    #[test]
    fn test_put_into_folder_keeps_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StageStore::new(dir.path()).unwrap();

        let jan = dir.path().join("jan.csv");
        let feb = dir.path().join("feb.csv");
        fs::write(&jan, "product_name\nLaptop\n").unwrap();
        fs::write(&feb, "product_name\nMouse\n").unwrap();

        let d1 = store.put_file(&stage("@SALES_STAGE/2025/"), &jan).unwrap();
        let d2 = store.put_file(&stage("@SALES_STAGE/2025/"), &feb).unwrap();
        assert_ne!(d1, d2);
        assert!(d1.ends_with("retail_db.sales.sales_stage/2025/jan.csv"));

        let files = store.list(&stage("@SALES_STAGE/2025")).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["2025/feb.csv", "2025/jan.csv"]);

        let staged = store.file_path(&stage("@SALES_STAGE/2025/jan.csv")).unwrap();
        assert_eq!(fs::read_to_string(staged).unwrap(), "product_name\nLaptop\n");
    }

    #[test]
    fn test_destination_rejects_nested_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = StageStore::new(dir.path()).unwrap();
        assert!(store.destination(&stage("@SALES_STAGE"), "../escape.csv").is_err());
        assert!(store.destination(&stage("@SALES_STAGE"), "").is_err());
    }

    #[test]
    fn test_file_path_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StageStore::new(dir.path()).unwrap();
        assert!(store.file_path(&stage("@SALES_STAGE/missing.csv")).is_err());
        assert!(store.file_path(&stage("@SALES_STAGE")).is_err());
    }
}
