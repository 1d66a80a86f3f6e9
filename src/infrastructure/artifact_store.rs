// Artifact store - atomic writes of exported files
use crate::domain::artifact::Artifact;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Saves artifacts into one directory. A file is either fully written or absent.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes to a hidden temp file, syncs it, then renames it into place.
    pub async fn save(&self, artifact: &Artifact) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let target = self.dir.join(&artifact.filename);
        let tmp = self.dir.join(format!(".{}.tmp", artifact.filename));

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&artifact.bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &target).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            tracing::error!("Failed to save {}: {}", target.display(), e);
            return Err(e);
        }

        tracing::info!("Saved {} ({} bytes)", target.display(), artifact.bytes.len());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::ArtifactFormat;

    #[tokio::test]
    async fn test_save_leaves_only_final_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("exports"));
        let artifact = Artifact::for_chart("c1", ArtifactFormat::Png, vec![1, 2, 3]);

        let path = store.save(&artifact).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "chart-c1.png");
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        let names: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_export() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path());
        store
            .save(&Artifact::for_chart("c1", ArtifactFormat::Pdf, vec![1]))
            .await
            .unwrap();
        let path = store
            .save(&Artifact::for_chart("c1", ArtifactFormat::Pdf, vec![2, 2]))
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![2, 2]);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path());
        // A non-empty directory squatting on the target name makes the rename fail.
        let blocker = temp_dir.path().join("chart-c1.png");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let result = store
            .save(&Artifact::for_chart("c1", ArtifactFormat::Png, vec![9, 9]))
            .await;

        assert!(result.is_err());
        assert!(blocker.is_dir());
        assert!(!temp_dir.path().join(".chart-c1.png.tmp").exists());
        let names: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("chart-c1.png")]);
    }
}
