use std::path::Path;

/// Files under the public directory that are emptied on every start.
pub const SCRATCH_FILES: [&str; 4] =
    ["playlist.json", "albums.json", "artists.json", "tracks.json"];

/// Overwrites every scratch file in `public_dir` with an empty JSON array,
/// creating the directory first if it does not exist.
///
/// # Errors
///
/// Returns an error if the directory or any of the files cannot be written.
pub async fn reset_scratch_files(public_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(public_dir).await?;

    let empty = serde_json::to_string_pretty(&Vec::<serde_json::Value>::new())?;

    for name in SCRATCH_FILES {
        let path = public_dir.join(name);
        tokio::fs::write(&path, &empty).await?;
        tracing::debug!("reset scratch file {}", path.display());
    }

    tracing::info!(
        "cleared {} scratch files in {}",
        SCRATCH_FILES.len(),
        public_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_files_are_emptied() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("playlist.json"), r#"[{"song":"x"}]"#)
            .await
            .unwrap();

        reset_scratch_files(dir.path()).await.unwrap();

        for name in SCRATCH_FILES {
            let contents =
                tokio::fs::read_to_string(dir.path().join(name)).await.unwrap();
            let value: Vec<serde_json::Value> =
                serde_json::from_str(&contents).unwrap();
            assert!(value.is_empty(), "{name} was not emptied");
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let public_dir = dir.path().join("public");

        reset_scratch_files(&public_dir).await.unwrap();

        assert!(public_dir.join("tracks.json").exists());
    }

    #[tokio::test]
    async fn test_other_files_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("index.html"), "<html></html>")
            .await
            .unwrap();

        reset_scratch_files(dir.path()).await.unwrap();

        assert_eq!(
            tokio::fs::read_to_string(dir.path().join("index.html"))
                .await
                .unwrap(),
            "<html></html>"
        );
    }
}
