// ArtifactLocator - resolves a finished file by name under the output root

use std::path::{Component, Path, PathBuf};

use super::errors::DownloadError;

#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    root: PathBuf,
}

impl ArtifactLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an existing artifact.
    ///
    /// The identifier is a bare file name such as `<video-id>.<ext>`; anything
    /// that could step outside the root is refused.
    pub async fn locate(&self, identifier: &str) -> Result<PathBuf, DownloadError> {
        if identifier.is_empty() {
            return Err(DownloadError::InvalidRequest(
                "called without a 'url'".to_string(),
            ));
        }

        if !is_plain_file_name(identifier) {
            return Err(DownloadError::InvalidRequest(format!(
                "'{}' is not a plain file name",
                identifier
            )));
        }

        let path = self.root.join(identifier);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(DownloadError::NotFound(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DownloadError::NotFound(path)),
            Err(source) => Err(DownloadError::Io { path, source }),
        }
    }

    /// Open an artifact for streaming
    pub async fn open(&self, identifier: &str) -> Result<(PathBuf, tokio::fs::File), DownloadError> {
        let path = self.locate(identifier).await?;
        let file = tokio::fs::File::open(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DownloadError::NotFound(path.clone())
            } else {
                DownloadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Ok((path, file))
    }
}

fn is_plain_file_name(identifier: &str) -> bool {
    if identifier.contains('/') || identifier.contains('\\') || identifier.contains('\0') {
        return false;
    }

    let mut components = Path::new(identifier).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_empty_identifier_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ArtifactLocator::new(dir.path());
        assert!(matches!(
            locator.locate("").await,
            Err(DownloadError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ArtifactLocator::new(dir.path());
        match locator.locate("nonexistent.mp4").await {
            Err(DownloadError::NotFound(path)) => assert_eq!(path, dir.path().join("nonexistent.mp4")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_existing_artifact_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        std::fs::write(dir.path().join("abc123.mp4"), &payload).unwrap();

        let locator = ArtifactLocator::new(dir.path());
        let (path, mut file) = locator.open("abc123.mp4").await.unwrap();
        assert_eq!(path, dir.path().join("abc123.mp4"));

        let mut read = Vec::new();
        file.read_to_end(&mut read).await.unwrap();
        assert_eq!(read, payload);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("static");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();

        let locator = ArtifactLocator::new(&root);
        for id in ["../secret.txt", "..", ".", "/etc/passwd", "sub/file.mp4", "..\\secret.txt"] {
            assert!(
                matches!(locator.locate(id).await, Err(DownloadError::InvalidRequest(_))),
                "identifier {id:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_directory_is_not_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("abc123.mp4")).unwrap();

        let locator = ArtifactLocator::new(dir.path());
        assert!(matches!(
            locator.locate("abc123.mp4").await,
            Err(DownloadError::NotFound(_))
        ));
    }
}
