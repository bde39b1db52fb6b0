use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Largest accepted logo, in bytes.
pub const MAX_LOGO_SIZE: usize = 2 * 1024 * 1024;

/// URL prefix the logo directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads/logos";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Manages on-disk company logos.
///
/// Each logo is stored flat as `{dir}/{company_id}-{uuid}.{ext}` and exposed
/// to clients as `/uploads/logos/{file}`.
pub struct LogoStorage {
    dir: PathBuf,
}

impl LogoStorage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Logo storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lowercased extension of `file_name` if it is an accepted image type.
    pub fn allowed_extension(file_name: &str) -> Option<String> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Write the logo and return its public path.
    pub async fn save(&self, company_id: i64, ext: &str, data: &[u8]) -> Result<String> {
        let file_name = format!("{}-{}.{}", company_id, Uuid::new_v4(), ext);
        fs::write(self.dir.join(&file_name), data).await?;
        info!("Stored logo {} for company {}", file_name, company_id);
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Remove a logo by its public path. Paths outside the logo prefix are ignored.
    pub async fn delete(&self, public_path: &str) -> Result<()> {
        let Some(file_name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            warn!("Refusing to delete logo outside storage: {}", public_path);
            return Ok(());
        };

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                info!("Deleted logo {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Logo {} already gone", file_name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_extensions_are_allowed() {
        assert_eq!(LogoStorage::allowed_extension("logo.PNG").as_deref(), Some("png"));
        assert_eq!(LogoStorage::allowed_extension("a.b.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(LogoStorage::allowed_extension("script.js"), None);
        assert_eq!(LogoStorage::allowed_extension("noext"), None);
    }

    #[tokio::test]
    async fn save_then_delete() {
        let dir = std::env::temp_dir().join(format!("gestion-logos-{}", Uuid::new_v4()));
        let storage = LogoStorage::new(dir.clone()).await.unwrap();

        let public = storage.save(3, "png", b"\x89PNG").await.unwrap();
        assert!(public.starts_with("/uploads/logos/3-"));
        let file_name = public.rsplit('/').next().unwrap();
        assert!(dir.join(file_name).exists());

        storage.delete(&public).await.unwrap();
        assert!(!dir.join(file_name).exists());

        // Missing files and foreign paths are not errors.
        storage.delete(&public).await.unwrap();
        storage.delete("/etc/passwd").await.unwrap();
        storage.delete("/uploads/logos/../secret").await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }
}
