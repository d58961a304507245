use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::tool::{ResourceScope, ToolError};

/// Write through a sibling temp file and rename into place.
///
/// The temp file is registered on `scope` so an interrupted attempt leaves
/// nothing behind.
pub(crate) async fn write_atomic(path: &Path, content: &str, scope: &ResourceScope) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);
    let pending = tmp.clone();
    scope.register(format!("temp file {}", tmp.display()), move || {
        match std::fs::remove_file(&pending) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    });
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| ToolError::execution(format!("failed to write {}: {e}", path.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| ToolError::execution(format!("failed to move {} into place: {e}", path.display())))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{file}.{}.tmp", Uuid::new_v4().simple()))
}
