//! 沙箱文件系统工具
//!
//! SafeFs 绑定 root_dir，所有路径经校验必须在 root 下（禁止 ../ 逃逸）；
//! 读取限制大小；写入默认拒绝覆盖已有文件；删除必须显式 confirm。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{bind_args, Tool, ToolError};

/// 单次读取上限
const MAX_READ_BYTES: u64 = 1_000_000;

/// 沙箱文件系统：绑定根目录，解析后的路径必须仍在根下
#[derive(Debug, Clone)]
pub struct SafeFs {
    root_dir: PathBuf,
}

impl SafeFs {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let root_dir = root.canonicalize().unwrap_or(root);
        Self { root_dir }
    }

    /// 解析已存在的路径并校验在沙箱内
    fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let path = path.trim_start_matches("./");
        let full = self.root_dir.join(path);
        let canonical = full
            .canonicalize()
            .map_err(|_| format!("Path not found: {path}"))?;
        self.ensure_inside(&canonical, path)?;
        Ok(canonical)
    }

    /// 解析可能尚不存在的目标路径（写入用）：按父目录校验
    fn resolve_for_write(&self, path: &str, create_parents: bool) -> Result<PathBuf, String> {
        let path = path.trim_start_matches("./");
        let full = self.root_dir.join(path);
        let parent = full
            .parent()
            .ok_or_else(|| format!("Invalid path: {path}"))?;
        if create_parents {
            std::fs::create_dir_all(parent).map_err(|e| format!("Create dir failed: {e}"))?;
        }
        let canonical_parent = parent
            .canonicalize()
            .map_err(|_| format!("Path not found: {path}"))?;
        self.ensure_inside(&canonical_parent, path)?;
        let file_name = full
            .file_name()
            .ok_or_else(|| format!("Invalid path: {path}"))?;
        Ok(canonical_parent.join(file_name))
    }

    fn ensure_inside(&self, canonical: &Path, original: &str) -> Result<(), String> {
        let root_canon = self
            .root_dir
            .canonicalize()
            .unwrap_or_else(|_| self.root_dir.clone());
        if canonical.starts_with(root_canon) {
            Ok(())
        } else {
            Err(format!("Path escapes sandbox: {original}")) // 如 ../../etc/passwd
        }
    }

    /// 读取文本文件，超出 MAX_READ_BYTES 的部分截断，非 UTF-8 字节做替换解码
    pub fn read_file(&self, path: &str) -> Result<String, String> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(format!("Not a file: {path}"));
        }
        let mut data = std::fs::read(&resolved).map_err(|e| format!("Read failed: {e}"))?;
        data.truncate(MAX_READ_BYTES as usize);
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// 列出目录项（隐藏文件跳过，目录加 "/" 后缀，按名排序）
    pub fn list_dir(&self, path: &str) -> Result<Vec<String>, String> {
        let base = if path.is_empty() || path == "." {
            self.root_dir.clone()
        } else {
            self.resolve(path)?
        };
        let mut entries = Vec::new();
        for e in std::fs::read_dir(&base).map_err(|e| format!("List failed: {e}"))? {
            let e = e.map_err(|e| e.to_string())?;
            let name = e.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                let suffix = if e.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    "/"
                } else {
                    ""
                };
                entries.push(format!("{name}{suffix}"));
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// 写入文本文件；已存在且未允许覆盖时拒绝
    pub fn write_file(
        &self,
        path: &str,
        content: &str,
        allow_overwrite: bool,
    ) -> Result<PathBuf, String> {
        let target = self.resolve_for_write(path, true)?;
        if target.is_dir() {
            return Err(format!("Target is a directory: {path}"));
        }
        if target.exists() && !allow_overwrite {
            return Err(format!("Refusing to overwrite existing file: {path}"));
        }
        std::fs::write(&target, content).map_err(|e| format!("Write failed: {e}"))?;
        Ok(target)
    }

    /// 删除文件；不删目录
    pub fn delete_file(&self, path: &str) -> Result<bool, String> {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(_) => return Ok(false), // 不存在视为未删除
        };
        if resolved.is_dir() {
            return Err("Refusing to delete a directory with this helper".to_string());
        }
        std::fs::remove_file(&resolved).map_err(|e| format!("Delete failed: {e}"))?;
        Ok(true)
    }
}

/// read_file 工具：读取沙箱内文件内容
pub struct ReadFileTool {
    fs: SafeFs,
}

impl ReadFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read file contents. Args: {\"path\": \"file path relative to workspace\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: ReadFileArgs = bind_args(&args)?;
        tracing::info!(path = %args.path, "read_file tool execute");
        self.fs.read_file(&args.path).map_err(ToolError::Failed)
    }
}

/// list_dir 工具：列出沙箱内目录
pub struct ListDirTool {
    fs: SafeFs,
}

impl ListDirTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

fn default_path() -> String {
    ".".to_string()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ListDirArgs {
    #[serde(default = "default_path")]
    path: String,
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List directory. Args: {\"path\": \"directory path, default '.'\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: ListDirArgs = bind_args(&args)?;
        tracing::info!(path = %args.path, "list_dir tool execute");
        let entries = self.fs.list_dir(&args.path).map_err(ToolError::Failed)?;
        Ok(entries.join("\n"))
    }
}

/// write_file 工具：写入沙箱内文件，默认拒绝覆盖
pub struct WriteFileTool {
    fs: SafeFs,
}

impl WriteFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteFileArgs {
    path: String,
    content: String,
    #[serde(default)]
    allow_overwrite: bool,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write a text file (refuses to overwrite unless allow_overwrite). Args: {\"path\": \"...\", \"content\": \"...\", \"allow_overwrite\": false}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: WriteFileArgs = bind_args(&args)?;
        tracing::info!(path = %args.path, "write_file tool execute");
        let written = self
            .fs
            .write_file(&args.path, &args.content, args.allow_overwrite)
            .map_err(ToolError::Failed)?;
        Ok(written.display().to_string())
    }
}

/// delete_file 工具：删除沙箱内文件，必须 confirm
pub struct DeleteFileTool {
    fs: SafeFs,
}

impl DeleteFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteFileArgs {
    path: String,
    #[serde(default)]
    confirm: bool,
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file (requires confirm=true). Args: {\"path\": \"...\", \"confirm\": true}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: DeleteFileArgs = bind_args(&args)?;
        if !args.confirm {
            return Err(ToolError::Failed(
                "Deletion requires confirm=true to proceed".to_string(),
            ));
        }
        tracing::info!(path = %args.path, "delete_file tool execute");
        let deleted = self.fs.delete_file(&args.path).map_err(ToolError::Failed)?;
        Ok(if deleted { "deleted" } else { "not_found" }.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SafeFs) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let fs = SafeFs::new(dir.path());
        (dir, fs)
    }

    #[test]
    fn read_and_list() {
        let (_dir, fs) = sandbox();
        assert_eq!(fs.read_file("a.txt").unwrap(), "hello");
        assert_eq!(fs.list_dir(".").unwrap(), vec!["a.txt".to_string()]);
    }

    #[test]
    fn path_escape_is_rejected() {
        let (_dir, fs) = sandbox();
        assert!(fs.read_file("../../etc/passwd").is_err());
    }

    #[test]
    fn write_refuses_overwrite_without_flag() {
        let (_dir, fs) = sandbox();
        assert!(fs.write_file("a.txt", "new", false).is_err());
        assert_eq!(fs.read_file("a.txt").unwrap(), "hello");
        fs.write_file("a.txt", "new", true).unwrap();
        assert_eq!(fs.read_file("a.txt").unwrap(), "new");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let (_dir, fs) = sandbox();
        fs.write_file("nested/deep/b.txt", "x", false).unwrap();
        assert_eq!(fs.read_file("nested/deep/b.txt").unwrap(), "x");
    }

    #[tokio::test]
    async fn delete_requires_confirm() {
        let (dir, _fs) = sandbox();
        let tool = DeleteFileTool::new(dir.path());
        let err = tool
            .execute(serde_json::json!({ "path": "a.txt" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));

        let out = tool
            .execute(serde_json::json!({ "path": "a.txt", "confirm": true }))
            .await
            .unwrap();
        assert_eq!(out, "deleted");

        let out = tool
            .execute(serde_json::json!({ "path": "a.txt", "confirm": true }))
            .await
            .unwrap();
        assert_eq!(out, "not_found");
    }
}
