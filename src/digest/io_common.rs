use std::path::Path;

use crate::digest::*;

/// Output path that stands for the standard output.
pub const STDOUT: &str = "stdout";

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn resolve_path(root: &Path, path: &str) -> String {
    if path == STDOUT || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

pub fn read_text_file(path: &str) -> DigestResult<String> {
    std::fs::read_to_string(path).context(OpeningFileSnafu { path })
}

/// Writes to the file, or prints if the path is `stdout`.
pub fn write_output(path: &str, content: &str) -> DigestResult<()> {
    if path == STDOUT {
        println!("{}", content);
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context(WritingFileSnafu { path })?;
        }
    }
    std::fs::write(path, content).context(WritingFileSnafu { path })?;
    info!("write_output: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/a/b/survey.xlsx"), "survey.xlsx");
        assert_eq!(simplify_file_name("survey.csv"), "survey.csv");
    }

    #[test]
    fn relative_paths() {
        let root = Path::new("/data");
        assert_eq!(resolve_path(root, "in.csv"), "/data/in.csv");
        assert_eq!(resolve_path(root, "/tmp/in.csv"), "/tmp/in.csv");
        assert_eq!(resolve_path(root, "stdout"), "stdout");
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_text_file("/this/file/does/not/exist.txt"),
            Err(DigestError::OpeningFile { .. })
        ));
    }
}
