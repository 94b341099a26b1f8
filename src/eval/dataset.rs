use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One labelled image: its path and the name of the directory holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: String,
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

fn walk(dir: &Path, out: &mut Vec<Sample>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let kind = entry.file_type()?;
        if kind.is_dir() {
            walk(&path, out)?;
        } else if kind.is_file() && is_jpeg(&path) {
            let label = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push(Sample { path, label });
        }
    }
    Ok(())
}

/// Recursively collects every `.jpg` / `.jpeg` file under `root`.
///
/// Expects one directory per class, named exactly like the class label;
/// each image is labelled with its immediate parent directory. Results are
/// sorted by path so runs are reproducible.
pub fn discover(root: impl AsRef<Path>) -> io::Result<Vec<Sample>> {
    let mut samples = Vec::new();
    walk(root.as_ref(), &mut samples)?;
    samples.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_come_from_parent_directories() {
        let root = std::env::temp_dir().join(format!("monkey-cnn-dataset-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("Mandril/nested")).unwrap();
        fs::create_dir_all(root.join("Red Howler")).unwrap();
        for file in ["Mandril/a.jpg", "Mandril/nested/b.JPEG", "Red Howler/c.jpeg", "Red Howler/notes.txt"] {
            fs::write(root.join(file), b"").unwrap();
        }

        let samples = discover(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        let found: Vec<(String, String)> = samples
            .iter()
            .map(|s| (s.path.file_name().unwrap().to_string_lossy().into_owned(), s.label.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("a.jpg".to_owned(), "Mandril".to_owned()),
                ("b.JPEG".to_owned(), "nested".to_owned()),
                ("c.jpeg".to_owned(), "Red Howler".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_io_error() {
        assert!(discover("/definitely/not/a/dataset/root").is_err());
    }
}
