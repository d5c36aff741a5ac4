//! Output naming for rendered diagrams and converted documents.
//!
//! For a document `docs/guide.md` with two diagrams rendered as PNG into
//! `docs/images`:
//! - images are `docs/images/guide-diagram-1.png` and `guide-diagram-2.png`
//! - the blocks become `![Mermaid Diagram 1](images/guide-diagram-1.png)` and so on
//! - the converted document is `docs/guide-converted.md`

use std::path::{Component, Path, PathBuf};

/// Document name without directory and extension (`docs/guide.md` -> `guide`).
#[must_use]
pub fn document_base_name(document: &Path) -> String {
    document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Image filename for the 1-based diagram `index`.
#[must_use]
pub fn image_file_name(base_name: &str, index: usize, extension: &str) -> String {
    format!("{base_name}-diagram-{index}.{extension}")
}

/// Markdown image line that replaces the 1-based diagram `index`.
#[must_use]
pub fn image_reference(index: usize, path: &str) -> String {
    format!("![Mermaid Diagram {index}]({path})")
}

/// Path of the rewritten document, next to the original.
#[must_use]
pub fn converted_document_path(document: &Path) -> PathBuf {
    sibling_with_suffix(document, "converted")
}

/// Path of the auto-fixed copy of the original document, next to the original.
#[must_use]
pub fn fixed_document_path(document: &Path) -> PathBuf {
    sibling_with_suffix(document, "fixed")
}

fn sibling_with_suffix(document: &Path, suffix: &str) -> PathBuf {
    let dir = document.parent().unwrap_or(Path::new(""));
    dir.join(format!("{}-{suffix}.md", document_base_name(document)))
}

/// Path of `target` relative to the directory containing `document`.
///
/// Both paths are made absolute against the current directory first. The
/// result always uses `/` separators since it is embedded in markdown. When
/// no relative path exists (different drive prefixes), the absolute target
/// is returned.
#[must_use]
pub fn relative_reference(document: &Path, target: &Path) -> String {
    let document_dir = document.parent().unwrap_or(Path::new(""));
    let from = normalize(&absolute(document_dir));
    let to = normalize(&absolute(target));

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    if from_parts.first() != to_parts.first() {
        return to.to_string_lossy().replace('\\', "/");
    }

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat_n("..".to_owned(), from_parts.len() - common);
    let downs = to_parts[common..]
        .iter()
        .map(|part| part.as_os_str().to_string_lossy().into_owned());

    ups.chain(downs).collect::<Vec<_>>().join("/")
}

fn absolute(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return std::env::current_dir().unwrap_or_default();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_base_name() {
        assert_eq!(document_base_name(Path::new("docs/guide.md")), "guide");
        assert_eq!(document_base_name(Path::new("notes.markdown")), "notes");
        assert_eq!(document_base_name(Path::new("archive.v2.md")), "archive.v2");
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(image_file_name("guide", 1, "png"), "guide-diagram-1.png");
        assert_eq!(image_file_name("guide", 12, "jpeg"), "guide-diagram-12.jpeg");
    }

    #[test]
    fn test_image_reference() {
        assert_eq!(
            image_reference(3, "images/guide-diagram-3.png"),
            "![Mermaid Diagram 3](images/guide-diagram-3.png)"
        );
    }

    #[test]
    fn test_converted_document_path() {
        assert_eq!(
            converted_document_path(Path::new("docs/guide.md")),
            PathBuf::from("docs/guide-converted.md")
        );
        assert_eq!(
            converted_document_path(Path::new("test.md")),
            PathBuf::from("test-converted.md")
        );
    }

    #[test]
    fn test_fixed_document_path() {
        assert_eq!(
            fixed_document_path(Path::new("/work/notes.markdown")),
            PathBuf::from("/work/notes-fixed.md")
        );
    }

    #[test]
    fn test_relative_reference_subdirectory() {
        let reference = relative_reference(
            Path::new("/work/docs/guide.md"),
            Path::new("/work/docs/images/guide-diagram-1.png"),
        );

        assert_eq!(reference, "images/guide-diagram-1.png");
    }

    #[test]
    fn test_relative_reference_sibling_directory() {
        let reference = relative_reference(
            Path::new("/work/docs/guide.md"),
            Path::new("/work/assets/guide-diagram-1.png"),
        );

        assert_eq!(reference, "../assets/guide-diagram-1.png");
    }

    #[test]
    fn test_relative_reference_with_dot_components() {
        let reference = relative_reference(
            Path::new("/work/docs/./guide.md"),
            Path::new("/work/docs/../docs/images/./a.png"),
        );

        assert_eq!(reference, "images/a.png");
    }

    #[test]
    fn test_relative_reference_relative_inputs() {
        let reference = relative_reference(
            Path::new("test.md"),
            Path::new("./images/test-diagram-1.png"),
        );

        assert_eq!(reference, "images/test-diagram-1.png");
    }
}
