use std::path::{Path, PathBuf};

/// Sibling path for the `locale` copy of a document.
///
/// `guide.md` becomes `guide-es.md`; a fully upper-case stem gets an
/// upper-case suffix, so `README.md` becomes `README-ES.md`.
pub fn localized_file_name(path: &Path, locale: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let suffix = if stem == stem.to_uppercase() {
        locale.to_uppercase()
    } else {
        locale.to_lowercase()
    };

    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}-{}", stem, suffix),
    };
    path.with_file_name(name)
}
