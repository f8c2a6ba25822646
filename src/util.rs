use std::fs::File;
use std::io;
use std::path::Path;

use pulldown_cmark::escape::escape_html;

/// Opens `path`, annotating any failure with the kind of file we were trying
/// to open (e.g., `project` or `theme`).
pub fn open(path: &Path, kind: &str) -> io::Result<File> {
    File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Opening {} file `{}`: {}", kind, path.display(), e),
        )
    })
}

/// Escapes `s` for use in HTML text or a double-quoted attribute value.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing into a `String` never fails
    let _ = escape_html(&mut out, s);
    out
}
