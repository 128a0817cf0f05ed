use std::path::{Path, PathBuf};

use ratatui::widgets::{Paragraph, Wrap};

/// Expands `~` and `$VARS` in a user-typed path. Unknown variables leave the
/// input untouched.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}

/// What the form shows next to the path input.
pub fn file_status_label(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "No file chosen".to_string();
    }
    expand_path(raw)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Rows `content` occupies once word-wrapped to `width` columns.
pub fn wrapped_rows(content: &str, width: u16) -> usize {
    Paragraph::new(content).wrap(Wrap { trim: false }).line_count(width)
}

/// Highest scroll offset that still fills a text area of `width` x
/// `view_height` cells (borders excluded).
pub fn calculate_max_scroll(content: &str, width: u16, view_height: u16) -> u16 {
    let rows = u16::try_from(wrapped_rows(content, width)).unwrap_or(u16::MAX);
    rows.saturating_sub(view_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_label_shows_file_name_or_placeholder() {
        assert_eq!(file_status_label(""), "No file chosen");
        assert_eq!(file_status_label("   "), "No file chosen");
        assert_eq!(file_status_label("/tmp/scans/blood_test.png"), "blood_test.png");
    }

    #[test]
    fn tilde_is_expanded() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/report.jpg"), home.join("report.jpg"));
    }

    #[test]
    fn unknown_variable_keeps_raw_path() {
        assert_eq!(
            expand_path("$MEDREPORT_SURELY_UNSET_VAR/x.png"),
            PathBuf::from("$MEDREPORT_SURELY_UNSET_VAR/x.png")
        );
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("a.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("scan")), "application/octet-stream");
    }

    #[test]
    fn max_scroll_only_when_content_overflows() {
        assert_eq!(calculate_max_scroll("a\nb", 40, 8), 0);
        let long = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(calculate_max_scroll(&long, 40, 8), 12);
    }

    #[test]
    fn single_wrapped_paragraph_can_scroll() {
        // 2000 columns of text on one logical line
        let explanation = "word ".repeat(400);
        assert!(wrapped_rows(&explanation, 20) >= 100);
        assert!(calculate_max_scroll(&explanation, 20, 8) >= 92);
        assert_eq!(calculate_max_scroll(&explanation, 0, 8), 0);
    }
}
