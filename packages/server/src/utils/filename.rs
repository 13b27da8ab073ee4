/// Name used when the client sends none or an unusable one.
pub const FALLBACK_FILENAME: &str = "image";

const MAX_FILENAME_CHARS: usize = 255;

/// Result of validating a flat filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters; the name ends up in multipart headers.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Turn a client-supplied multipart filename into a safe display name.
///
/// Browsers on some platforms send a full path (`C:\fakepath\cat.png`); only
/// the last component is kept. Anything that still fails validation falls back
/// to [`FALLBACK_FILENAME`].
pub fn upload_filename(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return FALLBACK_FILENAME.to_string();
    };

    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    match validate_flat_filename(last) {
        Ok(name) => name.chars().take(MAX_FILENAME_CHARS).collect(),
        Err(_) => FALLBACK_FILENAME.to_string(),
    }
}
