//! Executable-path extraction from raw command lines.
//!
//! Raw command lines arrive exactly as the target runtime reported them, so
//! the first token has to be split off under the quoting convention of the
//! target platform: double quotes on both flavors, backslash escapes only on
//! the POSIX flavor, and extension stripping only on the Windows flavor.

/// Extracts the executable path token from a raw command line.
///
/// Returns `None` when the command line is empty or the extracted token
/// collapses to nothing.
pub fn extract_executable_path(command_line: &str, windows_style: bool) -> Option<String> {
    let trimmed = command_line.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    let path = if let Some(rest) = trimmed.strip_prefix('"') {
        // Quoted path: everything up to the closing quote. A command line
        // truncated before the closing quote still yields the partial path.
        match rest.find('"') {
            Some(end) => rest[..end].to_string(),
            None => rest.to_string(),
        }
    } else if windows_style {
        first_whitespace_token(trimmed)
    } else {
        posix_unquoted_token(trimmed)
    };

    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Derives a process name from an executable path.
///
/// The name is the final path segment; the extension is stripped only under
/// the Windows convention, matching how that platform reports process names.
pub fn process_name_from_path(path: &str, windows_style: bool) -> Option<String> {
    let separators: &[char] = if windows_style { &['\\', '/'] } else { &['/'] };
    let file_name = path
        .rsplit(separators)
        .find(|segment| !segment.is_empty())?;

    let name = if windows_style {
        match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        }
    } else {
        file_name
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn first_whitespace_token(input: &str) -> String {
    input
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// POSIX shells allow whitespace inside an unquoted token via backslash
/// escapes; the extracted path carries the escaped character unescaped.
fn posix_unquoted_token(input: &str) -> String {
    let mut token = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    token.push(escaped);
                }
            }
            c if c.is_whitespace() => break,
            c => token.push(c),
        }
    }
    token
}
