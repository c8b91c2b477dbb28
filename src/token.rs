//! WAQI access token loading
//!
//! The token comes from the command line or environment when given, otherwise
//! from a token file. If the file is missing or empty the user is prompted
//! once and the answer is written back to the file.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;

/// Errors that can occur when obtaining the token
#[derive(Debug, Error)]
pub enum TokenError {
    /// Reading the token file, prompting, or saving the token failed
    #[error("Token I/O failed: {0}")]
    Io(#[from] io::Error),

    /// No token was provided
    #[error("API token is empty")]
    Empty,
}

/// Returns the API token
///
/// An explicit, non-empty token wins. Otherwise the file at `token_path` is
/// read; when it is missing or empty, the token is read from stdin and saved.
pub fn load_token(explicit: Option<&str>, token_path: &Path) -> Result<String, TokenError> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    load_token_from(token_path, &mut input, &mut io::stderr())
}

/// Reads the token file, falling back to prompting on `input`
fn load_token_from(
    token_path: &Path,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<String, TokenError> {
    match fs::read_to_string(token_path) {
        Ok(content) => {
            let token = content.trim();
            if !token.is_empty() {
                tracing::info!(path = %token_path.display(), "API token loaded");
                return Ok(token.to_string());
            }
            tracing::warn!(
                path = %token_path.display(),
                "Token file is empty, prompting for API token"
            );
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %token_path.display(),
                "Token file not found, prompting for API token"
            );
        }
        Err(e) => return Err(e.into()),
    }

    write!(prompt, "Please paste your AQI API token: ")?;
    prompt.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    if let Some(parent) = token_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(token_path, token)?;
    tracing::info!(path = %token_path.display(), "API token saved");

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_token_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_key.secret");
        fs::write(&path, "from-file").unwrap();

        let token = load_token(Some("  from-flag \n"), &path).unwrap();
        assert_eq!(token, "from-flag");
    }

    #[test]
    fn test_token_read_from_file_and_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_key.secret");
        fs::write(&path, "abc123\n").unwrap();

        let mut input = Cursor::new(Vec::<u8>::new());
        let token = load_token_from(&path, &mut input, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn test_missing_file_prompts_and_saves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets").join("api_key.secret");

        let mut input = Cursor::new(b"typed-token\n".to_vec());
        let mut prompt = Vec::<u8>::new();
        let token = load_token_from(&path, &mut input, &mut prompt).unwrap();

        assert_eq!(token, "typed-token");
        assert_eq!(fs::read_to_string(&path).unwrap(), "typed-token");
        assert!(String::from_utf8(prompt).unwrap().contains("API token"));
    }

    #[test]
    fn test_empty_file_prompts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_key.secret");
        fs::write(&path, "   \n").unwrap();

        let mut input = Cursor::new(b"second-try\n".to_vec());
        let token = load_token_from(&path, &mut input, &mut Vec::<u8>::new()).unwrap();

        assert_eq!(token, "second-try");
    }

    #[test]
    fn test_empty_answer_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_key.secret");

        let mut input = Cursor::new(b"\n".to_vec());
        let result = load_token_from(&path, &mut input, &mut Vec::<u8>::new());

        assert!(matches!(result, Err(TokenError::Empty)));
        assert!(!path.exists());
    }
}
