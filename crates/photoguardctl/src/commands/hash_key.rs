//! Hash-key command - print the digest stored in `api_key_hash`

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use photoguard_runtime::hash_api_key;

pub fn execute(key: Option<&str>) -> Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => read_key(std::io::stdin().lock())?,
    };

    if key.is_empty() {
        bail!("API key must not be empty");
    }

    println!("{}", hash_api_key(&key));
    Ok(())
}

/// First line of `input`, without its line terminator
fn read_key(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read API key from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_key_strips_newline_only() {
        assert_eq!(read_key("s3cret\n".as_bytes()).unwrap(), "s3cret");
        assert_eq!(read_key(" padded \r\n".as_bytes()).unwrap(), " padded ");
        assert_eq!(read_key("".as_bytes()).unwrap(), "");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(execute(Some("")).is_err());
    }
}
