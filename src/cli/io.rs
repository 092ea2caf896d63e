//! JSON output for CLI commands
//!
//! One JSON object per line on stdout, UTF-8 only.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a JSON value to any writer, newline-terminated
pub fn write_json_to<W: Write, T: Serialize>(mut out: W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Write a JSON value to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    write_json_to(io::stdout().lock(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_line() {
        let mut buf = Vec::new();
        write_json_to(&mut buf, &json!({"status": "ok"})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"status\":\"ok\"}\n");
    }
}
