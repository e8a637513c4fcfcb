use std::io::{BufRead, Write};

use crate::error::CommaitError;

/// Read a streaming response line-by-line, echoing chunks to `echo` as they arrive.
pub fn read_stream_to_string<R, W, F>(
    reader: R,
    echo: &mut W,
    mut parse_line: F,
) -> Result<String, CommaitError>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<Option<String>, CommaitError>,
{
    let mut out = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(chunk) = parse_line(line)? {
            out.push_str(&chunk);
            write!(echo, "{}", chunk)?;
            echo.flush()?;
        }
    }

    if !out.is_empty() {
        writeln!(echo)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn joins_chunks_and_skips_blank_lines() {
        let input = Cursor::new("a\n\n b \nc\n");
        let mut echo = Vec::new();
        let out = read_stream_to_string(input, &mut echo, |line| {
            Ok((line != "c").then(|| line.to_uppercase()))
        })
        .unwrap();

        assert_eq!(out, "AB");
        assert_eq!(String::from_utf8(echo).unwrap(), "AB\n");
    }

    #[test]
    fn parse_errors_stop_the_stream() {
        let input = Cursor::new("ok\nbad\n");
        let mut echo = Vec::new();
        let err = read_stream_to_string(input, &mut echo, |line| {
            if line == "bad" {
                Err(CommaitError::EmptyMessage)
            } else {
                Ok(Some(line.to_string()))
            }
        })
        .unwrap_err();
        assert!(matches!(err, CommaitError::EmptyMessage));
    }
}
