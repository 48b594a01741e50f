//! Line observations from input files
//!
//! Both input formats produce `(level, timestamp_ms)`
//! observations of the receiver line. Level changes are found
//! later by the [`EdgeTimer`](msftime::EdgeTimer).

use std::io::{BufRead, Read};

use anyhow::{anyhow, Context};
use byteorder::ReadBytesExt;
use log::{error, warn};

use msftime::Level;

/// Observations from text input
///
/// Each line holds `<level> <timestamp_ms>`. Blank lines and
/// `#` comments are skipped. Malformed lines, including lines
/// which are not UTF-8, are logged and skipped. Reading stops
/// at end of input or at the first I/O error, which is logged.
pub fn text_observations<R>(mut input: R) -> impl Iterator<Item = (Level, u64)>
where
    R: BufRead,
{
    let mut buf = Vec::with_capacity(64);
    let mut num: usize = 0;
    std::iter::from_fn(move || loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(err) => {
                error!("input line {}: read failed: {}", num + 1, err);
                return None;
            }
        }
        num += 1;

        let parsed = std::str::from_utf8(&buf)
            .context("line is not UTF-8")
            .and_then(parse_line);
        match parsed {
            Ok(Some(obs)) => return Some(obs),
            Ok(None) => {}
            Err(err) => warn!("input line {}: {:#}", num, err),
        }
    })
}

/// Observations from raw 8-bit samples
///
/// Each byte is one sample of the line, taken at `rate` Hz.
/// Any non-zero byte is high. Reading stops at end of input.
pub fn raw_observations<R>(mut input: R, rate: u32) -> impl Iterator<Item = (Level, u64)>
where
    R: Read,
{
    let rate = u64::from(rate.max(1));
    let mut count: u64 = 0;
    std::iter::from_fn(move || {
        let sample = input.read_u8().ok()?;
        let timestamp_ms = count.saturating_mul(1000) / rate;
        count += 1;
        Some((Level::from(sample != 0), timestamp_ms))
    })
}

// Parse one line of text input
//
// Returns `Ok(None)` for lines with nothing to observe.
fn parse_line(line: &str) -> Result<Option<(Level, u64)>, anyhow::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let level = fields.next().ok_or_else(|| anyhow!("missing level"))?;
    let timestamp = fields
        .next()
        .ok_or_else(|| anyhow!("missing timestamp"))?;
    if fields.next().is_some() {
        return Err(anyhow!("trailing data after timestamp"));
    }

    let level = match level.to_ascii_lowercase().as_str() {
        "0" | "l" | "low" => Level::Low,
        "1" | "h" | "high" => Level::High,
        other => return Err(anyhow!("unknown level \"{}\"", other)),
    };
    let timestamp = timestamp
        .parse::<u64>()
        .with_context(|| format!("bad timestamp \"{}\"", timestamp))?;

    Ok(Some((level, timestamp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("0 1000").unwrap(), Some((Level::Low, 1000)));
        assert_eq!(parse_line("  HIGH\t42 ").unwrap(), Some((Level::High, 42)));
        assert_eq!(parse_line("l 7").unwrap(), Some((Level::Low, 7)));
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("# level ts").unwrap(), None);

        assert!(parse_line("2 1000").is_err());
        assert!(parse_line("1").is_err());
        assert!(parse_line("1 -5").is_err());
        assert!(parse_line("1 5 6").is_err());
    }

    #[test]
    fn test_text_observations() {
        let input = "# sample\n1 0\n0 500\n\nbogus\n1 1000\n";
        let obs: Vec<_> = text_observations(input.as_bytes()).collect();
        assert_eq!(
            obs,
            vec![(Level::High, 0), (Level::Low, 500), (Level::High, 1000)]
        );
    }

    #[test]
    fn test_text_observations_skip_bad_utf8() {
        let input: &[u8] = b"1 0\n0 500\n\xff\xfe garbage\n1 1000\n0 1100";
        let obs: Vec<_> = text_observations(input).collect();
        assert_eq!(
            obs,
            vec![
                (Level::High, 0),
                (Level::Low, 500),
                (Level::High, 1000),
                (Level::Low, 1100)
            ]
        );
    }

    #[test]
    fn test_raw_observations() {
        let input: &[u8] = &[0, 0, 1, 255, 0];
        let obs: Vec<_> = raw_observations(input, 100).collect();
        assert_eq!(
            obs,
            vec![
                (Level::Low, 0),
                (Level::Low, 10),
                (Level::High, 20),
                (Level::High, 30),
                (Level::Low, 40)
            ]
        );
    }
}
