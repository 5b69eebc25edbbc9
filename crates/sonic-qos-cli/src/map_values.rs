//! Parsing of map key lists such as `0,2-4,7`.

use crate::error::{CliError, CliResult};

/// Parses a comma separated list of keys and inclusive ranges.
///
/// Every key must lie in `[0, max)`; a key listed twice is rejected.
/// Keys are returned in the order given.
pub fn parse_map_keys(name: &str, arg: &str, max: u32) -> CliResult<Vec<String>> {
    let out_of_range = || {
        CliError::invalid(format!(
            "Invalid {} value {}, value should be in range of 0-{}.",
            name,
            arg,
            max.saturating_sub(1)
        ))
    };
    let parse = |s: &str| -> CliResult<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(out_of_range());
        }
        match s.parse::<u32>() {
            Ok(n) if n < max => Ok(n),
            _ => Err(out_of_range()),
        }
    };

    let mut keys: Vec<String> = Vec::new();
    for item in arg.split(',') {
        let (start, end, is_range) = match item.split_once('-') {
            Some((start, end)) => (parse(start)?, parse(end)?, true),
            None => {
                let n = parse(item)?;
                (n, n, false)
            }
        };
        if start > end {
            return Err(out_of_range());
        }

        for n in start..=end {
            let key = n.to_string();
            if keys.contains(&key) {
                // Only the single value form ends with a period.
                let period = if is_range { "" } else { "." };
                return Err(CliError::invalid(format!(
                    "{} value {} is repeated{}",
                    name, key, period
                )));
            }
            keys.push(key);
        }
    }

    Ok(keys)
}
