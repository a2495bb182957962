//! Pin traces for the simulator.
//!
//! One event per line: `<ms> <button> <level>`, e.g. `120 B low`. Levels are
//! `high`/`low` (or `1`/`0`). `#` starts a comment. Times must not go
//! backwards. A pin keeps its level until the next event for it; all pins
//! start high (released, with pull-ups).

use anyhow::{bail, Context, Result};
use footboard_core::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub at: u32,
    pub role: Role,
    pub level: bool,
}

pub fn parse_trace(input: &str) -> Result<Vec<TraceEvent>> {
    let mut events: Vec<TraceEvent> = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let event = parse_line(line).with_context(|| format!("line {}", line_num + 1))?;

        if let Some(last) = events.last() {
            if event.at < last.at {
                bail!(
                    "line {}: time {}ms is before previous event at {}ms",
                    line_num + 1,
                    event.at,
                    last.at
                );
            }
        }
        events.push(event);
    }

    Ok(events)
}

fn parse_line(line: &str) -> Result<TraceEvent> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [at, role, level] = fields.as_slice() else {
        bail!("expected `<ms> <button> <level>`, got {:?}", line);
    };

    let at = at
        .trim_end_matches("ms")
        .parse::<u32>()
        .with_context(|| format!("invalid time {:?}", at))?;

    let role = match role.to_ascii_uppercase().as_str() {
        "A" => Role::A,
        "B" => Role::B,
        "C" => Role::C,
        other => bail!("unknown button {:?} (expected A, B or C)", other),
    };

    let level = match level.to_ascii_lowercase().as_str() {
        "high" | "1" => true,
        "low" | "0" => false,
        other => bail!("unknown level {:?} (expected high or low)", other),
    };

    Ok(TraceEvent { at, role, level })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_and_comments() {
        let trace = "\
# press and release A
0 A low
50ms a high   # released

120 C 0
";
        let events = parse_trace(trace).unwrap();
        assert_eq!(
            events,
            vec![
                TraceEvent { at: 0, role: Role::A, level: false },
                TraceEvent { at: 50, role: Role::A, level: true },
                TraceEvent { at: 120, role: Role::C, level: false },
            ]
        );
    }

    #[test]
    fn rejects_unknown_button() {
        let err = parse_trace("0 D low").unwrap_err();
        assert!(format!("{:#}", err).contains("unknown button"));
    }

    #[test]
    fn rejects_time_going_backwards() {
        let err = parse_trace("10 A low\n5 A high").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_missing_fields() {
        let err = parse_trace("10 A").unwrap_err();
        assert!(format!("{:#}", err).starts_with("line 1"));
    }
}
