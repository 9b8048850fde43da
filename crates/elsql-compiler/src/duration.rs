//! Go-style duration literal parsing for the `duration("...")` built-in.
//!
//! Accepts the Go `time.ParseDuration` grammar: an optional sign followed by
//! one or more `<number><unit>` pairs (`"1h30m"`, `"300ms"`, `"1.5h"`, ...).
//! Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SEC: i128 = 1_000_000_000;
const NANOS_PER_MIN: i128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MIN;

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a Go-style duration literal into total nanoseconds.
fn parse_nanos(literal: &str) -> Option<i128> {
    let mut chars = literal.chars().peekable();
    let negative = match chars.peek() {
        Some('-') => {
            chars.next();
            true
        }
        Some('+') => {
            chars.next();
            false
        }
        _ => false,
    };

    let mut total: i128 = 0;
    let mut saw_component = false;

    while chars.peek().is_some() {
        let mut number = String::new();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
            number.push(chars.next().unwrap());
        }
        if number.is_empty() {
            return None;
        }

        let mut unit = String::new();
        while matches!(chars.peek(), Some(c) if !c.is_ascii_digit() && *c != '.') {
            unit.push(chars.next().unwrap());
        }

        let multiplier = unit_nanos(&unit)?;
        let value: f64 = number.parse().ok()?;
        total += (value * multiplier as f64).round() as i128;
        saw_component = true;
    }

    if !saw_component {
        return None;
    }

    Some(if negative { -total } else { total })
}

/// Choose the coarsest of HOUR/MINUTE/SECOND/MILLISECOND whose value is
/// exact, falling back to a truncated MICROSECOND count.
fn coarsest_unit(total_ns: i128) -> (i128, &'static str) {
    if total_ns % NANOS_PER_HOUR == 0 {
        (total_ns / NANOS_PER_HOUR, "HOUR")
    } else if total_ns % NANOS_PER_MIN == 0 {
        (total_ns / NANOS_PER_MIN, "MINUTE")
    } else if total_ns % NANOS_PER_SEC == 0 {
        (total_ns / NANOS_PER_SEC, "SECOND")
    } else if total_ns % NANOS_PER_MILLI == 0 {
        (total_ns / NANOS_PER_MILLI, "MILLISECOND")
    } else {
        (total_ns / NANOS_PER_MICRO, "MICROSECOND")
    }
}

/// Translate a duration literal into `INTERVAL N <UNIT>`, or `None` if it
/// does not parse as a Go-style duration.
pub fn lower_duration_literal(literal: &str) -> Option<String> {
    let total_ns = parse_nanos(literal)?;
    let (count, unit) = coarsest_unit(total_ns);
    Some(format!("INTERVAL {count} {unit}"))
}
