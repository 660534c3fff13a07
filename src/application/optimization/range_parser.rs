//! Range expressions typed into the optimizer.
//!
//! Accepted forms, tried in this order:
//!
//! * `a,b,c` explicit list
//! * `start-end;step=s` stepped range, inclusive, direction from the bounds
//! * `start-end` integers count by one, floats give 10 evenly spaced points
//! * `v` single value
//!
//! Empty text parses to an empty list.

use crate::domain::errors::RangeParseError;

/// Longest sequence a single expression may expand to
pub const MAX_RANGE_LEN: usize = 1_000_000;

const FLOAT_SAMPLES: usize = 10;
const STEP_EPSILON: f64 = 1e-9;

/// Value types a range can expand to.
pub trait RangeValue: Copy {
    /// List item. Integers accept decimal text and truncate it.
    fn parse_item(raw: &str) -> Option<Self>;

    /// Range bound or single value.
    fn parse_bound(raw: &str) -> Option<Self>;

    /// Number of values from `start` to `end`.
    fn span_len(start: Self, end: Self, step: Option<f64>) -> usize;

    fn span_at(start: Self, end: Self, step: Option<f64>, index: usize) -> Self;
}

impl RangeValue for f64 {
    fn parse_item(raw: &str) -> Option<Self> {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn parse_bound(raw: &str) -> Option<Self> {
        Self::parse_item(raw)
    }

    fn span_len(start: Self, end: Self, step: Option<f64>) -> usize {
        match step {
            Some(step) => {
                let step = step.abs();
                if step == 0.0 {
                    return 0;
                }
                ((end - start).abs() / step + STEP_EPSILON).floor() as usize + 1
            }
            None if start == end => 1,
            None => FLOAT_SAMPLES,
        }
    }

    fn span_at(start: Self, end: Self, step: Option<f64>, index: usize) -> Self {
        let i = index as f64;
        match step {
            Some(step) => {
                let direction = if end < start { -1.0 } else { 1.0 };
                start + direction * i * step.abs()
            }
            None => start + i * (end - start) / (FLOAT_SAMPLES - 1) as f64,
        }
    }
}

impl RangeValue for u32 {
    fn parse_item(raw: &str) -> Option<Self> {
        let value = raw.parse::<f64>().ok()?.trunc();
        (value.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&value)).then_some(value as u32)
    }

    fn parse_bound(raw: &str) -> Option<Self> {
        raw.parse::<u32>().ok()
    }

    fn span_len(start: Self, end: Self, step: Option<f64>) -> usize {
        let diff = u64::from(start.abs_diff(end));
        let step = match step {
            Some(step) => step.abs().trunc() as u64,
            None => 1,
        };
        if step == 0 {
            return 0;
        }
        usize::try_from(diff / step + 1).unwrap_or(usize::MAX)
    }

    fn span_at(start: Self, end: Self, step: Option<f64>, index: usize) -> Self {
        let step = step.map_or(1, |s| s.abs().trunc() as u64);
        let offset = index as u64 * step;
        // offset never exceeds |end - start|, so the result stays in range
        if end < start {
            (u64::from(start) - offset) as u32
        } else {
            (u64::from(start) + offset) as u32
        }
    }
}

/// Parses a range expression into an explicit list of values.
///
/// ```
/// use dicelab::application::optimization::range_parser::parse_range;
///
/// assert_eq!(parse_range::<f64>("10-20;step=5").unwrap(), vec![10.0, 15.0, 20.0]);
/// assert_eq!(parse_range::<u32>("3-5").unwrap(), vec![3, 4, 5]);
/// ```
pub fn parse_range<T: RangeValue>(text: &str) -> Result<Vec<T>, RangeParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if text.contains(',') {
        return text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                T::parse_item(part).ok_or_else(|| malformed(text, format!("bad list item '{part}'")))
            })
            .collect();
    }

    let (body, step) = match text.split_once(';') {
        Some((body, option)) => (body.trim(), Some(parse_step(text, option)?)),
        None => (text, None),
    };

    let Some((lo, hi)) = body.split_once('-') else {
        if step.is_some() {
            return Err(malformed(text, "step given without a start-end range"));
        }
        return T::parse_bound(body)
            .map(|v| vec![v])
            .ok_or_else(|| malformed(text, "not a number"));
    };

    let start = T::parse_bound(lo.trim())
        .ok_or_else(|| malformed(text, format!("bad range start '{}'", lo.trim())))?;
    let end = T::parse_bound(hi.trim())
        .ok_or_else(|| malformed(text, format!("bad range end '{}'", hi.trim())))?;

    let len = T::span_len(start, end, step);
    if len > MAX_RANGE_LEN {
        return Err(RangeParseError::TooLarge {
            input: text.to_string(),
            len,
            max: MAX_RANGE_LEN,
        });
    }
    Ok((0..len).map(|i| T::span_at(start, end, step, i)).collect())
}

/// Untyped entry point: integer ranges come back widened to `f64`.
pub fn parse_numeric_range(text: &str, integer: bool) -> Result<Vec<f64>, RangeParseError> {
    if integer {
        Ok(parse_range::<u32>(text)?.into_iter().map(f64::from).collect())
    } else {
        parse_range::<f64>(text)
    }
}

fn parse_step(text: &str, option: &str) -> Result<f64, RangeParseError> {
    let (key, value) = option
        .split_once('=')
        .ok_or_else(|| malformed(text, "expected ';step=<value>'"))?;
    if !key.trim().eq_ignore_ascii_case("step") {
        return Err(malformed(text, format!("unknown option '{}'", key.trim())));
    }
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| malformed(text, format!("bad step '{}'", value.trim())))
}

fn malformed(input: &str, reason: impl Into<String>) -> RangeParseError {
    RangeParseError::Malformed {
        input: input.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_float_range() {
        assert_eq!(parse_range::<f64>("10-20;step=5").unwrap(), vec![10.0, 15.0, 20.0]);
        assert_eq!(parse_range::<f64>("20-10;step=5").unwrap(), vec![20.0, 15.0, 10.0]);
        // Sign of the step is ignored, direction comes from the bounds
        assert_eq!(parse_range::<f64>("10-20;step=-5").unwrap(), vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_stepped_range_tolerates_float_error() {
        let values = parse_range::<f64>("0.1-0.3;step=0.1").unwrap();
        assert_eq!(values.len(), 3);
        assert!((values[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_list() {
        assert_eq!(parse_range::<f64>("25,30,40").unwrap(), vec![25.0, 30.0, 40.0]);
        assert_eq!(parse_range::<f64>(" 1 , ,2 ").unwrap(), vec![1.0, 2.0]);
        assert_eq!(parse_range::<u32>("3.7,4").unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_integer_ranges_are_inclusive() {
        assert_eq!(parse_range::<u32>("3-5").unwrap(), vec![3, 4, 5]);
        assert_eq!(parse_range::<u32>("5-3").unwrap(), vec![5, 4, 3]);
        assert_eq!(parse_range::<u32>("2-10;step=4").unwrap(), vec![2, 6, 10]);
        assert_eq!(parse_range::<u32>("2-9;step=4.9").unwrap(), vec![2, 6]);
    }

    #[test]
    fn test_float_range_without_step_samples_ten_points() {
        let values = parse_range::<f64>("0-9").unwrap();
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], 0.0);
        assert!((values[9] - 9.0).abs() < 1e-12);
        assert_eq!(parse_range::<f64>("2-2").unwrap(), vec![2.0]);
    }

    #[test]
    fn test_single_value_and_empty() {
        assert_eq!(parse_range::<f64>("78").unwrap(), vec![78.0]);
        assert_eq!(parse_range::<u32>(" 4 ").unwrap(), vec![4]);
        assert!(parse_range::<f64>("").unwrap().is_empty());
        assert!(parse_range::<u32>("   ").unwrap().is_empty());
    }

    #[test]
    fn test_zero_step_is_empty() {
        assert!(parse_range::<f64>("10-20;step=0").unwrap().is_empty());
        assert!(parse_range::<u32>("1-5;step=0.5").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_input() {
        for text in ["abc", "1-x", "1-2;stride=3", "1-2;step", "1-2;step=fast", "5;step=1"] {
            assert!(
                matches!(parse_range::<f64>(text), Err(RangeParseError::Malformed { .. })),
                "{text} should be malformed"
            );
        }
        assert!(parse_range::<u32>("3.5").is_err());
        assert!(parse_range::<u32>("a,b").is_err());
    }

    #[test]
    fn test_numeric_entry_point() {
        assert_eq!(parse_numeric_range("3-5", true).unwrap(), vec![3.0, 4.0, 5.0]);
        assert_eq!(parse_numeric_range("3-5", false).unwrap().len(), 10);
        assert!(parse_numeric_range("3.5-5", true).is_err());
    }

    #[test]
    fn test_oversized_range_is_rejected() {
        let err = parse_range::<u32>("0-10000000").unwrap_err();
        assert_eq!(
            err,
            RangeParseError::TooLarge {
                input: "0-10000000".to_string(),
                len: 10_000_001,
                max: MAX_RANGE_LEN,
            }
        );
        assert!(parse_range::<f64>("0-1;step=0.0000001").is_err());
    }
}
