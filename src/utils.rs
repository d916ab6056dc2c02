use crate::error::{EdfError, Result};

/// 非本地化的整数解析（避免受系统locale影响）
///
/// The field is trimmed first; an empty or non-numeric field is an error.
pub fn parse_int_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| EdfError::NumericParseFailure {
        field,
        value: raw.to_string(),
    })
}

/// 非本地化的浮点数解析
pub fn parse_float_field(field: &'static str, raw: &str) -> Result<f64> {
    let value = raw.trim().parse::<f64>().map_err(|_| EdfError::NumericParseFailure {
        field,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(EdfError::NumericParseFailure {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Renders a float for a fixed-width header field.
///
/// Integral values are written without a decimal point. Other values use the
/// shortest round-trip text and fall back to fewer fractional digits until the
/// text fits `width`, down to a rounded integer. The decimal separator is always `.`.
pub fn format_float_field(field: &'static str, value: f64, width: usize) -> Result<String> {
    let overflow = || EdfError::FieldOverflow {
        field,
        width,
        value: value.to_string(),
    };

    if !value.is_finite() {
        return Err(overflow());
    }

    if value.fract() == 0.0 {
        // -0.0 也写成 "0"
        let text = format!("{}", value.abs() as u64);
        let text = if value < 0.0 && value != 0.0 { format!("-{}", text) } else { text };
        return if text.len() <= width { Ok(text) } else { Err(overflow()) };
    }

    let shortest = format!("{}", value);
    if shortest.len() <= width {
        return Ok(shortest);
    }

    // 精度降到 0 时退化为四舍五入的整数
    for precision in (0..width).rev() {
        let fixed = format!("{:.*}", precision, value);
        let fixed = if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.')
        } else {
            fixed.as_str()
        };
        if fixed == "-0" {
            return Ok("0".to_string());
        }
        if fixed.len() <= width {
            return Ok(fixed.to_string());
        }
    }

    Err(overflow())
}

/// 工具函数：将字符串转换为 7-bit ASCII，非 ASCII 替换为 '_'
pub fn to_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect()
}

/// Strips trailing spaces and NUL padding from a raw byte field.
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Returns a copy of `values` without the element at `index`.
pub fn without_index<T: Clone>(values: &[T], index: usize) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Returns a copy of `values` with `value` inserted at `index`.
pub fn with_inserted<T: Clone>(values: &[T], index: usize, value: T) -> Vec<T> {
    let index = index.min(values.len());
    let mut result = Vec::with_capacity(values.len() + 1);
    result.extend_from_slice(&values[..index]);
    result.push(value);
    result.extend_from_slice(&values[index..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_field() {
        assert_eq!(parse_int_field::<i32>("digital min", "-32768  ").unwrap(), -32768);
        assert_eq!(parse_int_field::<usize>("samples", "  256").unwrap(), 256);
        assert!(matches!(
            parse_int_field::<usize>("samples", "        "),
            Err(EdfError::NumericParseFailure { field: "samples", .. })
        ));
        assert!(parse_int_field::<i32>("digital min", "12.5").is_err());
    }

    #[test]
    fn test_parse_float_field() {
        assert_eq!(parse_float_field("duration", "0.5     ").unwrap(), 0.5);
        assert_eq!(parse_float_field("duration", "+1").unwrap(), 1.0);
        assert!(parse_float_field("duration", "abc").is_err());
        assert!(parse_float_field("duration", "NaN").is_err());
    }

    #[test]
    fn test_format_float_field() {
        assert_eq!(format_float_field("x", 1.0, 8).unwrap(), "1");
        assert_eq!(format_float_field("x", -200.0, 8).unwrap(), "-200");
        assert_eq!(format_float_field("x", -0.0, 8).unwrap(), "0");
        assert_eq!(format_float_field("x", 0.00006, 8).unwrap(), "0.00006");
        assert_eq!(format_float_field("x", -3276.8, 8).unwrap(), "-3276.8");
        assert_eq!(format_float_field("x", 1.0 / 3.0, 8).unwrap(), "0.333333");
        assert!(matches!(
            format_float_field("x", 123456789.0, 8),
            Err(EdfError::FieldOverflow { width: 8, .. })
        ));
        assert!(format_float_field("x", f64::NAN, 8).is_err());

        // 小数位放不下时四舍五入为整数
        assert_eq!(format_float_field("x", 1234567.5, 8).unwrap(), "1234568");
        assert_eq!(format_float_field("x", -123456.7, 8).unwrap(), "-123457");
        assert_eq!(format_float_field("x", 1234560.25, 8).unwrap(), "1234560");
    }

    #[test]
    fn test_trim_padding() {
        assert_eq!(trim_padding(b"abc  \0 "), b"abc");
        assert_eq!(trim_padding(b"    "), b"");
    }

    #[test]
    fn test_without_and_with_index() {
        let values = vec!["a", "b", "c"];
        let removed = without_index(&values, 1);
        assert_eq!(removed, vec!["a", "c"]);
        assert_eq!(with_inserted(&removed, 1, "b"), values);
        assert_eq!(with_inserted(&removed, 9, "z"), vec!["a", "c", "z"]);
    }
}
