//! Bounded decimal formatting
//!
//! Display glue (LCD text, debug screens) needs numbers as text without
//! heap allocation or `format!` machinery. Both functions write into a
//! caller-provided buffer and return the written length, or 0 when the
//! buffer is too small — never a partial write past the end.

/// Format an integer as decimal text
///
/// `leading_zeros` pads the digit count to at least that many digits;
/// `force_minus` prints the sign even for zero (used for values like
/// `-0.5` whose integer part alone loses the sign).
///
/// Returns the number of bytes written, or 0 when `buf` cannot hold the
/// result.
pub fn int_to_str(num: i32, buf: &mut [u8], leading_zeros: u8, force_minus: bool) -> usize {
    let negative = num < 0 || (num == 0 && force_minus);

    // digits in reverse; i32 never needs more than 10
    let mut digits = [0u8; 10];
    let mut magnitude = i64::from(num).unsigned_abs();
    let mut count = 0;
    loop {
        digits[count] = b'0' + (magnitude % 10) as u8;
        count += 1;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }

    let width = count.max(leading_zeros as usize);
    let total = width + usize::from(negative);
    if total > buf.len() {
        return 0;
    }

    let mut at = 0;
    if negative {
        buf[at] = b'-';
        at += 1;
    }
    for _ in count..width {
        buf[at] = b'0';
        at += 1;
    }
    for digit in (0..count).rev() {
        buf[at] = digits[digit];
        at += 1;
    }
    total
}

/// Format a float as decimal text with a fixed number of decimal places
///
/// Rounds half away from zero and carries into the integer part when the
/// fraction rounds over. `decimals` is capped at 7, past the precision an
/// f32 can carry. With `decimals` 0 no decimal point is written.
///
/// Returns the number of bytes written, or 0 when `buf` cannot hold the
/// result or `num` is not finite.
pub fn float_to_str(num: f32, buf: &mut [u8], decimals: u8) -> usize {
    if !num.is_finite() {
        return 0;
    }

    let decimals = decimals.min(7);
    let scale = 10_i64.pow(u32::from(decimals));
    let scaled = (f64::from(num.abs()) * scale as f64).round() as i64;

    let int_part = scaled / scale;
    let frac_part = scaled % scale;
    if int_part > i64::from(i32::MAX) {
        return 0;
    }

    let negative = num.is_sign_negative() && scaled != 0;
    let mut len = int_to_str(int_part as i32, buf, 0, negative);
    if len == 0 {
        return 0;
    }

    if decimals > 0 {
        if len >= buf.len() {
            return 0;
        }
        buf[len] = b'.';
        len += 1;

        let written = int_to_str(frac_part as i32, &mut buf[len..], decimals, false);
        if written == 0 {
            return 0;
        }
        len += written;
    }

    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt_int(num: i32, leading_zeros: u8, force_minus: bool) -> String {
        let mut buf = [0u8; 16];
        let len = int_to_str(num, &mut buf, leading_zeros, force_minus);
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }

    fn fmt_float(num: f32, decimals: u8) -> String {
        let mut buf = [0u8; 24];
        let len = float_to_str(num, &mut buf, decimals);
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }

    #[test]
    fn test_int_basic() {
        assert_eq!(fmt_int(0, 0, false), "0");
        assert_eq!(fmt_int(42, 0, false), "42");
        assert_eq!(fmt_int(-7, 0, false), "-7");
        assert_eq!(fmt_int(i32::MIN, 0, false), "-2147483648");
    }

    #[test]
    fn test_int_leading_zeros() {
        assert_eq!(fmt_int(7, 3, false), "007");
        assert_eq!(fmt_int(-7, 3, false), "-007");
        assert_eq!(fmt_int(1234, 2, false), "1234");
    }

    #[test]
    fn test_int_forced_minus() {
        assert_eq!(fmt_int(0, 0, true), "-0");
        assert_eq!(fmt_int(0, 2, true), "-00");
    }

    #[test]
    fn test_int_overflow_returns_zero() {
        let mut buf = [0u8; 3];
        assert_eq!(int_to_str(1234, &mut buf, 0, false), 0);
        assert_eq!(int_to_str(-42, &mut buf, 3, false), 0);
        assert_eq!(int_to_str(123, &mut buf, 0, false), 3);
    }

    #[test]
    fn test_float_basic() {
        assert_eq!(fmt_float(3.14159, 2), "3.14");
        assert_eq!(fmt_float(120.0, 1), "120.0");
        assert_eq!(fmt_float(120.0, 0), "120");
        assert_eq!(fmt_float(-0.5, 1), "-0.5");
    }

    #[test]
    fn test_float_rounding_carries() {
        assert_eq!(fmt_float(0.999, 2), "1.00");
        assert_eq!(fmt_float(-0.999, 2), "-1.00");
        assert_eq!(fmt_float(9.96, 1), "10.0");
    }

    #[test]
    fn test_float_pads_fraction() {
        assert_eq!(fmt_float(1.05, 2), "1.05");
        assert_eq!(fmt_float(2.5, 3), "2.500");
    }

    #[test]
    fn test_float_non_finite_and_overflow() {
        let mut buf = [0u8; 24];
        assert_eq!(float_to_str(f32::NAN, &mut buf, 2), 0);
        assert_eq!(float_to_str(f32::INFINITY, &mut buf, 2), 0);

        let mut tiny = [0u8; 3];
        assert_eq!(float_to_str(12.34, &mut tiny, 2), 0);
    }
}
