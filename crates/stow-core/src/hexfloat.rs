//! Locale-independent hexadecimal floating-point text.
//!
//! Floats are persisted as `[-]0x1.<hex>p<exp>` so the exact bit pattern
//! survives a save/load cycle on any host. Zero is `0x0p+0`, subnormals use
//! a `0x0.` lead with exponent `-1022`, infinities are `inf`, and NaNs are
//! `nan` or `nan(0x<payload>)` when the payload is not the canonical quiet
//! NaN.

const SIGN_BIT: u64 = 1 << 63;
const FRAC_MASK: u64 = (1 << 52) - 1;
const EXP_MASK: u64 = 0x7ff << 52;
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Format `value` as exact hexadecimal float text.
pub fn format_hex(value: f64) -> String {
    let bits = value.to_bits();
    let sign = if bits & SIGN_BIT != 0 { "-" } else { "" };
    let exp_field = ((bits & EXP_MASK) >> 52) as i32;
    let frac = bits & FRAC_MASK;

    if exp_field == 0x7ff {
        return match frac {
            0 => format!("{sign}inf"),
            _ if bits & !SIGN_BIT == CANONICAL_NAN => format!("{sign}nan"),
            _ => format!("{sign}nan(0x{frac:x})"),
        };
    }
    if exp_field == 0 && frac == 0 {
        return format!("{sign}0x0p+0");
    }

    let (lead, exp) = if exp_field == 0 {
        (0, -1022)
    } else {
        (1, exp_field - 1023)
    };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    let digits = format!("{frac:013x}");
    let digits = digits.trim_end_matches('0');
    if digits.is_empty() {
        format!("{sign}0x{lead}p{exp_sign}{}", exp.abs())
    } else {
        format!("{sign}0x{lead}.{digits}p{exp_sign}{}", exp.abs())
    }
}

/// Parse hexadecimal or decimal float text.
///
/// Surrounding ASCII whitespace is ignored; anything else left over makes
/// the parse fail. Hex input with more precision than a double holds is
/// rounded to nearest, ties to even.
pub fn parse_f64(text: &str) -> Option<f64> {
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let sign = if negative { SIGN_BIT } else { 0 };
    let lower = rest.to_ascii_lowercase();

    if lower == "inf" || lower == "infinity" {
        return Some(f64::from_bits(sign | EXP_MASK));
    }
    if let Some(tail) = lower.strip_prefix("nan") {
        let payload = match tail {
            "" => 0,
            _ => {
                let inner = tail.strip_prefix("(0x")?.strip_suffix(')')?;
                u64::from_str_radix(inner, 16).ok()? & FRAC_MASK
            }
        };
        let bits = if payload == 0 {
            CANONICAL_NAN
        } else {
            EXP_MASK | payload
        };
        return Some(f64::from_bits(sign | bits));
    }
    if let Some(hex) = lower.strip_prefix("0x") {
        let (mantissa, exp, sticky) = parse_hex_body(hex)?;
        return Some(compose(sign, mantissa, sticky, exp));
    }

    if rest.starts_with(['+', '-']) {
        return None;
    }
    let magnitude: f64 = rest.parse().ok()?;
    Some(f64::from_bits(magnitude.to_bits() | sign))
}

/// Returns `(mantissa, exponent, sticky)` with value `mantissa * 2^exponent`.
/// `sticky` records non-zero digits that did not fit the mantissa.
fn parse_hex_body(body: &str) -> Option<(u64, i64, bool)> {
    let (digits, exp_text) = match body.find('p') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match digits.find('.') {
        Some(i) => (&digits[..i], &digits[i + 1..]),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut mantissa: u64 = 0;
    let mut exp: i64 = 0;
    let mut sticky = false;
    for c in int_part.chars() {
        let d = c.to_digit(16)? as u64;
        if mantissa >> 60 == 0 {
            mantissa = (mantissa << 4) | d;
        } else {
            exp += 4;
            sticky |= d != 0;
        }
    }
    for c in frac_part.chars() {
        let d = c.to_digit(16)? as u64;
        if mantissa >> 60 == 0 {
            mantissa = (mantissa << 4) | d;
            exp -= 4;
        } else {
            sticky |= d != 0;
        }
    }

    if let Some(exp_text) = exp_text {
        exp = exp.saturating_add(parse_exponent(exp_text)?);
    }
    Some((mantissa, exp, sticky))
}

fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for c in digits.chars() {
        let d = c.to_digit(10)? as i64;
        // Anything this large over- or underflows regardless.
        value = (value * 10 + d).min(1 << 20);
    }
    Some(if negative { -value } else { value })
}

/// Build the double nearest to `mantissa * 2^exp`.
fn compose(sign: u64, mantissa: u64, sticky: bool, exp: i64) -> f64 {
    if mantissa == 0 {
        return f64::from_bits(sign);
    }
    let lz = mantissa.leading_zeros() as i64;
    let m = (mantissa << lz) as u128;
    // Value lies in [2^top, 2^(top + 1)).
    let top = exp - lz + 63;
    if top > 1023 {
        return f64::from_bits(sign | EXP_MASK);
    }

    let shift = if top >= -1022 { 11 } else { 11 + (-1022 - top) };
    if shift > 64 {
        return f64::from_bits(sign);
    }
    let kept = (m >> shift) as u64;
    let rem = m & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let round_up = rem > half || (rem == half && (sticky || kept & 1 == 1));
    let mut kept = kept + round_up as u64;

    let bits = if top >= -1022 {
        let mut e = top;
        if kept == 1 << 53 {
            kept >>= 1;
            e += 1;
            if e > 1023 {
                return f64::from_bits(sign | EXP_MASK);
            }
        }
        (((e + 1023) as u64) << 52) | (kept & FRAC_MASK)
    } else {
        // Subnormal; rounding up into 1 << 52 lands on the smallest normal.
        kept
    };
    f64::from_bits(sign | bits)
}
