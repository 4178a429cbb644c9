use crate::hexfloat::{format_hex, parse_f64};
use crate::node::Storage;

/// Typed accessors over the text-only scalar map.
///
/// Integers are stored as base-10 text, booleans as `"1"`/`"0"`, and floats
/// as exact hexadecimal float text. Getters fall back to the caller's
/// default when the key is absent or its text does not parse.
impl Storage {
    /// Scalar membership only; children and array are not consulted.
    pub fn has_key(&self, key: &str) -> bool {
        self.scalar(key).is_some()
    }

    /// Borrow the stored text, if any.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.scalar(key).map(String::as_str)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or(default).to_owned()
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_scalar(key.into(), value.into());
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get_str(key)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.insert_scalar(key.into(), value.to_string());
    }

    /// Non-zero stored integer is `true`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_int(key, i64::from(default)) != 0
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        let text = if value { "1" } else { "0" };
        self.insert_scalar(key.into(), text.to_owned());
    }

    /// Parsed at double precision, then narrowed.
    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get_str(key)
            .and_then(parse_f64)
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.set_double(key, f64::from(value));
    }

    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.get_str(key).and_then(parse_f64).unwrap_or(default)
    }

    pub fn set_double(&mut self, key: impl Into<String>, value: f64) {
        self.insert_scalar(key.into(), format_hex(value));
    }

    /// Erase a scalar. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.remove_scalar(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn string_default_when_absent() {
        let mut s = Storage::new();
        assert_eq!(s.get_string("name", "anon"), "anon");
        assert!(s.get_str("name").is_none());
        s.set_string("name", "Alice");
        assert_eq!(s.get_string("name", "anon"), "Alice");
        assert_eq!(s.get_str("name"), Some("Alice"));
    }

    #[test]
    fn empty_string_is_stored_verbatim() {
        let mut s = Storage::new();
        s.set_string("blank", "");
        assert!(s.has_key("blank"));
        assert_eq!(s.get_string("blank", "fallback"), "");
    }

    #[test]
    fn int_roundtrip_and_text() {
        let mut s = Storage::new();
        s.set_int("score", -1234);
        assert_eq!(s.get_str("score"), Some("-1234"));
        assert_eq!(s.get_int("score", 0), -1234);
        s.set_int("big", i64::MAX);
        assert_eq!(s.get_int("big", 0), i64::MAX);
    }

    #[test]
    fn int_default_on_absent_or_garbage() {
        let mut s = Storage::new();
        assert_eq!(s.get_int("missing", 9), 9);
        s.set_string("word", "twelve");
        assert_eq!(s.get_int("word", 9), 9);
        s.set_string("empty", "");
        assert_eq!(s.get_int("empty", 9), 9);
        s.set_string("padded", " 42 ");
        assert_eq!(s.get_int("padded", 9), 42);
    }

    #[test]
    fn bool_is_one_or_zero() {
        let mut s = Storage::new();
        s.set_bool("on", true);
        s.set_bool("off", false);
        assert_eq!(s.get_str("on"), Some("1"));
        assert_eq!(s.get_str("off"), Some("0"));
        assert!(s.get_bool("on", false));
        assert!(!s.get_bool("off", true));
        assert!(s.get_bool("missing", true));
        s.set_int("seven", 7);
        assert!(s.get_bool("seven", false));
    }

    #[test]
    fn double_stored_as_hex_text() {
        let mut s = Storage::new();
        s.set_double("ratio", 0.1);
        assert_eq!(s.get_str("ratio"), Some("0x1.999999999999ap-4"));
        assert_eq!(s.get_double("ratio", 0.0), 0.1);
    }

    #[test]
    fn float_narrowed_from_double() {
        let mut s = Storage::new();
        s.set_float("speed", 1.1f32);
        assert_eq!(s.get_float("speed", 0.0), 1.1f32);
        assert_eq!(s.get_double("speed", 0.0), f64::from(1.1f32));
    }

    #[test]
    fn float_accepts_decimal_text() {
        let mut s = Storage::new();
        s.set_string("legacy", "2.5");
        assert_eq!(s.get_double("legacy", 0.0), 2.5);
        assert_eq!(s.get_float("legacy", 0.0), 2.5f32);
        s.set_string("junk", "fast");
        assert_eq!(s.get_double("junk", -1.0), -1.0);
    }

    #[test]
    fn remove_reports_existence() {
        let mut s = Storage::new();
        s.set_int("x", 1);
        assert!(s.remove("x"));
        assert!(!s.remove("x"));
        assert!(!s.has_key("x"));
    }

    #[test]
    fn has_key_ignores_children() {
        let mut s = Storage::new();
        s.child_or_insert("inventory");
        s.push_new();
        assert!(!s.has_key("inventory"));
    }

    proptest! {
        #[test]
        fn double_bits_survive(bits in any::<u64>()) {
            let mut s = Storage::new();
            s.set_double("x", f64::from_bits(bits));
            prop_assert_eq!(s.get_double("x", 0.0).to_bits(), bits);
        }

        #[test]
        fn float_bits_survive(x in any::<f32>().prop_filter("not nan", |v| !v.is_nan())) {
            let mut s = Storage::new();
            s.set_float("x", x);
            prop_assert_eq!(s.get_float("x", 0.0).to_bits(), x.to_bits());
        }

        #[test]
        fn int_survives(v in any::<i64>()) {
            let mut s = Storage::new();
            s.set_int("v", v);
            prop_assert_eq!(s.get_int("v", 0), v);
        }
    }
}
