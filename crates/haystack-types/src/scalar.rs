//! Canonical zinc text for tag scalars.
//!
//! [`dump_scalar`] is a pure function producing the form a scalar takes
//! inside a filter expression or zinc grid. Sessions splice its output
//! into filter strings (`siteRef==@site-1`); nothing here parses.

use crate::value::TagValue;

/// Serialize a scalar to its zinc text form.
pub fn dump_scalar(value: &TagValue) -> String {
    match value {
        TagValue::Marker => "M".to_string(),
        TagValue::Bool(true) => "T".to_string(),
        TagValue::Bool(false) => "F".to_string(),
        TagValue::Number { value, unit } => dump_number(*value, unit.as_deref()),
        TagValue::Str(s) => dump_str(s),
        TagValue::Ref(r) => match &r.dis {
            Some(dis) => format!("@{} {}", r.id, dump_str(dis)),
            None => format!("@{}", r.id),
        },
        TagValue::Uri(u) => format!("`{}`", u.replace('`', "\\`")),
        TagValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        TagValue::Time(t) => t.format("%H:%M:%S%.3f").to_string(),
        TagValue::DateTime(dt) => format!("{} UTC", dt.to_rfc3339()),
        TagValue::Coord { lat, lng } => format!("C({lat},{lng})"),
    }
}

fn dump_number(value: f64, unit: Option<&str>) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    // Integral values print without a trailing ".0" so filters read
    // naturally (limit==10, not limit==10.0).
    let text = if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    };
    match unit {
        Some(u) => format!("{text}{u}"),
        None => text,
    }
}

fn dump_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => out.push_str("\\$"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Ref;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    #[test]
    fn test_markers_and_bools() {
        assert_eq!(dump_scalar(&TagValue::Marker), "M");
        assert_eq!(dump_scalar(&TagValue::Bool(true)), "T");
        assert_eq!(dump_scalar(&TagValue::Bool(false)), "F");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(dump_scalar(&TagValue::number(10.0)), "10");
        assert_eq!(dump_scalar(&TagValue::number(-3.0)), "-3");
        assert_eq!(dump_scalar(&TagValue::number(10.5)), "10.5");
        assert_eq!(
            dump_scalar(&TagValue::number_with_unit(10.5, "kW")),
            "10.5kW"
        );
        assert_eq!(dump_scalar(&TagValue::number(f64::INFINITY)), "INF");
        assert_eq!(dump_scalar(&TagValue::number(f64::NEG_INFINITY)), "-INF");
        assert_eq!(dump_scalar(&TagValue::number(f64::NAN)), "NaN");
    }

    #[test]
    fn test_strings_escape() {
        assert_eq!(dump_scalar(&TagValue::str("AHU 1")), "\"AHU 1\"");
        assert_eq!(
            dump_scalar(&TagValue::str("a\"b\\c\nd$e")),
            "\"a\\\"b\\\\c\\nd\\$e\""
        );
        assert_eq!(dump_scalar(&TagValue::str("\u{01}")), "\"\\u0001\"");
    }

    #[test]
    fn test_refs() {
        assert_eq!(dump_scalar(&TagValue::make_ref("site-1")), "@site-1");
        let r = Ref::new("ahu-1").with_dis("AHU 1");
        assert_eq!(dump_scalar(&TagValue::Ref(r)), "@ahu-1 \"AHU 1\"");
    }

    #[test]
    fn test_uri() {
        assert_eq!(
            dump_scalar(&TagValue::Uri("http://x/y".to_string())),
            "`http://x/y`"
        );
    }

    #[test]
    fn test_temporal() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(dump_scalar(&TagValue::Date(d)), "2026-08-24");

        let t = NaiveTime::from_hms_milli_opt(14, 30, 0, 250).unwrap();
        assert_eq!(dump_scalar(&TagValue::Time(t)), "14:30:00.250");

        let dt = Utc.with_ymd_and_hms(2026, 8, 24, 14, 30, 0).unwrap();
        assert_eq!(
            dump_scalar(&TagValue::DateTime(dt)),
            "2026-08-24T14:30:00+00:00 UTC"
        );
    }

    #[test]
    fn test_coord() {
        let c = TagValue::Coord {
            lat: 45.5,
            lng: -73.6,
        };
        assert_eq!(dump_scalar(&c), "C(45.5,-73.6)");
    }
}
