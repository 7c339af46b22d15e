//! `COPY ... FROM STDIN` text-format encoding.

use crate::value::Value;
use bytes::{BufMut, BytesMut};
use std::fmt::Write;

pub(crate) fn copy_statement(table: &str, columns: &[String]) -> String {
    format!("COPY {table} ({}) FROM STDIN", columns.join(", "))
}

/// Encode rows as tab-separated text lines.
pub(crate) fn encode_rows(rows: &[Vec<Value>]) -> BytesMut {
    let mut buf = String::new();
    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                buf.push('\t');
            }
            encode_value(&mut buf, value);
        }
        buf.push('\n');
    }
    let mut out = BytesMut::with_capacity(buf.len());
    out.put_slice(buf.as_bytes());
    out
}

fn encode_value(buf: &mut String, value: &Value) {
    // Writing into a String cannot fail.
    let _ = match value {
        Value::Null => {
            buf.push_str("\\N");
            Ok(())
        }
        Value::Bool(b) => {
            buf.push(if *b { 't' } else { 'f' });
            Ok(())
        }
        Value::I8(v) => write!(buf, "{v}"),
        Value::I16(v) => write!(buf, "{v}"),
        Value::I32(v) => write!(buf, "{v}"),
        Value::I64(v) => write!(buf, "{v}"),
        Value::U8(v) => write!(buf, "{v}"),
        Value::U16(v) => write!(buf, "{v}"),
        Value::U32(v) => write!(buf, "{v}"),
        Value::U64(v) => write!(buf, "{v}"),
        Value::F32(v) => write_float(buf, f64::from(*v)),
        Value::F64(v) => write_float(buf, *v),
        #[cfg(feature = "rust_decimal")]
        Value::Decimal(v) => write!(buf, "{v}"),
        Value::Text(s) => {
            escape_into(buf, s);
            Ok(())
        }
        Value::Bytes(b) => {
            buf.push_str("\\\\x");
            b.iter().try_for_each(|byte| write!(buf, "{byte:02x}"))
        }
        Value::Uuid(u) => write!(buf, "{u}"),
        Value::Date(d) => write!(buf, "{}", d.format("%Y-%m-%d")),
        Value::Time(t) => write!(buf, "{}", t.format("%H:%M:%S%.f")),
        Value::Timestamp(t) => write!(buf, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
        Value::TimestampTz(t) => write!(buf, "{}", t.format("%Y-%m-%d %H:%M:%S%.f+00")),
        Value::Json(j) => {
            escape_into(buf, &j.to_string());
            Ok(())
        }
    };
}

fn write_float(buf: &mut String, v: f64) -> std::fmt::Result {
    if v.is_nan() {
        buf.push_str("NaN");
    } else if v.is_infinite() {
        buf.push_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        write!(buf, "{v}")?;
    }
    Ok(())
}

fn escape_into(buf: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '\\' => buf.push_str("\\\\"),
            '\t' => buf.push_str("\\t"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            c => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(rows: Vec<Vec<Value>>) -> String {
        String::from_utf8(encode_rows(&rows).to_vec()).unwrap()
    }

    #[test]
    fn rows_are_tab_separated_lines() {
        let out = encode(vec![
            vec![Value::I32(1), Value::Text("ada".into()), Value::Null],
            vec![Value::I32(2), Value::Bool(true), Value::F64(1.5)],
        ]);
        assert_eq!(out, "1\tada\t\\N\n2\tt\t1.5\n");
    }

    #[test]
    fn control_characters_are_escaped() {
        let out = encode(vec![vec![Value::Text("a\tb\nc\\d\re".into())]]);
        assert_eq!(out, "a\\tb\\nc\\\\d\\re\n");
    }

    #[test]
    fn bytes_use_hex_bytea_input() {
        let out = encode(vec![vec![Value::Bytes(vec![0xde, 0xad, 0x01])]]);
        assert_eq!(out, "\\\\xdead01\n");
    }

    #[test]
    fn statement_lists_columns() {
        assert_eq!(
            copy_statement("stg", &["id".into(), r#""Last Name""#.into()]),
            r#"COPY stg (id, "Last Name") FROM STDIN"#
        );
    }
}
