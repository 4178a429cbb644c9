//! Read-only views of a loaded tree: dotted-path listings, path lookup and
//! JSON export.

use chrono::{Local, TimeZone, Utc};
use serde_json::{Map, Value};
use stow_core::hexfloat::parse_f64;
use stow_core::Storage;

/// How numeric scalars are annotated with a calendar date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateStyle {
    Off,
    Local,
    Utc,
}

/// One line of dump output.
#[derive(Clone, Debug, PartialEq)]
pub enum DumpLine {
    Scalar {
        path: String,
        value: String,
        number: Option<f64>,
        date: Option<String>,
    },
    /// A child or array element with no content at all.
    Empty { path: String },
}

impl DumpLine {
    pub fn path(&self) -> &str {
        match self {
            Self::Scalar { path, .. } | Self::Empty { path } => path,
        }
    }

    /// Right-hand side of ` = `, without the numeric annotation.
    pub fn value(&self) -> &str {
        match self {
            Self::Scalar { value, .. } => value,
            Self::Empty { .. } => "[Empty object]",
        }
    }

    /// ` (double: N date: D)` for scalars that read as numbers.
    pub fn annotation(&self) -> Option<String> {
        let Self::Scalar { number: Some(n), date, .. } = self else {
            return None;
        };
        Some(match date {
            Some(d) => format!(" (double: {n:.8} date: {d})"),
            None => format!(" (double: {n:.8})"),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{} = {}{}",
            self.path(),
            self.value(),
            self.annotation().unwrap_or_default()
        )
    }
}

/// First line of a text dump.
pub fn header_line(root: &Storage) -> String {
    format!("Header: {}", root.header)
}

/// Walk `node` depth-first: scalars, then children, then array elements.
pub fn dump_lines(node: &Storage, prefix: &str, dates: DateStyle) -> Vec<DumpLine> {
    let mut lines = Vec::new();
    walk(node, prefix, dates, &mut lines);
    lines
}

fn walk(node: &Storage, prefix: &str, dates: DateStyle, out: &mut Vec<DumpLine>) {
    for (key, value) in node.scalars() {
        let number = parse_f64(value);
        let date = number
            .filter(|n| *n > 0.0)
            .and_then(|n| format_timestamp(n, dates));
        out.push(DumpLine::Scalar {
            path: format!("{prefix}.{key}"),
            value: value.clone(),
            number,
            date,
        });
    }

    for (key, child) in node.children() {
        visit(child, format!("{prefix}.{key}"), dates, out);
    }

    for (i, element) in node.array.iter().enumerate() {
        visit(element, format!("{prefix}.array[{i}]"), dates, out);
    }
}

fn visit(node: &Storage, path: String, dates: DateStyle, out: &mut Vec<DumpLine>) {
    if node.is_empty() {
        out.push(DumpLine::Empty { path });
    } else {
        walk(node, &path, dates, out);
    }
}

/// Seconds since the epoch as `YYYY-MM-DD HH:MM:SS`, or `None` when the
/// value falls outside the representable calendar range.
pub fn format_timestamp(seconds: f64, style: DateStyle) -> Option<String> {
    // Saturating cast; out-of-range values are rejected by chrono below.
    let secs = seconds as i64;
    let format = "%Y-%m-%d %H:%M:%S";
    match style {
        DateStyle::Off => None,
        DateStyle::Local => Local
            .timestamp_opt(secs, 0)
            .single()
            .map(|t| t.format(format).to_string()),
        DateStyle::Utc => Utc
            .timestamp_opt(secs, 0)
            .single()
            .map(|t| t.format(format).to_string()),
    }
}

/// A step in a dotted path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Split `address.city` / `array[1].id` style paths.
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        match part.strip_prefix("array[").and_then(|s| s.strip_suffix(']')) {
            Some(index) => segments.push(Segment::Index(index.parse().ok()?)),
            None if part.is_empty() => return None,
            None => segments.push(Segment::Key(part.to_owned())),
        }
    }
    Some(segments)
}

/// What a dotted path resolved to.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
    Scalar(&'a str),
    Node(&'a Storage),
}

/// Follow `segments` from `root`. A final key names a scalar when one
/// exists, otherwise a child.
pub fn resolve<'a>(root: &'a Storage, segments: &[Segment]) -> Option<Resolved<'a>> {
    let (last, parents) = segments.split_last()?;
    let mut node = root;
    for segment in parents {
        node = match segment {
            Segment::Key(key) => node.child(key)?,
            Segment::Index(i) => node.array.get(*i)?,
        };
    }
    match last {
        Segment::Key(key) => match node.get_str(key) {
            Some(value) => Some(Resolved::Scalar(value)),
            None => node.child(key).map(Resolved::Node),
        },
        Segment::Index(i) => node.array.get(*i).map(Resolved::Node),
    }
}

/// The tree as JSON. The header appears only on the outermost object.
pub fn to_json(root: &Storage) -> Value {
    let mut value = node_json(root);
    if let Value::Object(map) = &mut value {
        map.insert("header".into(), Value::String(root.header.clone()));
    }
    value
}

fn node_json(node: &Storage) -> Value {
    let scalars: Map<String, Value> = node
        .scalars()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let children: Map<String, Value> = node
        .children()
        .map(|(k, c)| (k.clone(), node_json(c)))
        .collect();
    let array: Vec<Value> = node.array.iter().map(node_json).collect();

    let mut map = Map::new();
    map.insert("scalars".into(), Value::Object(scalars));
    map.insert("children".into(), Value::Object(children));
    map.insert("array".into(), Value::Array(array));
    Value::Object(map)
}
