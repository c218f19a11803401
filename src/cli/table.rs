use serde_json::Value;

use terminal_size::{terminal_size, Width};

/// Plain ASCII table. Rendering returns a String so callers decide where it goes.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    pub fn row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) -> &mut Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn len(&self) -> usize { self.rows.len() }

    /// Synthesize a table from a JSON array: objects become rows over the
    /// sorted union of their keys, scalars a single `value` column.
    pub fn from_json(val: &Value) -> Option<Table> {
        let Value::Array(arr) = val else { return None };
        if arr.is_empty() {
            return None;
        }
        let mut keys: Vec<String> = Vec::new();
        let all_objects = arr.iter().all(|el| el.is_object());
        if all_objects {
            for el in arr {
                if let Value::Object(map) = el {
                    for k in map.keys() {
                        if !keys.contains(k) {
                            keys.push(k.clone());
                        }
                    }
                }
            }
            keys.sort();
        }
        if !all_objects || keys.is_empty() {
            let mut t = Table::new(["value"]);
            for el in arr {
                t.row([cell(el)]);
            }
            return Some(t);
        }
        let mut t = Table::new(keys.clone());
        for el in arr {
            t.row(keys.iter().map(|k| el.get(k).map(cell).unwrap_or_default()));
        }
        Some(t)
    }

    pub fn render(&self, max_width: usize) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count().min(max_width)).collect();
        for r in &self.rows {
            for (i, c) in r.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(c.chars().count().min(max_width));
            }
        }
        let sep = separator(&widths);
        let mut out = String::new();
        let mut line = |s: &str| {
            out.push_str(&fit(s, max_width));
            out.push('\n');
        };
        line(&sep);
        line(&build_row(&self.columns, &widths, false));
        line(&sep);
        for r in &self.rows {
            line(&build_row(r, &widths, true));
        }
        line(&sep);
        line(&format!("rows: {}", self.rows.len()));
        out
    }
}

pub fn cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Usable width of the attached terminal, 80 when there is none.
pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) if w > 8 => (w - 4) as usize,
        _ => 80,
    }
}

fn separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize], align_numbers: bool) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let raw = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(raw, *w);
        let pad = " ".repeat(w.saturating_sub(text.chars().count()));
        s.push(' ');
        if align_numbers && is_numeric_like(raw) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    s.chars().take(max - 1).collect::<String>() + "…"
}

/// Elide the middle of an over-long line.
fn fit(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "…".to_string();
    }
    let budget = max - 3;
    let front = budget / 2;
    let back = budget - front;
    let head: String = s.chars().take(front).collect();
    let tail: String = s.chars().skip(n - back).collect();
    format!("{}...{}", head, tail)
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().any(|c| c.is_ascii_digit()) && st.chars().all(|c| c.is_ascii_digit() || ".-+,_".contains(c))
}
