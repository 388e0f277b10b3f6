// Structural HTML scanning for Sodola device pages.
//
// This is deliberately NOT a general HTML parser. The contract is a
// heuristic scan over firmware-generated markup: any `<table>` whose
// header row mentions a vlan/vid/port token is treated as a data table,
// and each later row folds into a key-value record keyed by the headers.
// The only failure mode is an empty result -- malformed markup, missing
// tables, and ragged rows all degrade to "less data", never to an error.
// The flakiness is a property of the device, not something to fight.

use indexmap::IndexMap;

/// Header tokens that mark a table as carrying switch data.
const DATA_TOKENS: [&str; 3] = ["vlan", "vid", "port"];

/// One recognized data table: normalized headers plus one record per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<IndexMap<String, String>>,
}

impl HtmlTable {
    /// Look up a cell by any of several candidate column names.
    pub fn cell<'a>(row: &'a IndexMap<String, String>, names: &[&str]) -> Option<&'a str> {
        names
            .iter()
            .find_map(|n| row.get(*n).map(String::as_str))
            .filter(|v| !v.is_empty())
    }
}

/// Scan a page for data tables.
pub fn scan_tables(html: &str) -> Vec<HtmlTable> {
    let mut tables = Vec::new();

    for table_body in sections(html, "table") {
        let mut row_iter = sections(table_body, "tr").into_iter();

        // Header row: first row with any cells at all.
        let headers: Vec<String> = loop {
            let Some(row) = row_iter.next() else {
                break Vec::new();
            };
            let cells = cells(row);
            if !cells.is_empty() {
                break cells.into_iter().map(|c| c.to_lowercase()).collect();
            }
        };

        if headers.is_empty() {
            continue;
        }

        let is_data_table = headers
            .iter()
            .any(|h| DATA_TOKENS.iter().any(|t| h.contains(t)));
        if !is_data_table {
            continue;
        }

        let mut rows = Vec::new();
        for row in row_iter {
            let values = cells(row);
            if values.is_empty() {
                continue;
            }
            let record: IndexMap<String, String> = headers
                .iter()
                .cloned()
                .zip(values.into_iter())
                .collect();
            rows.push(record);
        }

        tables.push(HtmlTable { headers, rows });
    }

    tables
}

/// Pull a labeled value out of a page, e.g. the cell following a
/// "MAC Address" label. Used for system-info pages, which are label/value
/// layouts rather than header/row tables.
pub fn labeled_value(html: &str, label: &str) -> Option<String> {
    let pos = find_ci(html, label, 0)?;
    let rest = &html[pos + label.len()..];

    // The value lives in the next table cell after the label.
    let cell_start = find_ci(rest, "<td", 0)?;
    let after_tag = rest[cell_start..].find('>')? + cell_start + 1;
    let cell_end = find_ci(rest, "</td", after_tag).unwrap_or(rest.len());

    let value = clean_text(&rest[after_tag..cell_end]);
    (!value.is_empty()).then_some(value)
}

// ── Login form extraction ───────────────────────────────────────────

/// A login form found on a page: where to post, what to call the
/// credential fields, and any hidden fields to carry verbatim.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub action: Option<String>,
    pub user_field: String,
    pub pass_field: String,
    pub hidden: Vec<(String, String)>,
}

/// Locate the first form containing a password input.
pub fn find_login_form(html: &str) -> Option<LoginForm> {
    for form_body in sections(html, "form") {
        let mut user_field = None;
        let mut pass_field = None;
        let mut hidden = Vec::new();

        for input in tags(form_body, "input") {
            let name = attr(input, "name");
            let kind = attr(input, "type").unwrap_or_else(|| "text".into());

            match kind.to_lowercase().as_str() {
                "password" => pass_field = pass_field.or(name),
                "hidden" => {
                    if let Some(n) = name {
                        hidden.push((n, attr(input, "value").unwrap_or_default()));
                    }
                }
                "text" => {
                    // Prefer a field whose name suggests a username, but
                    // fall back to the first text input.
                    if let Some(n) = name {
                        let looks_like_user =
                            n.to_lowercase().contains("user") || n.to_lowercase().contains("name");
                        if looks_like_user || user_field.is_none() {
                            user_field = Some(n);
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(pass_field) = pass_field {
            // Re-read the form's own open tag for the action attribute.
            let action = form_open_tag(html, form_body).and_then(|tag| attr(tag, "action"));
            return Some(LoginForm {
                action,
                user_field: user_field.unwrap_or_else(|| "username".into()),
                pass_field,
                hidden,
            });
        }
    }
    None
}

/// Find the `<form ...>` open tag whose body slice matches `body`.
fn form_open_tag<'a>(html: &'a str, body: &str) -> Option<&'a str> {
    // `body` is a subslice of `html`; walk back from its start offset.
    let body_start = offset_of(html, body)?;
    let open_start = html[..body_start].rfind('<')?;
    let open_end = html[open_start..].find('>')? + open_start;
    Some(&html[open_start..=open_end])
}

fn offset_of(parent: &str, child: &str) -> Option<usize> {
    let parent_range = parent.as_ptr() as usize..parent.as_ptr() as usize + parent.len();
    let child_pos = child.as_ptr() as usize;
    parent_range
        .contains(&child_pos)
        .then(|| child_pos - parent_range.start)
}

// ── Low-level scanning ──────────────────────────────────────────────

/// Inner content of every `<tag>...</tag>` section, in order. A missing
/// close tag swallows the rest of the document (tolerant, not strict).
fn sections<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_ci(html, &open, pos) {
        // Require a real tag boundary, not a prefix match (<tr vs <track).
        let after = start + open.len();
        match html.as_bytes().get(after) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'/') => {}
            _ => {
                pos = after;
                continue;
            }
        }

        let Some(content_start) = html[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let content_end = find_ci(html, &close, content_start).unwrap_or(html.len());
        out.push(&html[content_start..content_end]);
        pos = content_end;
    }

    out
}

/// Every `<tag ...>` open tag (self-closing or not), as raw tag text.
fn tags<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_ci(html, &open, pos) {
        let Some(end) = html[start..].find('>').map(|i| start + i) else {
            break;
        };
        out.push(&html[start..=end]);
        pos = end + 1;
    }

    out
}

/// Cell texts of one row: everything after each `<td`/`<th`.
fn cells(row: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;

    loop {
        let td = find_ci(row, "<td", pos);
        let th = find_ci(row, "<th", pos);
        let start = match (td, th) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };

        let Some(content_start) = row[start..].find('>').map(|i| start + i + 1) else {
            break;
        };

        let next_td = find_ci(row, "<td", content_start);
        let next_th = find_ci(row, "<th", content_start);
        let close_td = find_ci(row, "</td", content_start);
        let close_th = find_ci(row, "</th", content_start);
        let content_end = [next_td, next_th, close_td, close_th]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(row.len());

        out.push(clean_text(&row[content_start..content_end]));
        // content_end is either a close tag (skipped by the next search)
        // or the next cell's open tag (found again as the next start).
        pos = content_end;
        if pos >= row.len() {
            break;
        }
    }

    out
}

/// Parse one attribute out of a raw tag string. Handles `key="v"`,
/// `key='v'`, and bare `key=v`.
fn attr(tag: &str, name: &str) -> Option<String> {
    let mut pos = 0;
    loop {
        let at = find_ci(tag, name, pos)?;
        let after = at + name.len();
        let rest = tag[after..].trim_start();
        if !rest.starts_with('=') {
            pos = after;
            continue;
        }
        let value = rest[1..].trim_start();
        return Some(match value.as_bytes().first() {
            Some(b'"') => value[1..].split('"').next().unwrap_or("").to_owned(),
            Some(b'\'') => value[1..].split('\'').next().unwrap_or("").to_owned(),
            _ => value
                .split([' ', '>', '/'])
                .next()
                .unwrap_or("")
                .to_owned(),
        });
    }
}

/// Strip tags, decode common entities, collapse whitespace.
fn clean_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ASCII case-insensitive substring search.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || from + n.len() > h.len() {
        return None;
    }
    (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
