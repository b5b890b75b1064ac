use crate::gateway::{Application, Race};
use crate::identity::Identity;

// cap to keep output readable
const MAX_COL_WIDTH: usize = 60;

/// Render rows as an ASCII table with a trailing `rows: N` summary line.
pub fn render_table(cols: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = cols.iter().map(|c| c.chars().count().min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_COL_WIDTH));
        }
    }

    let sep = build_separator(&widths);
    let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&build_row(&header, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for r in rows {
        out.push_str(&build_row(r, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format!("rows: {}", rows.len()));
    out
}

pub fn races_table(races: &[Race]) -> String {
    let rows: Vec<Vec<String>> = races
        .iter()
        .map(|r| vec![r.id.clone(), r.name.clone(), r.distance.label().to_string()])
        .collect();
    render_table(&["id", "name", "distance"], &rows)
}

pub fn applications_table(apps: &[Application]) -> String {
    let rows: Vec<Vec<String>> = apps
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.race_ref().unwrap_or("").to_string(),
                a.first_name.clone(),
                a.last_name.clone(),
                a.club.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["id", "raceId", "firstName", "lastName", "club"], &rows)
}

pub fn identity_table(id: &Identity, authenticated: bool) -> String {
    let rows = vec![vec![id.id.clone(), id.username.clone(), id.role.to_string(), authenticated.to_string()]];
    render_table(&["id", "username", "role", "authenticated"], &rows)
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(text.chars().count()));
        s.push(' ');
        if is_numeric_like(&text) {
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
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

// crude detection for aligning numbers to the right
fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().any(|c| c.is_ascii_digit()) && st.chars().all(|c| c.is_ascii_digit() || ".-+,_".contains(c))
}
