use once_cell::sync::Lazy;
use regex::Regex;

static POINT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[.)]\s").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)[.)]\s+([\s\S]*)").unwrap());

/// Strips markdown emphasis, code, link and heading markers.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '*' | '_' | '~' | '`' | '[' | ']' | '#'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Splits AI feedback into points at every `N.` or `N)` marker, which may
/// sit mid-line. Numbered points carry their number; text before the first
/// marker is returned unnumbered. Points that are empty after cleaning are
/// dropped.
pub fn feedback_points(text: &str) -> Vec<(Option<u32>, String)> {
    let mut starts: Vec<usize> = POINT_START.find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut points = Vec::new();
    for (index, start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(text.len());
        let piece = &text[*start..end];

        let point = match NUMBERED.captures(piece) {
            Some(caps) => match caps[1].parse::<u32>() {
                Ok(number) => (Some(number), clean_text(&caps[2])),
                Err(_) => (None, clean_text(piece)),
            },
            None => (None, clean_text(piece)),
        };
        if !point.1.is_empty() {
            points.push(point);
        }
    }
    points
}

pub fn format_point(point: &(Option<u32>, String)) -> String {
    match point {
        (Some(number), text) => format!("{number}. {text}"),
        (None, text) => text.clone(),
    }
}

/// Cleaned points on one line, separated by `"; "`.
pub fn flatten(text: &str) -> String {
    feedback_points(text)
        .iter()
        .map(format_point)
        .collect::<Vec<_>>()
        .join("; ")
}
