//! Help rendering: command listings and per-command help.
//!
//! Everything here returns a `String`; the dispatcher decides where it goes.

use crate::option::OptSpec;
use crate::registry::CommandEntry;

const NO_HELP: &str = "(no help text available)";

/// Listing of visible commands, sorted by name.
///
/// With `brief` set and at least one shortlisted command, only shortlisted
/// commands are listed.
pub fn render_listing(program: &str, entries: &[CommandEntry], brief: bool) -> String {
    let shortlist_only = brief && entries.iter().any(CommandEntry::is_shortlisted);
    let mut rows: Vec<(&str, String)> = entries
        .iter()
        .filter(|e| !e.is_hidden())
        .filter(|e| !shortlist_only || e.is_shortlisted())
        .map(|e| (e.name(), summary(e.doc())))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("usage: {program} <command> [options]\n"));
    out.push_str("\ncommands:\n\n");
    for (name, line) in rows {
        out.push_str(&format!(" {name:<width$}  {line}\n"));
    }
    out
}

/// Help for one command: usage, aliases, documentation, then options.
///
/// `usage` has its placeholder already replaced; `options` is the effective
/// option list (own plus global).
pub fn render_command_help(entry: &CommandEntry, usage: &str, options: &[OptSpec], width: usize) -> String {
    let mut out = String::new();
    out.push_str(usage);
    out.push('\n');
    if !entry.aliases().is_empty() {
        out.push_str(&format!("\naliases: {}\n", entry.aliases().join(", ")));
    }
    out.push_str(&format!("\n{}\n\n", pretty_doc(entry.doc()).trim()));
    if !options.is_empty() {
        out.push_str(&render_options(options, width));
    }
    out
}

/// The `options:` table.
///
/// Descriptions are aligned after the widest flag column among options that
/// have a description and wrapped to fit `width`.
pub fn render_options(options: &[OptSpec], width: usize) -> String {
    let rows: Vec<(String, String)> = options
        .iter()
        .map(|o| {
            let short = o.short().map(|c| format!("-{c}")).unwrap_or_default();
            let first = format!("{short:>2} --{}", o.long());
            let default = o.kind().display_default();
            let second = if default.is_truthy() {
                format!("{} (default: {default})", o.help())
            } else {
                o.help().to_string()
            };
            (first, second)
        })
        .collect();

    let opts_len = rows
        .iter()
        .filter(|(_, second)| !second.is_empty())
        .map(|(first, _)| first.len())
        .max()
        .unwrap_or(0);
    let text_width = width.saturating_sub(opts_len + 3).max(1);
    let pad = format!("\n{}", " ".repeat(opts_len + 3));

    let mut out = String::from("options:\n\n");
    for (first, second) in rows {
        if second.is_empty() {
            out.push_str(&format!("{first}\n"));
        } else {
            let text = wrap(&second, text_width).join(&pad);
            out.push_str(&format!(" {first:<opts_len$}  {text}\n"));
        }
    }
    out
}

/// Replace the first `%name` in `usage`, or prefix `usage` with `name`.
pub fn replace_name(usage: &str, name: &str) -> String {
    if usage.contains("%name") {
        usage.replacen("%name", name, 1)
    } else {
        format!("{name} {usage}")
    }
}

/// Documentation with continuation lines dedented.
///
/// The indentation of the first non-blank line after the summary is removed
/// from every continuation line (whitespace only).
pub fn pretty_doc(doc: &str) -> String {
    let doc = doc.trim();
    if doc.is_empty() {
        return NO_HELP.to_string();
    }
    let mut lines = doc.lines();
    let Some(first) = lines.next() else {
        return NO_HELP.to_string();
    };
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .unwrap_or(0);

    let mut out = vec![first.to_string()];
    for line in rest {
        let strip = line
            .char_indices()
            .take_while(|(i, c)| *i < indent && c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        out.push(line[strip..].to_string());
    }
    out.join("\n")
}

/// First line of the documentation, as shown in listings.
pub fn summary(doc: &str) -> String {
    pretty_doc(doc)
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

/// Greedy word wrap. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if count > 0 {
                lines.push(std::mem::take(&mut current));
                count = 0;
            }
            let tail = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = tail;
        }
        if count > 0 && count + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
            count = 0;
        }
        if count > 0 {
            current.push(' ');
            count += 1;
        }
        count += word.len();
        current.extend(word);
    }
    if count > 0 {
        lines.push(current);
    }
    lines
}
