//! `.properties` parsing, shared by property sources and `spring.factories`.

/// Key of the auto-configuration list in `META-INF/spring.factories`.
pub const AUTO_CONFIGURATION_KEY: &str =
    "org.springframework.boot.autoconfigure.EnableAutoConfiguration";

/// Parses `.properties` content into ordered key/value pairs.
///
/// Supports `=`, `:` and whitespace separators, `#`/`!` comment lines,
/// backslash line continuations and the `\t`, `\n`, `\\` escapes. A key that
/// appears twice keeps both entries; consumers take the last one.
#[must_use]
pub fn parse(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut logical = String::new();
    for raw in content.lines() {
        let line = raw.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }
        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
        logical.clear();
    }
    if !logical.is_empty() {
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
    }
    entries
}

/// Returns the comma-separated values registered under `key` in
/// `spring.factories` content, in declaration order.
#[must_use]
pub fn factory_names(content: &str, key: &str) -> Vec<String> {
    parse(content)
        .into_iter()
        .filter(|(k, _)| k == key)
        .flat_map(|(_, v)| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 1
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    let mut escaped = false;
    while let Some(&c) = chars.peek() {
        if escaped {
            key.push(unescape(c));
            escaped = false;
            chars.next();
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => break,
            c if c.is_whitespace() => break,
            c => key.push(c),
        }
        chars.next();
    }
    // Skip whitespace, at most one separator, whitespace again.
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    if matches!(chars.peek(), Some('=' | ':')) {
        chars.next();
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let mut value = String::new();
    let mut escaped = false;
    for c in chars {
        if escaped {
            value.push(unescape(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            value.push(c);
        }
    }
    if key.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_and_comments() {
        let entries = parse(
            "# comment\n! other comment\nserver.port=8080\napp.name : demo\nflag true\n\n",
        );
        assert_eq!(
            entries,
            vec![
                ("server.port".to_string(), "8080".to_string()),
                ("app.name".to_string(), "demo".to_string()),
                ("flag".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn joins_continuation_lines() {
        let entries = parse("list=a,\\\n    b,\\\n    c\n");
        assert_eq!(entries, vec![("list".to_string(), "a,b,c".to_string())]);
    }

    #[test]
    fn reads_auto_configurations() {
        let content = format!(
            "{AUTO_CONFIGURATION_KEY}=\\\n  com.example.FirstAutoConfiguration,\\\n  com.example.SecondAutoConfiguration\n\
             org.springframework.context.ApplicationListener=com.example.Listener\n"
        );
        assert_eq!(
            factory_names(&content, AUTO_CONFIGURATION_KEY),
            ["com.example.FirstAutoConfiguration", "com.example.SecondAutoConfiguration"]
        );
    }
}
