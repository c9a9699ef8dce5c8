//! Line oriented parser for changelog text.
use crate::{ChangeBlock, Changelog, Error, ParseOptions};
use lazy_regex::{regex_captures, regex_is_match};

const FIRST_HEADING: &str = "first heading";
const NEXT_HEADING: &str = "next heading or end of file";
const CHANGE_OR_TRAILER: &str = "change data or trailer line";

/// The parts of a heading line.
struct Heading {
    package: String,
    version: String,
    distributions: String,
    urgency: Option<String>,
    urgency_comment: String,
    other_pairs: Vec<(String, String)>,
}

impl Heading {
    fn into_block(self, line: &str) -> ChangeBlock {
        ChangeBlock {
            package: self.package,
            version: self.version,
            distributions: self.distributions,
            urgency: self.urgency,
            urgency_comment: self.urgency_comment,
            other_pairs: self.other_pairs,
            changes: Vec::new(),
            author: None,
            date: None,
            trailer_separator: "  ".to_string(),
            trailing: Vec::new(),
            no_trailer: false,
            raw_header: Some(line.to_string()),
            raw_trailer: None,
        }
    }
}

/// Parse a heading line.
///
/// Returns `None` if the line is not a heading at all, otherwise the heading
/// together with a description of every malformed `key=value` pair.
fn parse_heading(line: &str) -> Option<(Heading, Vec<String>)> {
    let (_, package, version, distributions, rest) = regex_captures!(
        r"(?i)^(\w[-+0-9a-z.]*) \(([^\(\) \t]+)\)((?:\s+[-+0-9a-z.]+)+);(.*)$",
        line
    )?;

    let mut heading = Heading {
        package: package.to_string(),
        version: version.to_string(),
        distributions: distributions.trim().to_string(),
        urgency: None,
        urgency_comment: String::new(),
        other_pairs: Vec::new(),
    };
    let mut problems = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for pair in rest.split(',').map(str::trim) {
        let Some((_, key, value)) = regex_captures!(r"(?i)^([-0-9a-z]+)=\s*(.*\S)$", pair) else {
            problems.push(format!("key=value pair, found {:?}", pair));
            continue;
        };
        let folded = key.to_lowercase();
        if seen.contains(&folded) {
            problems.push(format!("each key once, found {} repeated", key));
            continue;
        }
        seen.push(folded);

        if key.eq_ignore_ascii_case("urgency") {
            match regex_captures!(r"(?i)^([-0-9a-z]+)((?:\s+.*)?)$", value) {
                Some((_, level, comment)) => {
                    heading.urgency = Some(level.to_string());
                    heading.urgency_comment = comment.to_string();
                }
                None => problems.push(format!("urgency level, found {:?}", value)),
            }
        } else {
            heading
                .other_pairs
                .push((key.to_string(), value.to_string()));
        }
    }

    Some((heading, problems))
}

enum Trailer {
    Full {
        author: String,
        separator: String,
        date: String,
    },
    Bare,
}

fn parse_trailer(line: &str) -> Option<Trailer> {
    if let Some((_, name, email, separator, date)) = regex_captures!(
        r"^ -- (.*) <(.*)>(  ?)((?:\w+,\s*)?\d{1,2}\s+\w+\s+\d{4}\s+\d{1,2}:\d\d:\d\d\s+[-+]\d{4}(?:\s+\([^\\()]*\))?\s*)$",
        line
    ) {
        return Some(Trailer::Full {
            author: format!("{} <{}>", name, email),
            separator: separator.to_string(),
            date: date.to_string(),
        });
    }
    if regex_is_match!(r"^ --\s*$", line) {
        return Some(Trailer::Bare);
    }
    None
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_change(line: &str) -> bool {
    regex_is_match!(r"^\s\s+.*$", line)
}

/// Emacs local variables; everything up to the end belongs to them.
fn is_emacs_variables(line: &str) -> bool {
    regex_is_match!(r"(?i)^(;;\s*)?Local variables:", line)
}

/// Vim modelines, CVS keywords and comments found between blocks.
fn is_tolerated_comment(line: &str) -> bool {
    regex_is_match!(r"^vim:", line)
        || regex_is_match!(r"^\$\w+:.*\$", line)
        || regex_is_match!(r"^# ", line)
        || regex_is_match!(r"^/\*.*\*/", line)
}

/// Headings of entries in formats that predate the current one.
fn is_old_format(line: &str) -> bool {
    regex_is_match!(
        r"^(\w+\s+\w+\s+\d{1,2} \d{1,2}:\d{1,2}:\d{1,2}\s+[\w\s]*\d{4})\s+(.*)\s+(<|\()(.*)(\)|>)",
        line
    ) || regex_is_match!(
        r"^(\w+\s+\w+\s+\d{1,2},?\s*\d{4})\s+(.*)\s+(<|\()(.*)(\)|>)",
        line
    ) || regex_is_match!(r"(?i)^(\w[-+0-9a-z.]*) \(([^\(\) \t]+)\);?", line)
        || regex_is_match!(r"(?i)^([\w.+-]+)(-| )(\S+) Debian (\S+)", line)
        || regex_is_match!(r"(?i)^Changes from version (.*) to (.*):", line)
        || regex_is_match!(r"(?i)^Changes for [\w.+-]+-[\w.+-]+:?\s*$", line)
        || regex_is_match!(r"(?i)^Old Changelog:\s*$", line)
        || regex_is_match!(r"(?i)^(?:\d+:)?\w[\w.+~-]*:?\s*$", line)
}

/// Fail in strict mode, warn otherwise.
fn report(options: &ParseOptions, line_number: usize, line: &str, expected: &str) -> Result<(), Error> {
    if options.strict {
        return Err(Error::Parse {
            line_number,
            line: line.to_string(),
            expected: expected.to_string(),
        });
    }
    tracing::warn!(line_number, line, expected, "tolerating malformed changelog line");
    Ok(())
}

/// Lines outside any block go after the last block, or before the first one.
fn push_outside(changelog: &mut Changelog, line: &str) {
    match changelog.blocks.last_mut() {
        Some(block) => block.trailing.push(line.to_string()),
        None => changelog.initial_blank_lines.push(line.to_string()),
    }
}

pub(crate) fn parse(text: &str, options: &ParseOptions) -> Result<Changelog, Error> {
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }
    let (body, missing_final_newline) = match text.strip_suffix('\n') {
        Some(body) => (body, false),
        None => (text, true),
    };

    let mut changelog = Changelog {
        initial_blank_lines: Vec::new(),
        blocks: Vec::new(),
        missing_final_newline,
    };
    let mut current: Option<ChangeBlock> = None;
    let mut slurping = false;

    for (idx, line) in body.split('\n').enumerate() {
        let line_number = idx + 1;

        if slurping {
            push_outside(&mut changelog, line);
            continue;
        }

        if let Some(block) = current.as_mut() {
            tracing::trace!(line_number, "in block");
            if is_blank(line) || is_change(line) {
                block.changes.push(line.to_string());
                continue;
            }
            match parse_trailer(line) {
                Some(Trailer::Full {
                    author,
                    separator,
                    date,
                }) => {
                    if separator != "  " {
                        report(
                            options,
                            line_number,
                            line,
                            "two spaces between email and date",
                        )?;
                    }
                    block.author = Some(author);
                    block.trailer_separator = separator;
                    block.date = Some(date);
                    block.raw_trailer = Some(line.to_string());
                    changelog.blocks.extend(current.take());
                }
                Some(Trailer::Bare) => {
                    if !options.allow_empty_author {
                        report(options, line_number, line, "author and date in trailer line")?;
                    }
                    block.raw_trailer = Some(line.to_string());
                    changelog.blocks.extend(current.take());
                }
                None => {
                    report(options, line_number, line, CHANGE_OR_TRAILER)?;
                    block.changes.push(line.to_string());
                }
            }
            continue;
        }

        let between_blocks = !changelog.blocks.is_empty();
        tracing::trace!(line_number, between_blocks, "outside block");

        if let Some((heading, problems)) = parse_heading(line) {
            if options
                .max_blocks
                .is_some_and(|max| changelog.blocks.len() >= max)
            {
                changelog.missing_final_newline = false;
                break;
            }
            for problem in &problems {
                report(options, line_number, line, problem)?;
            }
            current = Some(heading.into_block(line));
        } else if is_blank(line) || is_tolerated_comment(line) {
            push_outside(&mut changelog, line);
        } else if between_blocks && (is_emacs_variables(line) || is_old_format(line)) {
            tracing::debug!(line_number, "keeping the rest of the changelog verbatim");
            push_outside(&mut changelog, line);
            slurping = true;
        } else {
            let expected = if between_blocks { NEXT_HEADING } else { FIRST_HEADING };
            report(options, line_number, line, expected)?;
            push_outside(&mut changelog, line);
        }
    }

    if let Some(mut block) = current.take() {
        if options.strict {
            return Err(Error::UnexpectedEndOfInput {
                expected: CHANGE_OR_TRAILER.to_string(),
            });
        }
        tracing::warn!(package = block.package.as_str(), "changelog block has no trailer line");
        block.no_trailer = true;
        changelog.blocks.push(block);
    }

    if changelog.blocks.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(changelog)
}
