//! Stripping of PGP ASCII armor around paragraphs.
//!
//! Signed files such as `.dsc` and `.changes` wrap their paragraph in
//! `-----BEGIN PGP SIGNED MESSAGE-----` framing. Signatures are never checked
//! here; the armor is only removed so that the body can be parsed, and kept
//! aside so callers can tell whether the input was signed.
use crate::Error;
use lazy_regex::regex_captures;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmorState {
    Safe,
    SignedMessage,
    Signature,
    /// Inside some other armored block, e.g. a public key.
    Other,
}

/// The lines making up one paragraph, with any armor split off.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    /// Armor lines that came before the body.
    pub header: Vec<String>,
    /// Body lines, each with its 1-based line number in the input.
    pub body: Vec<(usize, String)>,
    /// The signature block after the body.
    pub signature: Vec<String>,
}

/// Read the lines of the next paragraph from `lines`.
///
/// Leading blank lines and `#` comments are skipped. For unsigned input the
/// paragraph ends at the first blank line; in signed input blank lines in the
/// body are dropped and the paragraph ends with the signature.
///
/// Returns `None` when there is no content left.
pub(crate) fn collect_paragraph<I>(lines: &mut I) -> Result<Option<Collected>, Error>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    let mut collected = Collected::default();
    let mut state = ArmorState::Safe;
    let mut at_start = true;

    for (idx, line) in lines {
        let line = line?;
        let blank = line.trim().is_empty();

        if state == ArmorState::Safe && line.starts_with('#') {
            continue;
        }

        if at_start {
            if blank {
                continue;
            }
            at_start = false;
        }

        let armor = regex_captures!(r"^-----(BEGIN|END) PGP ([^-]+)-----$", &line)
            .map(|(_, action, kind)| (action == "BEGIN", kind.to_string()));

        match armor {
            None => match state {
                ArmorState::Safe => {
                    if !blank {
                        collected.body.push((idx + 1, line));
                    } else if collected.header.is_empty() {
                        break;
                    }
                }
                ArmorState::SignedMessage => {
                    if blank {
                        state = ArmorState::Safe;
                    } else {
                        collected.header.push(line);
                    }
                }
                ArmorState::Signature => collected.signature.push(line),
                ArmorState::Other => {}
            },
            Some((true, kind)) => {
                state = match kind.as_str() {
                    "SIGNED MESSAGE" => ArmorState::SignedMessage,
                    "SIGNATURE" => ArmorState::Signature,
                    _ => ArmorState::Other,
                };
                tracing::trace!(line = idx + 1, kind = kind.as_str(), "entering PGP armor");
                if collected.body.is_empty() {
                    collected.header.push(line);
                } else {
                    collected.signature.push(line);
                }
            }
            Some((false, _)) => {
                collected.signature.push(line);
                break;
            }
        }
    }

    if collected.body.is_empty() {
        Ok(None)
    } else {
        Ok(Some(collected))
    }
}
