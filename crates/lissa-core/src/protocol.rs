//! Line protocol spoken by plugin children.
//!
//! Two-verb grammar, ASCII, one message per line, fields whitespace
//! separated:
//!
//! ```text
//! SET <name> <real-number>
//! PRESET <name>
//! ```
//!
//! Children must emit exactly one message per line and flush after each
//! write. Anything that does not decode is discarded: child processes
//! legitimately print unrelated diagnostics on the same stream, so an
//! unparseable line is noise tolerance, not an error.

use std::fmt;

/// A decoded instruction from a plugin child.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// `SET <name> <value>` — assign one parameter.
    Set { name: String, value: f64 },
    /// `PRESET <name>` — load a named preset.
    Preset { name: String },
}

impl ControlMessage {
    /// Decode one line. Returns `None` for anything outside the grammar.
    pub fn decode(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let msg = match tokens.next()? {
            "SET" => {
                let name = tokens.next()?;
                let value: f64 = tokens.next()?.parse().ok()?;
                // store fields are finite by invariant
                if !value.is_finite() || tokens.next().is_some() {
                    return None;
                }
                ControlMessage::Set {
                    name: name.to_string(),
                    value,
                }
            }
            "PRESET" => {
                let name = tokens.next()?;
                if tokens.next().is_some() {
                    return None;
                }
                ControlMessage::Preset {
                    name: name.to_string(),
                }
            }
            _ => return None,
        };
        Some(msg)
    }
}

/// Encoder for the child-side contract: `to_string()` yields the exact line
/// a well-behaved child would write (without the trailing newline).
impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMessage::Set { name, value } => write!(f, "SET {name} {value:.6}"),
            ControlMessage::Preset { name } => write!(f, "PRESET {name}"),
        }
    }
}

/// Reassembles a byte stream into newline-terminated lines.
///
/// The supervisor feeds it whatever a non-blocking read returned; complete
/// lines come out in write order, a trailing partial line stays buffered
/// until the next feed. Stream content is treated as UTF-8 with lossy
/// replacement, which is harmless here: replacement characters never form a
/// valid message and fall into the discard path.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line it finishes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buf, rest);
            line.pop(); // trailing '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Drop any buffered partial line.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Bytes currently buffered without a terminating newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Decode every complete line a chunk finishes, discarding non-messages.
pub fn decode_chunk(assembler: &mut LineAssembler, chunk: &[u8]) -> Vec<ControlMessage> {
    assembler
        .feed(chunk)
        .iter()
        .filter_map(|line| {
            let msg = ControlMessage::decode(line);
            if msg.is_none() && !line.trim().is_empty() {
                tracing::trace!(line, "discarded non-protocol line");
            }
            msg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_set_and_preset() {
        assert_eq!(
            ControlMessage::decode("SET a 5.000000"),
            Some(ControlMessage::Set {
                name: "a".into(),
                value: 5.0
            })
        );
        assert_eq!(
            ControlMessage::decode("PRESET circle"),
            Some(ControlMessage::Preset {
                name: "circle".into()
            })
        );
    }

    #[test]
    fn tolerates_extra_whitespace() {
        assert_eq!(
            ControlMessage::decode("  SET   delta   1.5708  "),
            Some(ControlMessage::Set {
                name: "delta".into(),
                value: 1.5708
            })
        );
    }

    #[test]
    fn malformed_lines_are_discarded() {
        for line in [
            "",
            "hello world",
            "SET",
            "SET a",
            "SET a notanumber",
            "SET a 1.0 extra",
            "SET a nan",
            "SET a inf",
            "PRESET",
            "PRESET circle extra",
            "set a 1.0", // verbs are case-sensitive
        ] {
            assert_eq!(ControlMessage::decode(line), None, "line {line:?}");
        }
    }

    #[test]
    fn encode_matches_the_child_contract() {
        let msg = ControlMessage::Set {
            name: "a".into(),
            value: 5.0,
        };
        assert_eq!(msg.to_string(), "SET a 5.000000");
        let msg = ControlMessage::Preset {
            name: "star".into(),
        };
        assert_eq!(msg.to_string(), "PRESET star");
    }

    #[test]
    fn encoded_messages_decode_back() {
        let original = ControlMessage::Set {
            name: "delta".into(),
            value: 1.5708,
        };
        assert_eq!(ControlMessage::decode(&original.to_string()), Some(original));
    }

    #[test]
    fn reassembly_holds_partial_lines() {
        let mut asm = LineAssembler::new();
        let first = decode_chunk(&mut asm, b"SET a 1.0\nSET b");
        assert_eq!(
            first,
            vec![ControlMessage::Set {
                name: "a".into(),
                value: 1.0
            }]
        );
        assert!(asm.pending() > 0);

        let second = decode_chunk(&mut asm, b" 2.0\nPRESET circle\n");
        assert_eq!(
            second,
            vec![
                ControlMessage::Set {
                    name: "b".into(),
                    value: 2.0
                },
                ControlMessage::Preset {
                    name: "circle".into()
                },
            ]
        );
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn crlf_lines_decode_like_lf_lines() {
        let mut asm = LineAssembler::new();
        let msgs = decode_chunk(&mut asm, b"SET A 2.0\r\n");
        assert_eq!(
            msgs,
            vec![ControlMessage::Set {
                name: "A".into(),
                value: 2.0
            }]
        );
    }

    #[test]
    fn noise_between_messages_is_skipped() {
        let mut asm = LineAssembler::new();
        let msgs = decode_chunk(
            &mut asm,
            b"Tk starting up...\nSET b 4\nwarning: something\n",
        );
        assert_eq!(
            msgs,
            vec![ControlMessage::Set {
                name: "b".into(),
                value: 4.0
            }]
        );
    }

    #[test]
    fn clear_drops_the_partial_tail() {
        let mut asm = LineAssembler::new();
        asm.feed(b"SET a");
        asm.clear();
        assert_eq!(asm.pending(), 0);
        let msgs = decode_chunk(&mut asm, b" 1.0\n");
        // the tail was dropped, so this is just " 1.0" — not a message
        assert!(msgs.is_empty());
    }
}
