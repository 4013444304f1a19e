//! Positional placeholder formatting.

use std::fmt::Display;

use crate::error::FormatError;

/// Replace `{index[,alignment][:format]}` placeholders with the matching argument.
///
/// `{{` and `}}` produce literal braces. A positive alignment right-aligns the argument
/// in that many columns, a negative one left-aligns it. Format specifiers after `:` are
/// accepted and not interpreted.
pub fn format_positional(template: &str, args: &[&dyn Display]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => out.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => out.push('}'),
            '}' => return Err(FormatError::Malformed(pos)),
            '{' => {
                let mut token = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    token.push(c);
                }
                if !closed {
                    return Err(FormatError::Malformed(pos));
                }

                let placeholder = Placeholder::parse(&token).ok_or(FormatError::Malformed(pos))?;
                let arg = args.get(placeholder.index).ok_or(FormatError::MissingArgument {
                    index: placeholder.index,
                    count: args.len(),
                })?;
                placeholder.write(&mut out, *arg);
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

struct Placeholder {
    index: usize,
    alignment: isize,
}

impl Placeholder {
    fn parse(token: &str) -> Option<Self> {
        let spec = token.split_once(':').map_or(token, |(spec, _)| spec);
        let (index, alignment) = match spec.split_once(',') {
            Some((index, alignment)) => (index.trim(), alignment.trim().parse().ok()?),
            None => (spec.trim(), 0),
        };

        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            index: index.parse().ok()?,
            alignment,
        })
    }

    fn write(&self, out: &mut String, arg: &dyn Display) {
        let text = arg.to_string();
        let pad = " ".repeat(self.alignment.unsigned_abs().saturating_sub(text.chars().count()));
        if self.alignment < 0 {
            out.push_str(&text);
            out.push_str(&pad);
        } else {
            out.push_str(&pad);
            out.push_str(&text);
        }
    }
}
