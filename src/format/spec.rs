//! Conversions (`!r`) and format specs (`:>4`) applied to substituted values.

/// A `!c` conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `!s`: unchanged.
    Str,
    /// `!r`: text is quoted.
    Repr,
    /// `!a`: text is quoted and non-ASCII characters escaped.
    Ascii,
}

impl Conversion {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Conversion::Str),
            'r' => Some(Conversion::Repr),
            'a' => Some(Conversion::Ascii),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Conversion::Str => 's',
            Conversion::Repr => 'r',
            Conversion::Ascii => 'a',
        }
    }

    /// Numbers are never quoted.
    pub fn apply(&self, text: &str, numeric: bool) -> String {
        if numeric {
            return text.to_string();
        }
        match self {
            Conversion::Str => text.to_string(),
            Conversion::Repr => format!("'{}'", text),
            Conversion::Ascii => {
                let mut out = String::from("'");
                for c in text.chars() {
                    let code = c as u32;
                    match code {
                        0..=0x7f => out.push(c),
                        0x80..=0xff => out.push_str(&format!("\\x{:02x}", code)),
                        0x100..=0xffff => out.push_str(&format!("\\u{:04x}", code)),
                        _ => out.push_str(&format!("\\U{:08x}", code)),
                    }
                }
                out.push('\'');
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Pad between a leading sign and the digits.
    AfterSign,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        }
    }
}

/// `[[fill]align][0][width]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSpec {
    fill: Option<char>,
    align: Option<Align>,
    zero: bool,
    width: usize,
}

impl FormatSpec {
    /// Returns `None` for anything outside the supported subset.
    pub fn parse(spec: &str) -> Option<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;

        if let Some(align) = chars.get(1).and_then(|c| Align::from_char(*c)) {
            out.fill = Some(chars[0]);
            out.align = Some(align);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|c| Align::from_char(*c)) {
            out.align = Some(align);
            i = 1;
        }

        if chars.get(i) == Some(&'0') {
            out.zero = true;
            i += 1;
        }

        let digits: String = chars[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
        i += digits.len();
        if !digits.is_empty() {
            out.width = digits.parse().ok()?;
        }

        if i != chars.len() {
            return None;
        }
        Some(out)
    }

    pub fn apply(&self, text: &str, numeric: bool) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text.to_string();
        }
        let pad = self.width - len;

        let fill = self.fill.unwrap_or(if self.zero { '0' } else { ' ' });
        let align = self.align.unwrap_or(match (numeric, self.zero) {
            (true, true) => Align::AfterSign,
            (true, false) => Align::Right,
            (false, _) => Align::Left,
        });
        let padding = |n: usize| fill.to_string().repeat(n);

        match align {
            Align::Left => format!("{}{}", text, padding(pad)),
            Align::Right => format!("{}{}", padding(pad), text),
            Align::Center => {
                let left = pad / 2;
                format!("{}{}{}", padding(left), text, padding(pad - left))
            }
            Align::AfterSign => match text.strip_prefix(['+', '-']) {
                Some(digits) => format!("{}{}{}", &text[..1], padding(pad), digits),
                None => format!("{}{}", padding(pad), text),
            },
        }
    }
}
