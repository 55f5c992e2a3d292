// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(feature = "encoding_rs")]
use alloc::format;
use alloc::string::String;

#[cfg(feature = "encoding_rs")]
use encoding_rs::Encoding;
use nt_string::u16strle::U16StrLe;

/// Character emitted by [`NameDecoder`] for every UTF-16 unit that a [`NarrowingPolicy`] cannot represent.
pub const SUBSTITUTION_CHARACTER: char = '_';

/// Rule for narrowing a single UTF-16 unit to a single-byte character set.
///
/// Implementations return the character that the narrowed byte stands for, or `None` if the unit has no
/// representation in the target character set.
/// Every unit is narrowed on its own, so surrogate halves never form a pair.
///
/// Any `Fn(u16) -> Option<char>` closure is a policy as well.
pub trait NarrowingPolicy {
    /// Narrows `unit`, returning `None` if it cannot be represented.
    fn narrow(&self, unit: u16) -> Option<char>;
}

impl<F> NarrowingPolicy for F
where
    F: Fn(u16) -> Option<char>,
{
    fn narrow(&self, unit: u16) -> Option<char> {
        self(unit)
    }
}

/// Narrowing as performed by the "C" locale: only 7-bit ASCII is representable.
///
/// This is the default policy of [`NameDecoder`].
/// Names in an API Set Namespace are plain ASCII in practice.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AsciiNarrowing;

impl NarrowingPolicy for AsciiNarrowing {
    fn narrow(&self, unit: u16) -> Option<char> {
        u8::try_from(unit)
            .ok()
            .filter(u8::is_ascii)
            .map(char::from)
    }
}

/// Narrowing to ISO-8859-1, where every unit up to `0xFF` maps to the byte of the same value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Latin1Narrowing;

impl NarrowingPolicy for Latin1Narrowing {
    fn narrow(&self, unit: u16) -> Option<char> {
        u8::try_from(unit).ok().map(char::from)
    }
}

/// Narrowing to a single-byte legacy code page known to `encoding_rs`, e.g. windows-1252.
///
/// A unit is representable if the code page encodes it to exactly one byte.
#[cfg(feature = "encoding_rs")]
#[cfg_attr(docsrs, doc(cfg(feature = "encoding_rs")))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CodePageNarrowing {
    encoding: &'static Encoding,
}

#[cfg(feature = "encoding_rs")]
impl CodePageNarrowing {
    /// Creates a policy for `encoding`.
    ///
    /// Returns `None` if `encoding` is not a single-byte encoding.
    pub fn new(encoding: &'static Encoding) -> Option<Self> {
        if encoding.is_single_byte() {
            Some(Self { encoding })
        } else {
            None
        }
    }

    /// Creates a policy for the encoding with the given WHATWG label, e.g. `b"windows-1252"`.
    pub fn for_label(label: &[u8]) -> Option<Self> {
        Encoding::for_label(label).and_then(Self::new)
    }

    /// Creates a policy for a Windows code page number, e.g. `1252`.
    ///
    /// Returns `None` for code pages that are not single-byte or unknown to `encoding_rs`.
    /// ISO-8859-1 (28591) is better served by [`Latin1Narrowing`].
    pub fn for_code_page(code_page: u16) -> Option<Self> {
        let label = match code_page {
            866 => String::from("ibm866"),
            874 | 1250..=1258 => format!("windows-{code_page}"),
            10000 => String::from("macintosh"),
            10007 => String::from("x-mac-cyrillic"),
            20866 => String::from("koi8-r"),
            21866 => String::from("koi8-u"),
            28592..=28606 => format!("iso-8859-{}", code_page - 28590),
            _ => return None,
        };

        Self::for_label(label.as_bytes())
    }

    /// Returns the code page this policy narrows to.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

#[cfg(feature = "encoding_rs")]
impl NarrowingPolicy for CodePageNarrowing {
    fn narrow(&self, unit: u16) -> Option<char> {
        let c = char::from_u32(u32::from(unit))?;
        let mut buf = [0u8; 4];
        let (bytes, _, had_errors) = self.encoding.encode(c.encode_utf8(&mut buf));

        if !had_errors && bytes.len() == 1 {
            Some(c)
        } else {
            None
        }
    }
}

/// Narrowing as performed by a named locale, e.g. `de_DE.ISO-8859-15` or `English_United States.1252`.
///
/// The library never reads the environment.
/// To narrow like the current user's locale, pass the value of `LC_ALL`, `LC_CTYPE` or `LANG`
/// (the first one that is set) to [`from_locale_name`](Self::from_locale_name).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocaleNarrowing {
    /// The locale has no single-byte character set beyond ASCII, like "C", "POSIX" or any UTF-8 locale.
    Ascii(AsciiNarrowing),
    /// The locale uses ISO-8859-1.
    Latin1(Latin1Narrowing),
    /// The locale uses another single-byte code page.
    #[cfg(feature = "encoding_rs")]
    #[cfg_attr(docsrs, doc(cfg(feature = "encoding_rs")))]
    CodePage(CodePageNarrowing),
}

impl LocaleNarrowing {
    /// Picks the narrowing for the character set named after the dot of `locale`.
    ///
    /// The character set is either a name like `ISO-8859-15` or a Windows code page number like `1252`.
    /// Locales without a character set and character sets that are unknown or not single-byte
    /// narrow to ASCII, like the "C" locale.
    pub fn from_locale_name(locale: &str) -> Self {
        let locale = locale.split('@').next().unwrap_or_default();
        let codeset = match locale.split_once('.') {
            Some((_, codeset)) => codeset,
            None => return Self::default(),
        };

        let normalized = codeset
            .chars()
            .filter(|c| !matches!(*c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>();

        if matches!(normalized.as_str(), "iso88591" | "latin1" | "28591") {
            return Self::Latin1(Latin1Narrowing);
        }

        #[cfg(feature = "encoding_rs")]
        {
            let code_page_narrowing = match normalized.parse::<u16>() {
                Ok(code_page) => CodePageNarrowing::for_code_page(code_page),
                Err(_) => CodePageNarrowing::for_label(codeset.as_bytes()),
            };
            if let Some(code_page_narrowing) = code_page_narrowing {
                return Self::CodePage(code_page_narrowing);
            }
        }

        Self::default()
    }
}

impl Default for LocaleNarrowing {
    fn default() -> Self {
        Self::Ascii(AsciiNarrowing)
    }
}

impl NarrowingPolicy for LocaleNarrowing {
    fn narrow(&self, unit: u16) -> Option<char> {
        match self {
            Self::Ascii(policy) => policy.narrow(unit),
            Self::Latin1(policy) => policy.narrow(unit),
            #[cfg(feature = "encoding_rs")]
            Self::CodePage(policy) => policy.narrow(unit),
        }
    }
}

/// Decoder for the UTF-16LE names stored in an API Set Namespace.
///
/// Every UTF-16 unit yields exactly one character of the output: the narrowed character if the
/// [`NarrowingPolicy`] can represent it, [`SUBSTITUTION_CHARACTER`] otherwise.
/// Decoding never fails.
#[derive(Clone, Copy, Debug)]
pub struct NameDecoder<P = AsciiNarrowing> {
    policy: P,
}

impl Default for NameDecoder {
    fn default() -> Self {
        Self::new(AsciiNarrowing)
    }
}

impl<P> NameDecoder<P> {
    /// Creates a decoder narrowing with `policy`.
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Returns the policy of this decoder.
    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<P> NameDecoder<P>
where
    P: NarrowingPolicy,
{
    /// Decodes `name`, whose length in bytes determines the number of UTF-16 units.
    ///
    /// A trailing odd byte is not part of any unit and ignored.
    pub fn decode(&self, name: U16StrLe<'_>) -> String {
        name.0
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .map(|unit| {
                self.policy
                    .narrow(unit)
                    .unwrap_or(SUBSTITUTION_CHARACTER)
            })
            .collect()
    }
}
