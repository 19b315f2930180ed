//! Helpers for the text around (and inside) an XMP body.
//!
//! XMP embedded in files is usually wrapped in `<?xpacket ...?>` processing
//! instructions. Some writers also use single quotes in places that confuse
//! XML parsers. These functions clean that up before parsing, and put the
//! framing back when writing.

use metatree_types::consts::{XMP_PACKET_FOOTER, XMP_PACKET_HEADER};
use winnow::{
    Parser as _,
    ascii::{multispace0, multispace1},
    combinator::eof,
    error::EmptyError,
    token::{one_of, take_until},
};

/// Every XMP packet starts with one of these, including the byte order mark.
const PACKET_OPENERS: [&str; 2] = ["<?xpacket begin='\u{FEFF}", "<?xpacket begin=\"\u{FEFF}"];

/// Checks whether some bytes look like an XMP packet.
///
/// That's true when they start with the `xpacket` header and its byte order
/// mark, using either quote style.
pub fn is_xmp_packet(value: impl AsRef<[u8]>) -> bool {
    let value = value.as_ref();
    PACKET_OPENERS
        .iter()
        .any(|opener| value.starts_with(opener.as_bytes()))
}

/// Swaps single quotes for double quotes.
///
/// A quote right after a lone backslash (`\'`) is left alone. Escaped
/// backslashes (`\\`) are treated as a pair, so the quote in `\\'` does get
/// swapped.
///
/// Note that this touches *every* unescaped apostrophe, including ones in
/// text content.
pub fn normalize_quotes(xmp: &str) -> String {
    let mut out = String::with_capacity(xmp.len());
    let mut chars = xmp.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');

                // whatever follows a backslash is kept as-is: either the other
                // half of `\\`, or an escaped quote
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '\'' => out.push('"'),
            other => out.push(other),
        }
    }

    out
}

/// Removes packet framing from around an XMP body.
///
/// Leading and trailing whitespace goes too. Text without framing comes back
/// trimmed, but otherwise untouched.
pub fn strip_framing(xmp: &str) -> &str {
    let mut body = xmp.trim();

    // header
    let mut input = body;
    if packet_header.parse_next(&mut input).is_ok() {
        log::trace!("Removed XMP packet header.");
        body = input;
    }

    // footer
    if let Some(start) = body.rfind("<?xpacket") {
        let mut input = &body[start..];
        if packet_footer.parse_next(&mut input).is_ok() {
            log::trace!("Removed XMP packet footer.");
            body = &body[..start];
        }
    }

    body.trim()
}

/// Wraps a serialized body in packet framing, if asked.
pub fn add_framing(body: &str, with_header: bool) -> String {
    if with_header {
        format!("{XMP_PACKET_HEADER}\n{body}\n{XMP_PACKET_FOOTER}")
    } else {
        body.into()
    }
}

/// `<?xpacket begin="..." ...?>`
fn packet_header<'s>(input: &mut &'s str) -> Result<&'s str, EmptyError> {
    (
        "<?xpacket",
        multispace1,
        "begin=",
        one_of(['\'', '"']),
        take_until(0.., "?>"),
        "?>",
    )
        .take()
        .parse_next(input)
}

/// `<?xpacket end="w"?>`, and nothing after it.
fn packet_footer(input: &mut &str) -> Result<(), EmptyError> {
    (
        "<?xpacket",
        multispace1,
        "end=",
        one_of(['\'', '"']),
        one_of(['r', 'w']),
        one_of(['\'', '"']),
        multispace0,
        "?>",
        multispace0,
        eof,
    )
        .void()
        .parse_next(input)
}
