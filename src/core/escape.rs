/// Escape text for embedding in a Tracks XML payload.
///
/// The five XML specials use their named references. Every other character
/// that HTML 4 gives a named entity is written as a numeric reference, since
/// XML parsers only know the five built-in names.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if has_named_entity(c) => {
                out.push_str("&#");
                out.push_str(&u32::from(c).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
    }
    out
}

/// Whether HTML 4 defines a named character entity for this code point.
fn has_named_entity(c: char) -> bool {
    matches!(
        u32::from(c),
        0x00A0..=0x00FF
            | 0x0152
            | 0x0153
            | 0x0160
            | 0x0161
            | 0x0178
            | 0x0192
            | 0x02C6
            | 0x02DC
            | 0x0391..=0x03A1
            | 0x03A3..=0x03A9
            | 0x03B1..=0x03C9
            | 0x03D1
            | 0x03D2
            | 0x03D6
            | 0x2002
            | 0x2003
            | 0x2009
            | 0x200C..=0x200F
            | 0x2013
            | 0x2014
            | 0x2018..=0x201A
            | 0x201C..=0x201E
            | 0x2020..=0x2022
            | 0x2026
            | 0x2030
            | 0x2032
            | 0x2033
            | 0x2039
            | 0x203A
            | 0x203E
            | 0x2044
            | 0x20AC
            | 0x2111
            | 0x2118
            | 0x211C
            | 0x2122
            | 0x2135
            | 0x2190..=0x2194
            | 0x21B5
            | 0x21D0..=0x21D4
            | 0x2200
            | 0x2202
            | 0x2203
            | 0x2205
            | 0x2207..=0x2209
            | 0x220B
            | 0x220F
            | 0x2211
            | 0x2212
            | 0x2217
            | 0x221A
            | 0x221D
            | 0x221E
            | 0x2220
            | 0x2227..=0x222B
            | 0x2234
            | 0x223C
            | 0x2245
            | 0x2248
            | 0x2260
            | 0x2261
            | 0x2264
            | 0x2265
            | 0x2282..=0x2284
            | 0x2286
            | 0x2287
            | 0x2295
            | 0x2297
            | 0x22A5
            | 0x22C5
            | 0x2308..=0x230B
            | 0x2329
            | 0x232A
            | 0x25CA
            | 0x2660
            | 0x2663
            | 0x2665
            | 0x2666
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_xml_specials_by_name() {
        assert_eq!(
            xml_escape(r#"Tom & Jerry <"fight"> 'now'"#),
            "Tom &amp; Jerry &lt;&quot;fight&quot;&gt; &apos;now&apos;"
        );
    }

    #[test]
    fn escapes_named_html_entities_numerically() {
        assert_eq!(xml_escape("café"), "caf&#233;");
        assert_eq!(xml_escape("5 €"), "5 &#8364;");
        assert_eq!(xml_escape("a\u{a0}b"), "a&#160;b");
        assert_eq!(xml_escape("α → β"), "&#945; &#8594; &#946;");
    }

    #[test]
    fn leaves_plain_and_unnamed_text_alone() {
        assert_eq!(xml_escape("Call Bill"), "Call Bill");
        assert_eq!(xml_escape("日本語 ✓"), "日本語 ✓");
        assert_eq!(xml_escape(""), "");
    }
}
