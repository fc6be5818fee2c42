use crate::entry::{EntryAttrs, Region};
use crate::parser::{BOTTOM_TAG, ESCAPE_TAG, TOP_TAG, UNDEFINED_TIMESTAMP};

/// Renders records as SRT, numbering them in the order given.
pub fn serialise<'a, I>(subs: I) -> String
where
    I: IntoIterator<Item = &'a EntryAttrs>,
{
    let mut out = String::new();
    for (seqnum, sub) in subs.into_iter().enumerate() {
        write_sub(&mut out, seqnum + 1, sub);
    }
    out
}

fn write_sub(out: &mut String, seqnum: usize, sub: &EntryAttrs) {
    out.push_str(&seqnum.to_string());
    out.push('\n');
    out.push_str(&format!(
        "{} --> {}\n",
        format_ts(sub.start_time),
        format_ts(sub.end_time)
    ));
    for line in text_lines(sub) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
}

/// Lines of a block's text. A blank line would end the block, so lines made
/// of spaces only get one extra space. A leading tag-like text on an entry
/// without region goes behind an empty `{}` so it is not read as a region.
fn text_lines(sub: &EntryAttrs) -> Vec<String> {
    let mut lines: Vec<String> = if sub.content.is_empty() {
        Vec::new()
    } else {
        sub.content
            .split('\n')
            .map(|line| {
                if line.chars().all(|c| c == ' ') {
                    format!("{} ", line)
                } else {
                    line.to_string()
                }
            })
            .collect()
    };

    let tag = match sub.region {
        Some(Region::Top) => TOP_TAG,
        Some(Region::Bottom) => BOTTOM_TAG,
        None if needs_escape(&sub.content) => ESCAPE_TAG,
        None => "",
    };
    if !tag.is_empty() {
        match lines.first_mut() {
            Some(first) => first.insert_str(0, tag),
            None => lines.push(tag.to_string()),
        }
    }
    lines
}

fn needs_escape(content: &str) -> bool {
    [TOP_TAG, BOTTOM_TAG, ESCAPE_TAG]
        .iter()
        .any(|tag| content.starts_with(*tag))
}

/// SRT has no negative timestamps; those are written as zero.
fn format_ts(timestamp: Option<i64>) -> String {
    let millis = match timestamp {
        Some(millis) => millis.max(0),
        None => return UNDEFINED_TIMESTAMP.to_string(),
    };
    let total_secs = millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        hours,
        minutes,
        seconds,
        millis % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    macro_rules! test_write_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(format_ts(input), expected);
            }
        )*
        }
    }

    test_write_ts! {
        test_write_ts_0: (Some(0), "00:00:00,000"),
        test_write_ts_1: (Some(1), "00:00:00,001"),
        test_write_ts_2: (Some(999), "00:00:00,999"),
        test_write_ts_3: (Some(1000), "00:00:01,000"),
        test_write_ts_4: (Some(59_999), "00:00:59,999"),
        test_write_ts_5: (Some(60_000), "00:01:00,000"),
        test_write_ts_6: (Some(3_600_000), "01:00:00,000"),
        test_write_ts_7: (Some(7_326_159), "02:02:06,159"),
        test_write_ts_8: (Some(360_000_001), "100:00:00,001"),
        test_write_ts_9: (Some(-20), "00:00:00,000"),
        test_write_ts_10: (None, "--:--:--,---"),
    }

    #[test]
    fn writes_numbered_blocks() {
        let subs = vec![
            EntryAttrs::timed(1000, 2000).with_content("one\ntwo"),
            EntryAttrs::timed(3000, 4000)
                .with_content("top")
                .with_region(Some(Region::Top)),
            EntryAttrs::default(),
        ];

        let text = serialise(&subs);

        assert_eq!(
            text,
            "1\n00:00:01,000 --> 00:00:02,000\none\ntwo\n\n\
             2\n00:00:03,000 --> 00:00:04,000\n{\\an8}top\n\n\
             3\n--:--:--,--- --> --:--:--,---\n\n"
        );
    }

    #[test]
    fn output_reads_back() {
        let subs = vec![
            EntryAttrs::timed(1000, 2000).with_content("one"),
            EntryAttrs::timed(2500, 2600)
                .with_content("low")
                .with_region(Some(Region::Bottom)),
            EntryAttrs::timed(5000, 6000).with_region(Some(Region::Top)),
            EntryAttrs::default().with_content("later"),
        ];

        let parsed = Parser::new().parse(&serialise(&subs)).unwrap();

        assert_eq!(parsed, subs);
    }

    #[test]
    fn blank_lines_read_back() {
        let subs = vec![
            EntryAttrs::timed(1000, 2000).with_content("a\n\nb"),
            EntryAttrs::timed(3000, 4000).with_content("x\n  \ny\n"),
            EntryAttrs::timed(5000, 6000).with_content(" "),
        ];

        let text = serialise(&subs);
        let parsed = Parser::new().parse(&text).unwrap();

        assert!(text.starts_with("1\n00:00:01,000 --> 00:00:02,000\na\n \nb\n\n"));
        assert_eq!(parsed, subs);
    }

    #[test]
    fn literal_tags_read_back() {
        let subs = vec![
            EntryAttrs::timed(1000, 2000).with_content("{\\an8}literal"),
            EntryAttrs::timed(3000, 4000).with_content("{}braces"),
            EntryAttrs::timed(5000, 6000)
                .with_content("{\\an2}inner")
                .with_region(Some(Region::Top)),
            EntryAttrs::timed(7000, 8000).with_content("{\\an2}"),
        ];

        let text = serialise(&subs);
        let parsed = Parser::new().parse(&text).unwrap();

        assert!(text.contains("\n{}{\\an8}literal\n"));
        assert_eq!(parsed, subs);
    }
}
