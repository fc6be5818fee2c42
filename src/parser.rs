use crate::entry::{EntryAttrs, Region};
use crate::error::{Result, TimelineError};

use nom::bytes::complete::{tag, take_while1, take_while_m_n};
use nom::character::complete::{digit1, line_ending, multispace0, multispace1, space0, space1};
use nom::combinator::{map, map_res, opt, value};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::many_till;
use nom::sequence::terminated;
use nom::{branch::alt, error_position, Err, IResult};

/// Written in place of a timestamp that has not been set yet.
pub const UNDEFINED_TIMESTAMP: &str = "--:--:--,---";

pub const TOP_TAG: &str = "{\\an8}";
pub const BOTTOM_TAG: &str = "{\\an2}";
/// Empty override block put in front of text that starts like a region tag.
pub const ESCAPE_TAG: &str = "{}";

#[derive(Default)]
pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parses SRT text into entry attributes. Synced entries come first,
    /// ordered by start time, followed by unsynced ones in file order.
    pub fn parse(&mut self, input: &str) -> Result<Vec<EntryAttrs>> {
        match srt_file(input) {
            Ok((_, subs)) => Ok(subs),
            Err(Err::Error(err)) | Err(Err::Failure(err)) => {
                let conv = convert_error(input, err);
                Err(TimelineError::Parse(format!(
                    "Failed to parse SRT file: {}",
                    conv
                )))
            }
            Err(Err::Incomplete(_)) => {
                unreachable!("Incomplete data received by non-streaming parser.")
            }
        }
    }
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn srt_file(input: &str) -> IResult<&str, Vec<EntryAttrs>, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (input, mut subs) = all_subtitles(input)?;
    let (input, _) = end_of_file(input)?;
    subs.sort_by_key(|s| {
        if s.is_synced() {
            (false, s.start_time)
        } else {
            (true, None)
        }
    });
    Ok((input, subs))
}

fn all_subtitles(input: &str) -> IResult<&str, Vec<EntryAttrs>, VerboseError<&str>> {
    let mut parsed_subs = Vec::new();
    let (mut input, _) = multispace0(input)?;
    loop {
        match subtitle(input) {
            Ok((rem_input, subtitle)) => {
                parsed_subs.push(subtitle);
                input = rem_input;
                let (rem_input, _) = multispace0(input)?;
                input = rem_input;
            }
            Err(err) => {
                if input.is_empty() {
                    return Ok((input, parsed_subs));
                } else {
                    return Err(err);
                }
            }
        }
    }
}

fn subtitle(input: &str) -> IResult<&str, EntryAttrs, VerboseError<&str>> {
    let (input, _) = terminated(seq_num, multispace1)(input)?;
    let (input, (start_time, end_time)) = terminated(show_hide, line_ending)(input)?;
    let (input, mut lines) = sub_text(input)?;
    let region = strip_region(&mut lines);
    for line in lines.iter_mut() {
        unescape_blank(line);
    }

    Ok((
        input,
        EntryAttrs {
            start_time,
            end_time,
            content: lines.join("\n"),
            region,
            start_of_paragraph: false,
        },
    ))
}

fn strip_region(lines: &mut [String]) -> Option<Region> {
    let first = lines.first_mut()?;
    for (tag, region) in [(TOP_TAG, Region::Top), (BOTTOM_TAG, Region::Bottom)].iter() {
        if let Some(rest) = first.strip_prefix(*tag) {
            *first = rest.to_string();
            return Some(*region);
        }
    }
    if let Some(rest) = first.strip_prefix(ESCAPE_TAG) {
        *first = rest.to_string();
    }
    None
}

/// Blank text lines are written with one extra space so they do not end the
/// block.
fn unescape_blank(line: &mut String) {
    if !line.is_empty() && line.chars().all(|c| c == ' ') {
        line.pop();
    }
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn sub_text(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    let line = terminated(
        take_while1(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, end_of_file)),
    );

    let (input, (vec, _)) = many_till(line, alt((line_ending, end_of_file)))(input)?;

    Ok((input, vec.into_iter().map(String::from).collect()))
}

fn show_hide(input: &str) -> IResult<&str, (Option<i64>, Option<i64>), VerboseError<&str>> {
    let (input, show_at) = optional_timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, hide_at) = optional_timestamp(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (show_at, hide_at)))
}

fn optional_timestamp(input: &str) -> IResult<&str, Option<i64>, VerboseError<&str>> {
    alt((
        value(None, tag(UNDEFINED_TIMESTAMP)),
        map(timestamp, Some),
    ))(input)
}

fn timestamp(input: &str) -> IResult<&str, i64, VerboseError<&str>> {
    const MILLIS_MIN: usize = 0;
    const MILLIS_MAX: usize = 3;
    let take_millis = || {
        map_res(
            take_while_m_n(MILLIS_MIN, MILLIS_MAX, |c: char| c.is_ascii_digit()),
            move |s: &str| {
                if s.len() < MILLIS_MAX {
                    // `,2` is not valid SRT but shows up in the wild. Read it as
                    // `,200` by right-padding to three digits.
                    let millis = format!("{:0<3}", s);
                    millis.parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    const HMS_MIN: usize = 0;
    const HMS_MAX: usize = 2;
    let take_hms = || {
        map_res(
            take_while_m_n(HMS_MIN, HMS_MAX, |c: char| c.is_ascii_digit()),
            |s: &str| {
                if s.len() < HMS_MAX {
                    // Left-pad here: 1:13:45 means 01:13:45.
                    let padded = format!("{:0>2}", s);
                    padded.parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    let (input, hours): (_, i64) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes): (_, i64) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds): (_, i64) = take_hms()(input)?;
    let (input, _) = tag(",")(input)?;
    let (input, millis): (_, i64) = take_millis()(input)?;

    Ok((
        input,
        millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
    ))
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}
