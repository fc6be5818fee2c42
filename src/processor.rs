use subedit::{EntryId, SubtitleList};

use anyhow::{Context, Result};
use log::info;
use regex::Regex;

pub struct ProcessOpts {
    pub leader_sub: Option<String>,
    pub drop_patterns: Vec<String>,
    pub shift_forward: Option<(i64, i64)>,
    pub shift_backward: Option<(i64, i64)>,
    pub clear_timings: bool,
}

pub fn process(subs: &mut SubtitleList, opts: ProcessOpts) -> Result<()> {
    strip_matching(subs, &opts.drop_patterns)?;
    if let Some((pivot, duration)) = opts.shift_forward {
        subs.shift_forward(pivot, duration)?;
    }
    if let Some((pivot, duration)) = opts.shift_backward {
        subs.shift_backward(pivot, duration)?;
    }
    if opts.clear_timings {
        subs.clear_all_timings()?;
    }
    if let Some(text) = opts.leader_sub {
        insert_leader(subs, &text)?;
    }
    Ok(())
}

fn insert_leader(subs: &mut SubtitleList, text: &str) -> Result<()> {
    let first = match subs.entry(0) {
        Some(first) if first.is_synced() => first.id(),
        _ => return Ok(()),
    };
    let leader = subs.insert_before(Some(first), None)?;
    subs.update_content(leader, text, None)?;
    Ok(())
}

fn strip_matching(subs: &mut SubtitleList, patterns: &[String]) -> Result<()> {
    let regexes = load_regex(patterns)?;
    if regexes.is_empty() {
        return Ok(());
    }
    let matching: Vec<EntryId> = subs
        .entries()
        .iter()
        .filter(|sub| {
            sub.content.lines().any(|line| {
                regexes.iter().any(|r| {
                    let mtch = r.is_match(line);
                    if mtch {
                        info!("Matched \"{}\" against /{}/", line, r);
                    }
                    mtch
                })
            })
        })
        .map(|sub| sub.id())
        .collect();
    for id in matching {
        subs.remove_entry(id)?;
    }
    Ok(())
}

fn load_regex(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| p.trim_start())
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .map(|p| Regex::new(p).context(format!("Invalid regex: '{}'", p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "1\n00:00:02,000 --> 00:00:03,000\nhello\n\n\
                         2\n00:00:04,000 --> 00:00:05,000\nwww.ads.example\n\n";

    fn opts() -> ProcessOpts {
        ProcessOpts {
            leader_sub: None,
            drop_patterns: Vec::new(),
            shift_forward: None,
            shift_backward: None,
            clear_timings: false,
        }
    }

    #[test]
    fn drops_matching_and_adds_leader() {
        let mut subs = SubtitleList::from_srt(INPUT).unwrap();
        let opts = ProcessOpts {
            leader_sub: Some("Subtitles loaded.".to_string()),
            drop_patterns: vec!["# comment".to_string(), r"ads\.example".to_string()],
            ..opts()
        };

        process(&mut subs, opts).unwrap();

        assert_eq!(
            subs.serialize(),
            "1\n00:00:00,500 --> 00:00:01,500\nSubtitles loaded.\n\n\
             2\n00:00:02,000 --> 00:00:03,000\nhello\n\n"
        );
    }

    #[test]
    fn shifts_forward() {
        let mut subs = SubtitleList::from_srt(INPUT).unwrap();
        let opts = ProcessOpts {
            shift_forward: Some((0, 1000)),
            ..opts()
        };

        process(&mut subs, opts).unwrap();

        assert_eq!(subs.entry(0).unwrap().start_time, Some(3000));
        assert_eq!(subs.entry(1).unwrap().end_time, Some(6000));
    }

    #[test]
    fn invalid_pattern_fails() {
        let mut subs = SubtitleList::from_srt(INPUT).unwrap();
        let opts = ProcessOpts {
            drop_patterns: vec!["(".to_string()],
            ..opts()
        };

        assert!(process(&mut subs, opts).is_err());
    }
}
