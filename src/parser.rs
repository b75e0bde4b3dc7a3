use crate::error::SubtitlerError;
use crate::srt::Cue;

use std::time::Duration;

use anyhow::Context;
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, digit1, line_ending, not_line_ending};
use nom::combinator::{all_consuming, map, map_res, verify};
use nom::error::{convert_error, VerboseError};
use nom::multi::many0;
use nom::sequence::{separated_pair, terminated, tuple};
use nom::{Err, IResult};

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Reads cues back from SRT text in the layout `serialiser` writes:
/// index line, `HH:MM:SS,mmm --> HH:MM:SS,mmm`, one text line, blank line.
/// Hours may exceed two digits.
pub fn parse(input: &str) -> anyhow::Result<Vec<Cue>> {
    match all_consuming(many0(cue))(input) {
        Ok((_, cues)) => Ok(cues),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => {
            Err(SubtitlerError::ParseError(convert_error(input, err)))
                .context("Failed to parse SRT file")
        }
        Err(Err::Incomplete(_)) => {
            unreachable!("Incomplete data received by non-streaming parser.")
        }
    }
}

fn cue(input: &str) -> Res<Cue> {
    let (input, index) =
        terminated(map_res(digit1, |s: &str| s.parse::<usize>()), line_ending)(input)?;
    let (input, (start, end)) =
        terminated(separated_pair(timestamp, tag(" --> "), timestamp), line_ending)(input)?;
    let (input, text) = terminated(not_line_ending, line_ending)(input)?;
    let (input, _) = line_ending(input)?;

    Ok((
        input,
        Cue {
            index,
            start,
            end,
            text: text.to_string(),
        },
    ))
}

fn timestamp(input: &str) -> Res<Duration> {
    map(
        tuple((
            terminated(map_res(digit1, |s: &str| s.parse::<u64>()), char(':')),
            terminated(below_sixty, char(':')),
            terminated(below_sixty, char(',')),
            digits(3),
        )),
        |(hours, minutes, seconds, millis)| {
            Duration::from_millis(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
        },
    )(input)
}

fn below_sixty(input: &str) -> Res<u64> {
    verify(digits(2), |v: &u64| *v < 60)(input)
}

fn digits<'a>(count: usize) -> impl FnMut(&'a str) -> Res<'a, u64> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>(),
    )
}
