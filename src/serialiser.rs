use crate::srt::Cue;

use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

/// Writes `cues` to `output` in SRT format and returns how many were written.
///
/// The file is created even when there are no cues.
pub fn serialise<I, P>(cues: I, output: P) -> Result<usize>
where
    I: IntoIterator<Item = Cue>,
    P: AsRef<Path>,
{
    let output = output.as_ref();
    let file = std::fs::File::create(output)
        .context(format!("Failed to create file: '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    let written = write_cues(&mut writer, cues).context("Failed to write to output file.")?;
    writer.flush().context("Failed to write to output file.")?;
    Ok(written)
}

fn write_cues<W: Write, I: IntoIterator<Item = Cue>>(buf: &mut W, cues: I) -> Result<usize> {
    let mut written = 0;
    for cue in cues {
        write_cue(buf, cue)?;
        written += 1;
    }
    Ok(written)
}

fn write_cue<W: Write>(buf: &mut W, cue: Cue) -> Result<()> {
    writeln!(buf, "{}", cue.index)?;
    write_ts(buf, cue.start)?;
    write!(buf, " --> ")?;
    write_ts(buf, cue.end)?;
    writeln!(buf)?;
    writeln!(buf, "{}", cue.text)?;
    writeln!(buf)?;
    Ok(())
}

fn write_ts<W: Write>(buf: &mut W, timestamp: Duration) -> Result<()> {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.subsec_millis();
    write!(
        buf,
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, seconds, millis
    )?;
    Ok(())
}
