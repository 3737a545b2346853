//! Unpack an interleaved read batch into FASTQ files.
//!
//! Each line of a batch holds one record as tab-separated fields: 4 fields for
//! a single-end read, 8 for a read pair (mate 1 followed by mate 2). The first
//! non-empty line decides the layout for the whole batch.

use anyhow::{Context, Result};
use log::warn;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Fields of one FASTQ record.
pub const FASTQ_FIELDS_SE: usize = 4;
/// Fields of an interleaved read pair.
pub const FASTQ_FIELDS_PE: usize = 8;

/// The FASTQ files recreated from one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReads {
    /// One file for single-end data, two (mate 1, mate 2) for paired-end data.
    pub files: Vec<PathBuf>,
    pub paired: bool,
    /// Records written to each file.
    pub records: usize,
    /// Paired-end lines dropped because they did not have 8 fields.
    pub skipped_lines: usize,
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(
        File::create(path).with_context(|| path.display().to_string())?,
    ))
}

fn write_fields<'a>(
    writer: &mut impl Write,
    fields: impl IntoIterator<Item = &'a str>,
) -> std::io::Result<()> {
    for field in fields {
        writeln!(writer, "{field}")?;
    }
    Ok(())
}

/// Write the records of `content` to `<output_dir>/<prefix>_1.fq` (and
/// `<prefix>_2.fq` for paired-end data), one field per line.
///
/// Output files are created even when `content` holds no records. In paired-end
/// mode a line without exactly 8 fields is skipped and counted.
pub fn split_interleaved(prefix: &str, content: &str, output_dir: &Path) -> Result<SplitReads> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();

    let paired = lines
        .peek()
        .is_some_and(|first| first.split('\t').count() == FASTQ_FIELDS_PE);

    let mate1 = output_dir.join(format!("{prefix}_1.fq"));
    let mut files = vec![mate1.clone()];
    let mut writer1 = create_writer(&mate1)?;
    let mut writer2 = if paired {
        let mate2 = output_dir.join(format!("{prefix}_2.fq"));
        let writer = create_writer(&mate2)?;
        files.push(mate2);
        Some(writer)
    } else {
        None
    };

    let mut records = 0;
    let mut skipped_lines = 0;
    for line in lines {
        match writer2 {
            Some(ref mut writer2) => {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() != FASTQ_FIELDS_PE {
                    skipped_lines += 1;
                    continue;
                }
                let (read1, read2) = fields.split_at(FASTQ_FIELDS_SE);
                write_fields(&mut writer1, read1.iter().copied())?;
                write_fields(writer2, read2.iter().copied())?;
            }
            None => write_fields(&mut writer1, line.split('\t'))?,
        }
        records += 1;
    }

    writer1
        .flush()
        .with_context(|| files[0].display().to_string())?;
    if let Some(mut writer2) = writer2 {
        writer2
            .flush()
            .with_context(|| files[1].display().to_string())?;
    }

    if skipped_lines > 0 {
        warn!(
            "{prefix}: skipped {skipped_lines} line(s) without {FASTQ_FIELDS_PE} fields in paired-end data"
        );
    }

    Ok(SplitReads {
        files,
        paired,
        records,
        skipped_lines,
    })
}
