use anyhow::{Context, Result};
use falco_types::config::ToolOverrides;
use falco_types::ParametersFile;
use std::fs;
use std::path::{Path, PathBuf};

/// Copies mate 1 to the alignment and reports a read count in `Log.final.out`.
pub const FAKE_STAR: &str = r#"
reads=""
while [ $# -gt 0 ]; do
  case "$1" in
    --readFilesIn) reads="$2"; shift 2 ;;
    --outFileNamePrefix) prefix="$2"; shift 2 ;;
    *) shift ;;
  esac
done
n=$(( $(wc -l < "$reads") / 4 ))
cp "$reads" "${prefix}Aligned.out.sam"
printf '                          Number of input reads |\t%s\n' "$n" > "${prefix}Log.final.out"
printf '                   Uniquely mapped reads number |\t%s\n' "$n" >> "${prefix}Log.final.out"
printf '                        Uniquely mapped reads %% |\t100.00%%\n' >> "${prefix}Log.final.out"
"#;

/// Copies mate 1 to the alignment and prints a summary on stderr.
pub const FAKE_HISAT2: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -1|-U) reads="$2"; shift 2 ;;
    -S) sam="$2"; shift 2 ;;
    *) shift ;;
  esac
done
n=$(( $(wc -l < "$reads") / 4 ))
cp "$reads" "$sam"
echo "$n reads; of these:" >&2
echo "  $n (100.00%) were unpaired; of these:" >&2
echo "    $n (100.00%) aligned 0 times" >&2
echo "100.00% overall alignment rate" >&2
"#;

/// Counts every aligned record towards gene `G1`.
pub const FAKE_FEATURE_COUNTS: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) aligned="$1"; shift ;;
  esac
done
n=$(( $(wc -l < "$aligned") / 4 ))
{
  echo '# Program:featureCounts v1.5.3; Command: fake'
  printf 'Geneid\tChr\tStart\tEnd\tStrand\tLength\t%s\n' "$aligned"
  printf 'G1\tchr1\t1\t100\t+\t100\t%s\n' "$n"
  printf 'G2\tchr1\t200\t300\t+\t101\t0\n'
} > "$out"
{
  printf 'Status\t%s\n' "$aligned"
  printf 'Assigned\t%s\n' "$n"
  printf 'Unassigned_NoFeatures\t0\n'
} > "$out.summary"
"#;

/// Counts every aligned record towards gene `G1`.
pub const FAKE_HTSEQ: &str = r#"
prev=""
last=""
for a in "$@"; do prev="$last"; last="$a"; done
n=$(( $(wc -l < "$prev") / 4 ))
printf 'G1\t%s\n__no_feature\t2\n__ambiguous\t0\n' "$n"
"#;

/// Writes a one-section metrics file to the `O=` argument.
pub const FAKE_PICARD: &str = r#"
for a in "$@"; do
  case "$a" in
    O=*) out="${a#O=}" ;;
  esac
done
{
  printf '## htsjdk.samtools.metrics.StringHeader\n'
  printf '## METRICS CLASS\tpicard.analysis.RnaSeqMetrics\n'
  printf 'PF_BASES\tPF_ALIGNED_BASES\tRIBOSOMAL_BASES\tCODING_BASES\tUTR_BASES\tINTRONIC_BASES\tINTERGENIC_BASES\tIGNORED_READS\tCORRECT_STRAND_READS\tINCORRECT_STRAND_READS\n'
  printf '1000\t900\t\t500\t200\t150\t50\t0\t0\t0\n'
} > "$out"
"#;

/// Exits the way STAR does on a broken genome index.
pub const FAILING_TOOL: &str = r#"
echo "Sep 09 10:12:51 ..... started STAR run"
echo "EXITING because of FATAL ERROR: could not open genome file" >&2
exit 104
"#;

/// Set the executable bits on a script (linux only)
pub fn set_permissions(path: &Path) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| path.display().to_string())?;
    }
    Ok(())
}

/// Write an executable `sh` script named `name` into `dir`.
pub fn write_tool_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}"))
        .with_context(|| path.display().to_string())?;
    set_permissions(&path)?;
    Ok(path)
}

/// Lay out a reference folder, a scratch folder and fake tools below `root`,
/// and return parameters that point at them.
pub fn fake_pipeline(root: &Path) -> Result<ParametersFile> {
    let reference = root.join("ref");
    let scratch = root.join("scratch");
    let tools = root.join("tools");
    for dir in [&reference.join("genome_ref"), &scratch, &tools] {
        fs::create_dir_all(dir).with_context(|| dir.display().to_string())?;
    }
    fs::write(reference.join("genome_ref").join("genes.gtf"), "")?;

    let script = |name: &str, body: &str| -> Result<Option<String>> {
        Ok(Some(
            write_tool_script(&tools, name, body)?
                .display()
                .to_string(),
        ))
    };

    Ok(ParametersFile {
        annotation_file: "genes.gtf".to_string(),
        reference_folder: reference,
        scratch_folder: scratch,
        app_folder: root.join("app"),
        threads: 1,
        tools: ToolOverrides {
            star: script("STAR", FAKE_STAR)?,
            hisat2: script("hisat2", FAKE_HISAT2)?,
            feature_counts: script("featureCounts", FAKE_FEATURE_COUNTS)?,
            htseq_count: script("htseq-count", FAKE_HTSEQ)?,
            picard: script("picard", FAKE_PICARD)?,
        },
        ..ParametersFile::default()
    })
}

/// Replace one of the tools created by [`fake_pipeline`] with a script that fails.
pub fn break_tool(root: &Path, name: &str) -> Result<PathBuf> {
    write_tool_script(&root.join("tools"), name, FAILING_TOOL)
}

/// Interleaved single-end batch of `n` reads.
pub fn single_end_batch(n: usize) -> String {
    (0..n)
        .map(|i| format!("@read{i}\tACGTACGT\t+\tIIIIIIII\n"))
        .collect()
}

/// Interleaved paired-end batch of `n` read pairs.
pub fn paired_end_batch(n: usize) -> String {
    (0..n)
        .map(|i| format!("@read{i}/1\tACGTACGT\t+\tIIIIIIII\t@read{i}/2\tTTGGCCAA\t+\tHHHHHHHH\n"))
        .collect()
}
