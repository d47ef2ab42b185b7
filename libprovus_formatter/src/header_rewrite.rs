use std::path::Path;

use super::error::HeaderRewriteError;

const FREQUENCY_KEYS: [&str; 3] = ["BFREQ", "BASEFREQ", "BASEFREQUENCY"];
const WAVEFORM_TAG: &str = "WAVEFORM:";
const SAMPLING_TAG: &str = "SAMPLING:";
const CONTINUATION: char = '&';

/// Rebuild a base-frequency header line so it references the given descriptors.
///
/// Existing WAVEFORM/SAMPLING tags are replaced and a trailing continuation
/// marker is kept. Fields are tab separated.
pub fn tag_line(line: &str, waveform_name: &str, sampling_name: &str) -> String {
    let trimmed = line.trim_end();
    let continued = trimmed.ends_with(CONTINUATION);
    let trimmed = trimmed.trim_end_matches(CONTINUATION).trim_end();

    let mut parts: Vec<String> = trimmed
        .split('\t')
        .filter(|part| !(part.starts_with(WAVEFORM_TAG) || part.starts_with(SAMPLING_TAG)))
        .map(String::from)
        .collect();
    parts.push(format!("{WAVEFORM_TAG} {waveform_name}"));
    parts.push(format!("{SAMPLING_TAG} {sampling_name}"));

    let mut tagged = parts.join("\t");
    if continued {
        tagged.push(' ');
        tagged.push(CONTINUATION);
    }
    tagged
}

/// Tag the first base-frequency line of a header text. Returns `None` when no line
/// carries a base frequency. Line terminators are left as they were.
pub fn rewrite_contents(contents: &str, waveform_name: &str, sampling_name: &str) -> Option<String> {
    let mut rewritten = String::with_capacity(contents.len() + 64);
    let mut found = false;
    for line in contents.split_inclusive('\n') {
        if !found && FREQUENCY_KEYS.iter().any(|key| line.contains(key)) {
            found = true;
            let body = line.trim_end_matches(['\r', '\n']);
            rewritten.push_str(&tag_line(body, waveform_name, sampling_name));
            rewritten.push_str(&line[body.len()..]);
        } else {
            rewritten.push_str(line);
        }
    }
    found.then_some(rewritten)
}

/// Tag a TEM source file in place with the names of its generated descriptors
pub fn rewrite_header_tags(
    path: &Path,
    waveform_name: &str,
    sampling_name: &str,
) -> Result<(), HeaderRewriteError> {
    let contents = std::fs::read_to_string(path)?;
    let rewritten = rewrite_contents(&contents, waveform_name, sampling_name)
        .ok_or_else(|| HeaderRewriteError::NoFrequencyLine(path.to_path_buf()))?;
    if rewritten != contents {
        std::fs::write(path, rewritten)?;
        spdlog::info!("Tagged header of {}", path.display());
    }
    Ok(())
}
