use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tokio::fs;
use tracing::{info, warn};

use crate::{error::Result, types::VideoSummary};

/// Files written for one run. The short and unified files exist only when
/// the second summarization pass ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub long: PathBuf,
    pub short: Option<PathBuf>,
    pub unified: Option<PathBuf>,
}

/// Replace characters that would escape or break a file name.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "video".to_string()
    } else {
        cleaned
    }
}

pub fn artifact_paths(dir: &Path, channel: &str, run_at: NaiveDateTime) -> Artifacts {
    let stem = sanitize_file_stem(channel);
    let stamp = run_at.format("%Y%m%d_%H%M%S");

    Artifacts {
        long: dir.join(format!("{}_Summary_{}.md", stem, stamp)),
        short: Some(dir.join(format!("{}_Short_Summary_{}.md", stem, stamp))),
        unified: Some(dir.join(format!("{}_Unified_Summary_{}.md", stem, stamp))),
    }
}

/// Write the long, short and unified summaries of a run.
///
/// Either every file is written or none is left behind.
pub async fn write_artifacts(
    summary: &VideoSummary,
    dir: &Path,
    run_at: NaiveDateTime,
) -> Result<Artifacts> {
    fs::create_dir_all(dir).await?;
    let mut artifacts = artifact_paths(dir, &summary.channel, run_at);

    let long: String = summary
        .chapters
        .iter()
        .map(|chapter| format!("{}\n\n", chapter))
        .collect();
    let mut files = vec![(artifacts.long.clone(), long)];

    match &summary.unified {
        Some(unified) => {
            let short = summary.short_chapters.join("\n\n");
            files.extend(artifacts.short.clone().map(|path| (path, short)));
            files.extend(artifacts.unified.clone().map(|path| (path, unified.clone())));
        }
        None => {
            artifacts.short = None;
            artifacts.unified = None;
        }
    }

    write_all_or_nothing(&files).await?;
    for (path, _) in &files {
        info!(path = %path.display(), "wrote summary");
    }

    Ok(artifacts)
}

async fn write_all_or_nothing(files: &[(PathBuf, String)]) -> Result<()> {
    for (written, (path, contents)) in files.iter().enumerate() {
        if let Err(e) = fs::write(path, contents).await {
            for (path, _) in &files[..written] {
                if let Err(cleanup) = fs::remove_file(path).await {
                    warn!(path = %path.display(), "could not remove partial output: {cleanup}");
                }
            }
            return Err(e.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SectionSource;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    fn summary(unified: Option<&str>) -> VideoSummary {
        VideoSummary {
            title: "Title".to_string(),
            channel: "Lex/Fridman".to_string(),
            source: SectionSource::Outline,
            chapters: vec!["## 00:00:01 Intro\n- a".to_string(), "## 00:05:00 Main\n- b".to_string()],
            short_chapters: vec!["- a".to_string(), "- b".to_string()],
            unified: unified.map(str::to_string),
        }
    }

    #[test]
    fn channel_names_become_safe_stems() {
        assert_eq!(sanitize_file_stem("Lex/Fridman"), "Lex_Fridman");
        assert_eq!(sanitize_file_stem("a:b*c?"), "a_b_c_");
        assert_eq!(sanitize_file_stem(".."), "video");
        assert_eq!(sanitize_file_stem("   "), "video");
        assert_eq!(sanitize_file_stem("Kurzgesagt – In a Nutshell"), "Kurzgesagt – In a Nutshell");
    }

    #[test]
    fn artifact_names_carry_channel_and_time() {
        let paths = artifact_paths(Path::new("out"), "Chan", run_at());
        assert_eq!(paths.long, Path::new("out/Chan_Summary_20240309_140507.md"));
        assert_eq!(
            paths.short.unwrap(),
            Path::new("out/Chan_Short_Summary_20240309_140507.md")
        );
        assert_eq!(
            paths.unified.unwrap(),
            Path::new("out/Chan_Unified_Summary_20240309_140507.md")
        );
    }

    #[tokio::test]
    async fn writes_all_three_files() {
        let temp_dir = TempDir::new().unwrap();
        let artifacts = write_artifacts(&summary(Some("- overall")), temp_dir.path(), run_at())
            .await
            .unwrap();

        let long = std::fs::read_to_string(&artifacts.long).unwrap();
        assert_eq!(long, "## 00:00:01 Intro\n- a\n\n## 00:05:00 Main\n- b\n\n");

        let short = std::fs::read_to_string(artifacts.short.unwrap()).unwrap();
        assert_eq!(short, "- a\n\n- b");

        let unified = std::fs::read_to_string(artifacts.unified.unwrap()).unwrap();
        assert_eq!(unified, "- overall");
    }

    #[tokio::test]
    async fn long_only_run_writes_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let artifacts = write_artifacts(&summary(None), temp_dir.path(), run_at())
            .await
            .unwrap();

        assert!(artifacts.long.exists());
        assert_eq!(artifacts.short, None);
        assert_eq!(artifacts.unified, None);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_files() {
        let temp_dir = TempDir::new().unwrap();
        let paths = artifact_paths(temp_dir.path(), "Lex/Fridman", run_at());
        std::fs::create_dir(paths.unified.as_ref().unwrap()).unwrap();

        let result = write_artifacts(&summary(Some("- overall")), temp_dir.path(), run_at()).await;

        assert!(result.is_err());
        assert!(!paths.long.exists());
        assert!(!paths.short.unwrap().exists());
    }
}
