//! Line-oriented playlist rewrite (M3U).

use crate::config::PlaylistFormat;
use crate::rewrite::RewriteStats;
use crate::translate::PathTranslator;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const COMMENT_MARKER: char = '#';

/// Rewrite every path line; comments and blank lines pass through verbatim.
/// Line endings are preserved.
pub fn rewrite_playlist(text: &str, translator: &PathTranslator) -> (String, RewriteStats) {
    let mut out = String::with_capacity(text.len());
    let mut stats = RewriteStats::default();

    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];

        if body.starts_with(COMMENT_MARKER) || body.trim().is_empty() {
            stats.passed_through += 1;
            out.push_str(line);
            continue;
        }

        let result = translator.translate(body);
        stats.record(&result);
        out.push_str(result.value());
        out.push_str(ending);
    }

    (out, stats)
}

/// Rewrite `src` into `out_dir`, keeping the file name.
pub fn rewrite_playlist_file(
    src: &Path,
    out_dir: &Path,
    translator: &PathTranslator,
) -> Result<(PathBuf, RewriteStats)> {
    let file_name = src
        .file_name()
        .with_context(|| format!("Not a playlist file: {}", src.display()))?;
    let text =
        fs::read_to_string(src).with_context(|| format!("Cannot read {}", src.display()))?;

    let (out, stats) = rewrite_playlist(&text, translator);
    let dst = out_dir.join(file_name);
    fs::write(&dst, out).with_context(|| format!("Cannot write {}", dst.display()))?;
    Ok((dst, stats))
}

/// Playlist files directly inside `dir` with the format's extension, sorted.
pub fn discover_playlists(dir: &Path, format: PlaylistFormat) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == format.extension()) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::BasePathSet;
    use tempfile::TempDir;

    fn translator() -> PathTranslator {
        PathTranslator::new(BasePathSet::new(["/home/u"]).unwrap(), "/srv/media")
    }

    #[test]
    fn test_rewrite_lines() {
        let text = "#EXTM3U\n#EXTINF:215,Artist - Song\n/home/u/Music/song.mp3\n\nhttp://radio/stream\r\n/home/u/Podcasts/ep.ogg";
        let (out, stats) = rewrite_playlist(text, &translator());
        assert_eq!(
            out,
            "#EXTM3U\n#EXTINF:215,Artist - Song\n/srv/media/Music/song.mp3\n\nhttp://radio/stream\r\n/srv/media/Podcasts/ep.ogg"
        );
        assert_eq!(
            stats,
            RewriteStats {
                rewritten: 2,
                unmatched: 1,
                passed_through: 3
            }
        );
    }

    #[test]
    fn test_comment_containing_base_is_not_rewritten() {
        let (out, _) = rewrite_playlist("#EXTINF:1,/home/u/x\n", &translator());
        assert_eq!(out, "#EXTINF:1,/home/u/x\n");
    }

    #[test]
    fn test_rewrite_file_keeps_source() -> Result<()> {
        let dir = TempDir::new()?;
        let out_dir = dir.path().join("rewritten");
        fs::create_dir(&out_dir)?;
        let src = dir.path().join("Road Trip.m3u");
        fs::write(&src, "#EXTM3U\n/home/u/Music/a.mp3\n")?;

        let (dst, stats) = rewrite_playlist_file(&src, &out_dir, &translator())?;
        assert_eq!(dst, out_dir.join("Road Trip.m3u"));
        assert_eq!(fs::read_to_string(&dst)?, "#EXTM3U\n/srv/media/Music/a.mp3\n");
        assert_eq!(fs::read_to_string(&src)?, "#EXTM3U\n/home/u/Music/a.mp3\n");
        assert_eq!(stats.rewritten, 1);
        Ok(())
    }

    #[test]
    fn test_discover_only_matching_extension() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b.m3u"), "")?;
        fs::write(dir.path().join("a.m3u"), "")?;
        fs::write(dir.path().join("rhythmdb.xml"), "")?;
        fs::create_dir(dir.path().join("rewritten"))?;

        let found = discover_playlists(dir.path(), PlaylistFormat::M3u)?;
        assert_eq!(found, vec![dir.path().join("a.m3u"), dir.path().join("b.m3u")]);
        Ok(())
    }
}
