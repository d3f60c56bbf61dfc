//! Bookkeeping for the timestamped chart images in the chart directory.
//!
//! Charts are never overwritten. Each one is named
//! `daily_revenue_<YYYYMMDD>_<HHMMSS>.png`, with a `_<n>` suffix when more
//! than one chart is produced within the same second. The creation time is
//! read back from the name, so selecting the newest chart does not depend on
//! filesystem timestamps.

use chrono::{NaiveDateTime, Timelike};
use salesflow_common::{PipelineError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const CHART_PREFIX: &str = "daily_revenue_";
const CHART_EXTENSION: &str = ".png";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// A chart image on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub path: PathBuf,
    pub generated_at: NaiveDateTime,
    pub sequence: u32,
}

impl ChartArtifact {
    /// File name of the chart
    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    }

    /// Parse a chart file name; `None` for anything that is not a chart
    pub fn parse(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_prefix(CHART_PREFIX)?.strip_suffix(CHART_EXTENSION)?;
        let timestamp = stem.get(..TIMESTAMP_LEN)?;
        let generated_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;

        let sequence = match &stem[TIMESTAMP_LEN..] {
            "" => 0,
            suffix => {
                let digits = suffix.strip_prefix('_')?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                digits.parse::<u32>().ok().filter(|n| *n > 0)?
            }
        };

        Some(Self {
            path: path.to_path_buf(),
            generated_at,
            sequence,
        })
    }

    fn sort_key(&self) -> (NaiveDateTime, u32, &str) {
        (self.generated_at, self.sequence, self.file_name())
    }
}

/// File name for a chart generated at `at` with the given same-second sequence
pub fn chart_file_name(at: NaiveDateTime, sequence: u32) -> String {
    let timestamp = at.format(TIMESTAMP_FORMAT);
    if sequence == 0 {
        format!("{CHART_PREFIX}{timestamp}{CHART_EXTENSION}")
    } else {
        format!("{CHART_PREFIX}{timestamp}_{sequence}{CHART_EXTENSION}")
    }
}

/// Chart directory view: allocates new chart paths and finds the latest one
#[derive(Debug, Clone)]
pub struct ChartRegistry {
    dir: PathBuf,
}

impl ChartRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reserve an unused chart path for a chart generated at `at`.
    ///
    /// The file is created empty so a concurrent allocation in the same
    /// second cannot be handed the same name; the caller overwrites it with
    /// the rendered image or removes it via [`ChartRegistry::discard`].
    pub async fn allocate(&self, at: NaiveDateTime) -> Result<ChartArtifact> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PipelineError::with_source(format!("Failed to create chart directory {}", self.dir.display()), e)
        })?;

        let generated_at = at.with_nanosecond(0).unwrap_or(at);
        let mut sequence = 0u32;
        loop {
            let path = self.dir.join(chart_file_name(generated_at, sequence));
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => {
                    debug!("Allocated chart path {}", path.display());
                    return Ok(ChartArtifact {
                        path,
                        generated_at,
                        sequence,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    sequence = sequence.checked_add(1).ok_or_else(|| {
                        PipelineError::graph(format!("Exhausted chart names for {generated_at}"))
                    })?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove a reserved chart whose rendering failed
    pub async fn discard(&self, artifact: &ChartArtifact) {
        if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
            debug!("Could not remove {}: {}", artifact.path.display(), e);
        }
    }

    /// Every chart in the directory, oldest first. A missing directory is empty.
    pub async fn list(&self) -> Result<Vec<ChartArtifact>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut charts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(chart) = ChartArtifact::parse(&entry.path()) {
                charts.push(chart);
            }
        }

        charts.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(charts)
    }

    /// The most recently generated chart, if any
    pub async fn latest(&self) -> Result<Option<ChartArtifact>> {
        Ok(self.list().await?.pop())
    }
}
