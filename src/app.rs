use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::error::IdmapError;
use crate::fetch::{MappingSource, StageStats};
use crate::loader::{LoadStats, Loader};
use crate::mapdb::MappingDb;

pub const BUILD_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub database: Utf8PathBuf,
    pub config: ResolvedConfig,
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub database: String,
    pub staging_path: String,
    pub build_date: String,
    pub emission: String,
    pub downloaded: bool,
    pub stage: Option<StageStats>,
    pub load: LoadStats,
    pub entities: usize,
    pub links: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => tracing::info!("{}", event.message),
        }
    }
}

pub struct App<S: MappingSource> {
    source: S,
}

impl<S: MappingSource> App<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn build(
        &self,
        request: &BuildRequest,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, IdmapError> {
        let config = &request.config;

        sink.event(ProgressEvent {
            message: format!("phase=Schema; creating {}", request.database),
            elapsed: None,
        });
        let mut db = MappingDb::create(request.database.as_std_path())?;
        db.create_schema()?;

        let build_date = chrono::Local::now().format(BUILD_DATE_FORMAT).to_string();
        db.set_info("BUILDDATE", &build_date)?;
        db.set_info("DATASOURCENAME", &config.metadata.datasource_name)?;
        db.set_info("DATASOURCEVERSION", &config.metadata.datasource_version)?;
        db.set_info("SERIES", &config.metadata.series)?;
        db.set_info("DATATYPE", &config.metadata.datatype)?;

        let stage = if request.offline {
            sink.event(ProgressEvent {
                message: "phase=Fetch; offline, reusing staged file".to_string(),
                elapsed: None,
            });
            None
        } else {
            self.fetch(config, sink)
        };

        let staged = config.staging_path.as_std_path();
        if !staged.exists() {
            return Err(IdmapError::StagedFileMissing(staged.to_path_buf()));
        }
        let file = File::open(staged).map_err(|err| {
            IdmapError::Filesystem(format!("open {}: {err}", config.staging_path))
        })?;

        sink.event(ProgressEvent {
            message: format!("phase=Load; emission={}", config.emission),
            elapsed: None,
        });
        let start = Instant::now();
        let load = Loader::new(config.emission).load(BufReader::new(file), &mut db)?;
        sink.event(ProgressEvent {
            message: format!("loaded {} lines into {} groups", load.lines, load.groups),
            elapsed: Some(start.elapsed()),
        });

        db.commit()?;
        let entities = db.entity_count()?;
        let links = db.link_count()?;

        sink.event(ProgressEvent {
            message: "phase=Finalize; compacting and closing database".to_string(),
            elapsed: None,
        });
        db.finalize()?;

        Ok(BuildResult {
            database: request.database.to_string(),
            staging_path: config.staging_path.to_string(),
            build_date,
            emission: config.emission.to_string(),
            downloaded: stage.is_some(),
            stage,
            load,
            entities,
            links,
        })
    }

    /// A failed download is logged and swallowed; the build carries on with
    /// whatever staged file is already on disk.
    fn fetch(&self, config: &ResolvedConfig, sink: &dyn ProgressSink) -> Option<StageStats> {
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {}", self.source.describe()),
            elapsed: None,
        });
        let start = Instant::now();
        match self.source.download(config.staging_path.as_std_path()) {
            Ok(stats) => {
                sink.event(ProgressEvent {
                    message: format!("mapping downloaded, {} lines staged", stats.kept),
                    elapsed: Some(start.elapsed()),
                });
                Some(stats)
            }
            Err(err) => {
                tracing::error!("mapping download failed: {err}");
                None
            }
        }
    }
}
