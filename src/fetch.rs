use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use url::Url;

use crate::error::IdmapError;

pub const DEFAULT_SOURCE_URL: &str =
    "https://ftp.ebi.ac.uk/pub/databases/rhea/tsv/rhea2xrefs.tsv";

/// First column of the header row in `rhea2xrefs.tsv`.
pub const HEADER_SENTINEL: &str = "RHEA_ID";

const EBI_FTP_HOST: &str = "ftp.ebi.ac.uk";

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StageStats {
    pub kept: usize,
    pub skipped: usize,
}

/// Somewhere a fresh copy of the mapping file can be pulled from.
pub trait MappingSource {
    fn download(&self, destination: &Path) -> Result<StageStats, IdmapError>;
    fn describe(&self) -> String;
}

#[derive(Clone)]
pub struct RheaHttpClient {
    client: Client,
    url: Url,
}

impl RheaHttpClient {
    pub fn new(url: &str) -> Result<Self, IdmapError> {
        let url = resolve_source_url(url)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("rhea-idmap/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IdmapError::SourceHttp(err.to_string()))?,
        );
        // No overall timeout: the payload is large and a slow mirror is not an error.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .map_err(|err| IdmapError::SourceHttp(err.to_string()))?;
        Ok(Self { client, url })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, IdmapError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "mapping download failed".to_string());
        Err(IdmapError::SourceStatus { status, message })
    }
}

impl MappingSource for RheaHttpClient {
    fn download(&self, destination: &Path) -> Result<StageStats, IdmapError> {
        tracing::info!(url = %self.url, "downloading mapping file");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .map_err(|err| IdmapError::SourceHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        stage_to_file(response, destination)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Parse a source URL. EBI publishes the same tree over FTP and HTTPS, so
/// `ftp://ftp.ebi.ac.uk/...` is served from the HTTPS side.
pub fn resolve_source_url(raw: &str) -> Result<Url, IdmapError> {
    let url = Url::parse(raw).map_err(|err| IdmapError::UnsupportedUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        "ftp" if url.host_str() == Some(EBI_FTP_HOST) => {
            let mirrored = format!("https://{EBI_FTP_HOST}{}", url.path());
            Url::parse(&mirrored).map_err(|err| IdmapError::UnsupportedUrl {
                url: raw.to_string(),
                reason: err.to_string(),
            })
        }
        scheme => Err(IdmapError::UnsupportedUrl {
            url: raw.to_string(),
            reason: format!("scheme {scheme} is not supported"),
        }),
    }
}

fn is_discarded(line: &str) -> bool {
    if line.trim().is_empty() || line.starts_with('#') {
        return true;
    }
    line.split('\t').next() == Some(HEADER_SENTINEL)
}

/// Copy `reader` to `writer` line by line, dropping header, comment and
/// blank lines. Every kept line ends with `\n`.
pub fn stage_lines<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
) -> Result<StageStats, IdmapError> {
    let mut stats = StageStats::default();
    for line in reader.lines() {
        let line = line.map_err(|err| IdmapError::SourceHttp(err.to_string()))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if is_discarded(line) {
            stats.skipped += 1;
            continue;
        }
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|err| IdmapError::Filesystem(err.to_string()))?;
        stats.kept += 1;
    }
    writer
        .flush()
        .map_err(|err| IdmapError::Filesystem(err.to_string()))?;
    Ok(stats)
}

/// Stage `reader` into `destination`, replacing whatever was there.
pub fn stage_to_file<R: Read>(reader: R, destination: &Path) -> Result<StageStats, IdmapError> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| IdmapError::Filesystem(err.to_string()))?;

    let temp = tempfile::Builder::new()
        .prefix("rhea-idmap-stage")
        .tempfile_in(parent)
        .map_err(|err| IdmapError::Filesystem(err.to_string()))?;
    let stats = stage_lines(BufReader::new(reader), BufWriter::new(temp.as_file()))?;

    if destination.exists() {
        fs::remove_file(destination).map_err(|err| {
            IdmapError::Filesystem(format!("remove {}: {err}", destination.display()))
        })?;
    }
    temp.persist(destination)
        .map_err(|err| IdmapError::Filesystem(err.to_string()))?;

    tracing::info!(
        kept = stats.kept,
        skipped = stats.skipped,
        path = %destination.display(),
        "mapping file staged"
    );
    Ok(stats)
}
