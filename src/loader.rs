use std::io::BufRead;

use serde::Serialize;

use crate::domain::{EmissionMode, Xref, lookup_tag};
use crate::error::IdmapError;
use crate::mapdb::MappingSink;

/// Columns of a staged `rhea2xrefs` line the loader cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRow {
    pub key: String,
    pub identifier: String,
    pub tag: String,
}

/// Split a staged line into its key (column 0), identifier (column 3) and
/// namespace tag (column 4). `line_no` is 1-based and only used for errors.
pub fn parse_line(line_no: usize, line: &str) -> Result<MappingRow, IdmapError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let columns = line.split('\t').collect::<Vec<_>>();
    if columns.len() < 5 {
        return Err(IdmapError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        });
    }
    Ok(MappingRow {
        key: columns[0].to_string(),
        identifier: columns[3].to_string(),
        tag: columns[4].to_string(),
    })
}

/// Cross-references collected for one run of lines sharing a key. The
/// primary is always the first member.
#[derive(Debug, Clone)]
pub struct Group {
    key: String,
    primary: Xref,
    members: Vec<Xref>,
}

impl Group {
    fn start(key: &str) -> Self {
        let primary = Xref::rhea(key);
        Self {
            key: key.to_string(),
            members: vec![primary.clone()],
            primary,
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }

    pub fn primary(&self) -> &Xref {
        &self.primary
    }

    pub fn members(&self) -> &[Xref] {
        &self.members
    }
}

/// Loader state between rows: `None` before the first line, otherwise the
/// group the last line belonged to.
pub type GroupState = Option<Group>;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LoadStats {
    pub lines: usize,
    pub groups: usize,
    pub xrefs: usize,
    pub ignored: usize,
    pub entity_calls: usize,
    pub link_calls: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Loader {
    mode: EmissionMode,
}

impl Loader {
    pub fn new(mode: EmissionMode) -> Self {
        Self { mode }
    }

    /// Read every line of `reader` and write the resulting entities and
    /// links into `sink`. Stops at the first malformed line.
    pub fn load<R: BufRead>(
        &self,
        reader: R,
        sink: &mut dyn MappingSink,
    ) -> Result<LoadStats, IdmapError> {
        let mut stats = LoadStats::default();
        let mut state: GroupState = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| IdmapError::Filesystem(err.to_string()))?;
            let row = parse_line(index + 1, &line)?;
            state = Some(self.step(state, row, sink, &mut stats)?);
        }

        tracing::info!(
            lines = stats.lines,
            groups = stats.groups,
            xrefs = stats.xrefs,
            ignored = stats.ignored,
            "finished loading mapping file"
        );
        Ok(stats)
    }

    /// Fold one row into the current group and emit what the emission mode
    /// asks for. Returns the group that is current after the row.
    pub fn step(
        &self,
        state: GroupState,
        row: MappingRow,
        sink: &mut dyn MappingSink,
        stats: &mut LoadStats,
    ) -> Result<Group, IdmapError> {
        stats.lines += 1;

        let (mut group, started) = match state {
            Some(group) if group.matches(&row.key) => (group, false),
            _ => {
                tracing::debug!("{} added", row.key);
                stats.groups += 1;
                (Group::start(&row.key), true)
            }
        };

        let added = match lookup_tag(&row.tag) {
            Some(source) => {
                let xref = Xref::new(row.identifier, source);
                group.members.push(xref.clone());
                stats.xrefs += 1;
                Some(xref)
            }
            None => {
                tracing::trace!(tag = %row.tag, key = %row.key, "ignoring unknown namespace tag");
                stats.ignored += 1;
                None
            }
        };

        match self.mode {
            EmissionMode::PerLine => {
                let primary = group.primary.clone();
                emit_entity(sink, stats, &primary)?;
                emit_link(sink, stats, &primary, &primary)?;
                for member in &group.members {
                    emit_entity(sink, stats, member)?;
                    emit_link(sink, stats, &primary, member)?;
                }
            }
            EmissionMode::Once => {
                if started {
                    emit_entity(sink, stats, &group.primary)?;
                    emit_link(sink, stats, &group.primary, &group.primary)?;
                }
                if let Some(xref) = added {
                    emit_entity(sink, stats, &xref)?;
                    emit_link(sink, stats, &group.primary, &xref)?;
                }
            }
        }

        Ok(group)
    }
}

fn emit_entity(
    sink: &mut dyn MappingSink,
    stats: &mut LoadStats,
    xref: &Xref,
) -> Result<(), IdmapError> {
    stats.entity_calls += 1;
    sink.add_entity(xref)
}

fn emit_link(
    sink: &mut dyn MappingSink,
    stats: &mut LoadStats,
    left: &Xref,
    right: &Xref,
) -> Result<(), IdmapError> {
    stats.link_calls += 1;
    sink.add_link(left, right)
}
