use std::io::{self, Write};

use serde::Serialize;

use crate::app::BuildResult;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Summary,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn print_summary(result: &BuildResult) {
    println!("Interaction mapping database: {}", result.database);
    println!("  build date:   {}", result.build_date);
    match &result.stage {
        Some(stage) => println!(
            "  download:     {} lines staged, {} skipped",
            stage.kept, stage.skipped
        ),
        None => println!("  download:     skipped, reused {}", result.staging_path),
    }
    println!(
        "  loaded:       {} lines, {} groups, {} xrefs ({} unknown tags)",
        result.load.lines, result.load.groups, result.load.xrefs, result.load.ignored
    );
    println!(
        "  database:     {} entities, {} links (emission={})",
        result.entities, result.links, result.emission
    );
}
