use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::model::OutcomeLine;

/// Sequential reader for the persisted outcome log. Unparseable lines (e.g.
/// a torn tail from a crashed writer) are skipped, not fatal.
pub fn read_all(path: &Path) -> io::Result<Vec<OutcomeLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(reader
        .lines()
        .filter_map(|line| {
            line.ok()
                .and_then(|raw| serde_json::from_str::<OutcomeLine>(&raw).ok())
        })
        .collect())
}
