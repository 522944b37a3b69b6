//! Directed link graph between notes, queried from the target side.

use super::{IndexResult, open_database};
use crate::domain::{BacklinkInfo, WikiLink};
use rusqlite::{Connection, params};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS links (
        source TEXT NOT NULL,
        target TEXT NOT NULL,
        line INTEGER NOT NULL,
        PRIMARY KEY (source, target, line)
    );
    CREATE INDEX IF NOT EXISTS idx_links_target ON links(target);
";

/// Persisted edges `(source, target, line)`.
///
/// Edges belong to their source: updating or removing a source never
/// touches edges that point at it, so links to a deleted note remain as
/// broken links until the linking note changes.
pub struct BacklinksIndex {
    conn: Connection,
}

impl BacklinksIndex {
    /// Opens or creates the index at `path`. A missing file is an empty index.
    pub fn open(path: &Path) -> IndexResult<Self> {
        Ok(Self {
            conn: open_database(path, SCHEMA)?,
        })
    }

    /// Opens a throwaway in-memory index.
    pub fn open_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Replaces all outgoing edges of `source` with `links`.
    pub fn update_note_links(&mut self, source: &str, links: &[WikiLink]) -> IndexResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM links WHERE source = ?1", [source])?;
        insert_links(&tx, source, links)?;
        tx.commit()?;
        Ok(())
    }

    /// Returns one entry per source linking to `target`, sorted by source.
    pub fn get_backlinks(&self, target: &str) -> IndexResult<Vec<BacklinkInfo>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source, line FROM links WHERE target = ?1 ORDER BY source, line",
        )?;
        let rows = stmt.query_map([target], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut grouped: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for row in rows {
            let (source, line) = row?;
            grouped.entry(source).or_default().push(line as usize);
        }
        Ok(grouped
            .into_iter()
            .map(|(source, lines)| BacklinkInfo::new(source, lines))
            .collect())
    }

    /// Returns the distinct targets linked from `source`, sorted.
    pub fn get_outgoing(&self, source: &str) -> IndexResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT target FROM links WHERE source = ?1 ORDER BY target")?;
        let targets = stmt
            .query_map([source], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(targets)
    }

    /// Drops the outgoing edges of `source`. Incoming edges are kept.
    pub fn remove_note(&mut self, source: &str) -> IndexResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM links WHERE source = ?1", [source])?)
    }

    /// Points every edge aimed at `old` to `new`. Returns the number of
    /// edges relabeled; zero when nothing linked to `old`.
    pub fn rename_target(&mut self, old: &str, new: &str) -> IndexResult<usize> {
        if old == new {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let moved = tx.execute(
            "UPDATE OR IGNORE links SET target = ?2 WHERE target = ?1",
            params![old, new],
        )?;
        // Edges that already existed under `new` were ignored above.
        let merged = tx.execute("DELETE FROM links WHERE target = ?1", [old])?;
        tx.commit()?;
        Ok(moved + merged)
    }

    /// Replaces the whole graph. Returns the number of sources indexed.
    pub fn rebuild<'a, I>(&mut self, notes: I) -> IndexResult<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a [WikiLink])>,
    {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM links", [])?;
        let mut count = 0;
        for (source, links) in notes {
            tx.execute("DELETE FROM links WHERE source = ?1", [source])?;
            insert_links(&tx, source, links)?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    /// Removes every edge.
    pub fn clear(&mut self) -> IndexResult<()> {
        self.conn.execute("DELETE FROM links", [])?;
        Ok(())
    }

    /// Lists `(source, target)` pairs whose target is not in `existing`,
    /// sorted by source then target.
    pub fn broken_links(&self, existing: &HashSet<String>) -> IndexResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT source, target FROM links ORDER BY source, target")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut broken = Vec::new();
        for row in rows {
            let (source, target) = row?;
            if !existing.contains(&target) {
                broken.push((source, target));
            }
        }
        Ok(broken)
    }

    /// Returns the total number of edges.
    pub fn edge_count(&self) -> IndexResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn insert_links(conn: &Connection, source: &str, links: &[WikiLink]) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO links (source, target, line) VALUES (?1, ?2, ?3)")?;
    for link in links {
        stmt.execute(params![source, link.target_path, link.line_number as i64])?;
    }
    Ok(())
}
