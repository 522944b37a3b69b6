//! Full-text search over note titles, tags and content.

use super::{IndexResult, open_database};
use crate::domain::Note;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        path TEXT PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS terms (
        path TEXT NOT NULL,
        field TEXT NOT NULL,
        token TEXT NOT NULL,
        occurrences INTEGER NOT NULL,
        PRIMARY KEY (path, field, token)
    );
    CREATE INDEX IF NOT EXISTS idx_terms_token ON terms(token);
";

/// Weighted match total per document. Title matches weigh 3, tag matches 2
/// and content matches 1.
const SCORE_QUERY: &str = "
    SELECT path,
           SUM(occurrences * CASE field WHEN 'title' THEN 3 WHEN 'tags' THEN 2 ELSE 1 END)
    FROM terms
    WHERE instr(token, ?1) > 0
    GROUP BY path
";

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub score: u64,
}

/// Splits text into lower-case alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Persisted inverted index of note documents.
pub struct SearchIndex {
    conn: Connection,
}

impl SearchIndex {
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

    /// Replaces the document for `note.path()`.
    pub fn update_note(&mut self, note: &Note) -> IndexResult<()> {
        let tx = self.conn.transaction()?;
        delete_document(&tx, note.path())?;
        insert_document(&tx, note)?;
        tx.commit()?;
        Ok(())
    }

    /// Removes a document. Returns `false` if none was indexed.
    pub fn remove_note(&mut self, path: &str) -> IndexResult<bool> {
        let tx = self.conn.transaction()?;
        let removed = delete_document(&tx, path)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Finds documents where any query token is a substring of an indexed
    /// token, ranked by weighted match count, ties broken by path.
    pub fn search(&self, query: &str) -> IndexResult<Vec<SearchHit>> {
        let tokens: BTreeSet<String> = tokenize(query).into_iter().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<String, u64> = HashMap::new();
        let mut stmt = self.conn.prepare_cached(SCORE_QUERY)?;
        for token in &tokens {
            let rows = stmt.query_map([token], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (path, score) = row?;
                *scores.entry(path).or_default() += score.max(0) as u64;
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .map(|(path, score)| SearchHit { path, score })
            .collect();
        hits.sort_by(|a, b| (Reverse(a.score), &a.path).cmp(&(Reverse(b.score), &b.path)));
        Ok(hits)
    }

    /// Replaces the whole index with `notes`. Returns the number indexed.
    pub fn rebuild<'a>(&mut self, notes: impl IntoIterator<Item = &'a Note>) -> IndexResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM terms; DELETE FROM documents;")?;
        let mut count = 0;
        for note in notes {
            delete_document(&tx, note.path())?;
            insert_document(&tx, note)?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    /// Removes every document.
    pub fn clear(&mut self) -> IndexResult<()> {
        self.conn
            .execute_batch("DELETE FROM terms; DELETE FROM documents;")?;
        Ok(())
    }

    /// Returns the number of indexed documents.
    pub fn document_count(&self) -> IndexResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns true if a document is indexed under `path`.
    pub fn contains(&self, path: &str) -> IndexResult<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE path = ?1)",
            [path],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }
}

fn delete_document(conn: &Connection, path: &str) -> rusqlite::Result<bool> {
    conn.execute("DELETE FROM terms WHERE path = ?1", [path])?;
    Ok(conn.execute("DELETE FROM documents WHERE path = ?1", [path])? > 0)
}

fn insert_document(conn: &Connection, note: &Note) -> rusqlite::Result<()> {
    conn.execute("INSERT INTO documents (path) VALUES (?1)", [note.path()])?;

    let fields = [
        ("title", tokenize(note.title())),
        ("tags", note.tags().iter().flat_map(|t| tokenize(t)).collect()),
        ("content", tokenize(note.content())),
    ];
    let mut stmt = conn.prepare_cached(
        "INSERT INTO terms (path, field, token, occurrences) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (field, tokens) in fields {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token).or_default() += 1;
        }
        for (token, occurrences) in counts {
            stmt.execute(params![note.path(), field, token, occurrences])?;
        }
    }
    Ok(())
}
