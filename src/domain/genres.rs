use serde::Serialize;

/// A genre from the catalog taxonomy. Ids are the upstream numeric ids
/// referenced by `MovieRecord::genre_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreRecord {
    pub id: i32,
    pub name: String,
}
