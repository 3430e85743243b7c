//! Declarative movie filter compiler.
//!
//! Clients pass an ordered JSON array of `{field, value}` descriptors in a
//! single query parameter. Descriptors compile into a conjunctive
//! [`CompiledQuery`]: every clause must hold. Unknown fields are ignored so
//! newer clients can send filters older servers do not understand yet.
//!
//! The `genres` filter needs a secondary lookup: names are resolved to
//! numeric ids through [`GenreResolver`] before the containment clause can be
//! built. Names that resolve to nothing are dropped; if none resolve the
//! clause is a containment test over the empty set, which every movie
//! satisfies, so the filter degrades to "no genre constraint" rather than
//! "no results".

use serde::Deserialize;
use thiserror::Error;

use crate::application::repos::{GenreResolver, RepoError};
use crate::domain::movies::MovieRecord;

/// One `{field, value}` filter descriptor as received on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterDescriptor {
    pub field: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("malformed filter payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// The finite set of filter kinds the compiler understands. Anything else is
/// `Unrecognized` and compiles to no clause at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    Title,
    Genres,
    MinRating,
    Unrecognized,
}

impl FilterKind {
    fn from_field(field: &str) -> Self {
        match field {
            "title" => Self::Title,
            "genres" => Self::Genres,
            "minRating" => Self::MinRating,
            _ => Self::Unrecognized,
        }
    }
}

/// One clause of a compiled conjunctive predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Case-insensitive substring match on the title.
    TitleContains(String),
    /// The movie's genre-id set must contain every listed id.
    GenresAll(Vec<i32>),
    /// `average_rating >= value`.
    MinRating(f64),
}

/// Conjunctive predicate over movies, consumed by the persistence layer and
/// evaluable in process for tests and in-memory stores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    clauses: Vec<FilterClause>,
}

impl CompiledQuery {
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the predicate against a movie record.
    pub fn matches(&self, movie: &MovieRecord) -> bool {
        self.clauses.iter().all(|clause| match clause {
            FilterClause::TitleContains(needle) => movie
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            FilterClause::GenresAll(ids) => {
                ids.iter().all(|id| movie.genre_ids.contains(id))
            }
            FilterClause::MinRating(min) => movie.average_rating >= *min,
        })
    }
}

/// Parse the raw `filters` query parameter. Malformed JSON is a client input
/// error, never a server fault.
pub fn parse_descriptors(raw: &str) -> Result<Vec<FilterDescriptor>, FilterError> {
    serde_json::from_str(raw).map_err(|err| FilterError::Malformed(err.to_string()))
}

/// Compile descriptors into a conjunctive predicate.
///
/// Descriptors are folded in order. A `title` or `minRating` descriptor seen
/// again overwrites the earlier clause; `genres` descriptors accumulate ids
/// into the single containment clause. Unrecognized fields add nothing.
pub async fn compile(
    descriptors: &[FilterDescriptor],
    genres: &dyn GenreResolver,
) -> Result<CompiledQuery, FilterError> {
    let mut title: Option<String> = None;
    let mut min_rating: Option<f64> = None;
    let mut genre_ids: Option<Vec<i32>> = None;

    for descriptor in descriptors {
        match FilterKind::from_field(&descriptor.field) {
            FilterKind::Title => match &descriptor.value {
                FilterValue::Text(text) => title = Some(text.clone()),
                other => {
                    return Err(FilterError::Malformed(format!(
                        "`title` expects a string value, got {other:?}"
                    )));
                }
            },
            FilterKind::Genres => {
                let names = match &descriptor.value {
                    FilterValue::Text(name) => vec![name.clone()],
                    FilterValue::List(names) => names.clone(),
                    FilterValue::Number(_) => {
                        return Err(FilterError::Malformed(
                            "`genres` expects a string or array of strings".to_string(),
                        ));
                    }
                };
                let resolved = genres.resolve_names(&names).await?;
                let ids = genre_ids.get_or_insert_with(Vec::new);
                for id in resolved {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
            FilterKind::MinRating => match &descriptor.value {
                FilterValue::Number(value) => min_rating = Some(*value),
                other => {
                    return Err(FilterError::Malformed(format!(
                        "`minRating` expects a number, got {other:?}"
                    )));
                }
            },
            FilterKind::Unrecognized => {}
        }
    }

    let mut clauses = Vec::new();
    if let Some(needle) = title {
        clauses.push(FilterClause::TitleContains(needle));
    }
    if let Some(ids) = genre_ids {
        // May be empty when no name resolved; the clause is then trivially true.
        clauses.push(FilterClause::GenresAll(ids));
    }
    if let Some(min) = min_rating {
        clauses.push(FilterClause::MinRating(min));
    }

    Ok(CompiledQuery { clauses })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::domain::genres::GenreRecord;

    use super::*;

    struct StaticGenres {
        by_name: HashMap<String, i32>,
    }

    impl StaticGenres {
        fn new(pairs: &[(&str, i32)]) -> Self {
            Self {
                by_name: pairs
                    .iter()
                    .map(|(name, id)| (name.to_string(), *id))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl GenreResolver for StaticGenres {
        async fn resolve_names(&self, names: &[String]) -> Result<Vec<i32>, RepoError> {
            Ok(names
                .iter()
                .filter_map(|name| self.by_name.get(name).copied())
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<GenreRecord>, RepoError> {
            Ok(self
                .by_name
                .iter()
                .map(|(name, id)| GenreRecord {
                    id: *id,
                    name: name.clone(),
                })
                .collect())
        }
    }

    fn movie(title: &str, genre_ids: Vec<i32>, average_rating: f64) -> MovieRecord {
        MovieRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            overview: String::new(),
            genre_ids,
            average_rating,
            rate_count: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn descriptors(raw: &str) -> Vec<FilterDescriptor> {
        parse_descriptors(raw).expect("valid descriptors")
    }

    #[tokio::test]
    async fn title_filter_is_case_insensitive_substring() {
        let genres = StaticGenres::new(&[]);
        let query = compile(
            &descriptors(r#"[{"field":"title","value":"venom"}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        assert!(query.matches(&movie("Venom: Let There Be Carnage", vec![], 0.0)));
        assert!(!query.matches(&movie("Spider-Man", vec![], 0.0)));
    }

    #[tokio::test]
    async fn genres_filter_requires_all_resolved_ids() {
        let genres = StaticGenres::new(&[("Action", 1), ("Drama", 3)]);
        let query = compile(
            &descriptors(r#"[{"field":"genres","value":["Action","Drama"]}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        assert_eq!(query.clauses(), &[FilterClause::GenresAll(vec![1, 3])]);
        assert!(!query.matches(&movie("A", vec![1, 2], 0.0)));
        assert!(query.matches(&movie("B", vec![1, 3, 5], 0.0)));
    }

    #[tokio::test]
    async fn single_genre_name_is_accepted_as_scalar() {
        let genres = StaticGenres::new(&[("Action", 1)]);
        let query = compile(
            &descriptors(r#"[{"field":"genres","value":"Action"}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        assert_eq!(query.clauses(), &[FilterClause::GenresAll(vec![1])]);
    }

    #[tokio::test]
    async fn unresolvable_genres_degrade_to_no_constraint() {
        let genres = StaticGenres::new(&[]);
        let query = compile(
            &descriptors(r#"[{"field":"genres","value":["Nope"]}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        // Containment over the empty set holds for every movie.
        assert_eq!(query.clauses(), &[FilterClause::GenresAll(vec![])]);
        assert!(query.matches(&movie("Anything", vec![], 0.0)));
    }

    #[tokio::test]
    async fn min_rating_filter_compares_inclusively() {
        let genres = StaticGenres::new(&[]);
        let query = compile(
            &descriptors(r#"[{"field":"minRating","value":7}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        assert!(query.matches(&movie("A", vec![], 7.0)));
        assert!(!query.matches(&movie("B", vec![], 6.99)));
    }

    #[tokio::test]
    async fn unknown_field_compiles_to_noop() {
        let genres = StaticGenres::new(&[]);
        let query = compile(
            &descriptors(r#"[{"field":"foo","value":"bar"}]"#),
            &genres,
        )
        .await
        .expect("compiles");

        assert!(query.is_empty());
        assert_eq!(query, compile(&[], &genres).await.expect("empty compiles"));
    }

    #[tokio::test]
    async fn repeated_scalar_fields_overwrite_and_genres_accumulate() {
        let genres = StaticGenres::new(&[("Action", 1), ("Drama", 3)]);
        let query = compile(
            &descriptors(
                r#"[
                    {"field":"title","value":"first"},
                    {"field":"genres","value":"Action"},
                    {"field":"title","value":"second"},
                    {"field":"genres","value":["Drama"]}
                ]"#,
            ),
            &genres,
        )
        .await
        .expect("compiles");

        assert_eq!(
            query.clauses(),
            &[
                FilterClause::TitleContains("second".to_string()),
                FilterClause::GenresAll(vec![1, 3]),
            ]
        );
    }

    #[test]
    fn malformed_json_is_a_client_error() {
        assert!(matches!(
            parse_descriptors("not json"),
            Err(FilterError::Malformed(_))
        ));
        // Missing `field` is structurally malformed.
        assert!(matches!(
            parse_descriptors(r#"[{"value":"x"}]"#),
            Err(FilterError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn wrong_value_type_for_known_field_is_rejected() {
        let genres = StaticGenres::new(&[]);
        let err = compile(
            &descriptors(r#"[{"field":"minRating","value":"high"}]"#),
            &genres,
        )
        .await
        .expect_err("must fail");
        assert!(matches!(err, FilterError::Malformed(_)));
    }
}
