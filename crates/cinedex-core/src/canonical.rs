//! Canonical searchable text and index metadata for a movie.
//!
//! The same text is embedded at index time and stored as the entry's
//! document, so re-indexing an unchanged movie always produces the same
//! entry.

use cinedex_db::vector::EntryMetadata;

use crate::types::MovieFields;

/// Build the text that represents a movie in the vector index.
///
/// Labels are always present, even when the value is empty, and appear in
/// the order title, director, actors, description. The year is not part of
/// the text.
pub fn canonical_text(fields: &MovieFields) -> String {
    [
        format!("Title: {}", fields.title),
        format!("Director: {}", fields.director),
        format!("Actors: {}", fields.actors),
        format!("Description: {}", fields.description),
    ]
    .join(" ")
}

/// Flat metadata stored next to an index entry: the id plus every field.
///
/// Display and debugging only; the record store stays authoritative.
pub fn entry_metadata(id: i64, fields: &MovieFields) -> EntryMetadata {
    let mut metadata = EntryMetadata::new();
    metadata.insert("id".to_string(), id.to_string());
    metadata.insert("title".to_string(), fields.title.clone());
    metadata.insert("year".to_string(), fields.year.clone());
    metadata.insert("director".to_string(), fields.director.clone());
    metadata.insert("actors".to_string(), fields.actors.clone());
    metadata.insert("description".to_string(), fields.description.clone());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_text_full() {
        let fields = MovieFields::new("Inception", "2010")
            .with_director("Christopher Nolan")
            .with_actors("Leonardo DiCaprio")
            .with_description("A thief enters dreams.");

        assert_eq!(
            canonical_text(&fields),
            "Title: Inception Director: Christopher Nolan Actors: Leonardo DiCaprio Description: A thief enters dreams."
        );
    }

    #[test]
    fn test_canonical_text_keeps_empty_labels() {
        let fields = MovieFields::new("Alien", "1979");
        assert_eq!(
            canonical_text(&fields),
            "Title: Alien Director:  Actors:  Description: "
        );
    }

    #[test]
    fn test_canonical_text_is_deterministic() {
        let fields = MovieFields::new("Heat", "1995").with_director("Michael Mann");
        assert_eq!(canonical_text(&fields), canonical_text(&fields.clone()));
    }

    #[test]
    fn test_entry_metadata() {
        let metadata = entry_metadata(42, &MovieFields::new("Heat", "1995"));
        assert_eq!(metadata.len(), 6);
        assert_eq!(metadata["id"], "42");
        assert_eq!(metadata["year"], "1995");
        assert_eq!(metadata["actors"], "");
    }
}
