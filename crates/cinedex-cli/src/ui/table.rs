//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `cinedex list`, `cinedex search-text` | `render_movies_table()` |
//! | `cinedex search` | `render_search_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use cinedex_core::{Movie, ScoredMovie};

use super::format::truncate_str;

const TITLE_WIDTH: usize = 32;
const DIRECTOR_WIDTH: usize = 22;

/// Columns left for the description once the fixed columns are laid out.
fn description_width(terminal_width: usize, fixed: usize) -> usize {
    terminal_width.saturating_sub(fixed).max(16)
}

fn new_table(headers: Vec<Cell>, constraints: Vec<ColumnConstraint>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(headers);
    table.set_constraints(constraints);
    table
}

/// Render movies as `ID TITLE YEAR DIRECTOR DESCRIPTION`.
///
/// # Example Output
///
/// ```text
/// ID  TITLE      YEAR  DIRECTOR           DESCRIPTION
///  1  Alien      1979  Ridley Scott       The crew of a space freighter...
///  2  Inception  2010  Christopher Nolan  A thief who steals corporate...
/// ```
pub fn render_movies_table(movies: &[Movie], terminal_width: usize) -> String {
    if movies.is_empty() {
        return String::new();
    }

    let mut table = new_table(
        vec![
            Cell::new("ID").set_alignment(CellAlignment::Right),
            Cell::new("TITLE"),
            Cell::new("YEAR"),
            Cell::new("DIRECTOR"),
            Cell::new("DESCRIPTION"),
        ],
        vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(3)), // ID
            ColumnConstraint::LowerBoundary(Width::Fixed(8)), // TITLE
            ColumnConstraint::LowerBoundary(Width::Fixed(4)), // YEAR
            ColumnConstraint::LowerBoundary(Width::Fixed(8)), // DIRECTOR
        ],
    );

    let description = description_width(terminal_width, TITLE_WIDTH + DIRECTOR_WIDTH + 20);
    for movie in movies {
        table.add_row(vec![
            Cell::new(movie.id).set_alignment(CellAlignment::Right),
            Cell::new(truncate_str(&movie.fields.title, TITLE_WIDTH)),
            Cell::new(&movie.fields.year),
            Cell::new(truncate_str(&movie.fields.director, DIRECTOR_WIDTH)),
            Cell::new(truncate_str(&movie.fields.description, description)),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render semantic hits as `SIMILARITY ID TITLE YEAR DIRECTOR`, in the order given.
///
/// # Example Output
///
/// ```text
/// SIMILARITY  ID  TITLE      YEAR  DIRECTOR
///      0.812   2  Inception  2010  Christopher Nolan
///      0.344   1  Alien      1979  Ridley Scott
/// ```
pub fn render_search_table(hits: &[ScoredMovie]) -> String {
    if hits.is_empty() {
        return String::new();
    }

    let mut table = new_table(
        vec![
            Cell::new("SIMILARITY").set_alignment(CellAlignment::Right),
            Cell::new("ID").set_alignment(CellAlignment::Right),
            Cell::new("TITLE"),
            Cell::new("YEAR"),
            Cell::new("DIRECTOR"),
        ],
        vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(10)), // SIMILARITY
            ColumnConstraint::LowerBoundary(Width::Fixed(3)),  // ID
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),  // TITLE
            ColumnConstraint::LowerBoundary(Width::Fixed(4)),  // YEAR
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),  // DIRECTOR
        ],
    );

    for hit in hits {
        table.add_row(vec![
            Cell::new(format!("{:.3}", hit.similarity)).set_alignment(CellAlignment::Right),
            Cell::new(hit.movie.id).set_alignment(CellAlignment::Right),
            Cell::new(truncate_str(&hit.movie.fields.title, TITLE_WIDTH)),
            Cell::new(&hit.movie.fields.year),
            Cell::new(truncate_str(&hit.movie.fields.director, DIRECTOR_WIDTH)),
        ]);
    }

    table.trim_fmt().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_core::MovieFields;

    fn movie(id: i64, title: &str, director: &str) -> Movie {
        Movie {
            id,
            fields: MovieFields::new(title, "2010")
                .with_director(director)
                .with_description("A thief who steals corporate secrets"),
        }
    }

    #[test]
    fn test_empty_tables_render_nothing() {
        assert_eq!(render_movies_table(&[], 120), "");
        assert_eq!(render_search_table(&[]), "");
    }

    #[test]
    fn test_movies_table_has_header_and_rows() {
        let output = render_movies_table(
            &[movie(1, "Inception", "Christopher Nolan"), movie(2, "Heat", "Michael Mann")],
            120,
        );
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("TITLE"));
        assert!(lines[0].contains("DESCRIPTION"));
        assert!(lines[1].contains("Inception"));
        assert!(lines[2].contains("Michael Mann"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let long = "A".repeat(80);
        let output = render_movies_table(&[movie(1, &long, "")], 120);
        assert!(!output.contains(&long));
        assert!(output.contains("..."));
    }

    #[test]
    fn test_search_table_keeps_order() {
        let hits = vec![
            ScoredMovie {
                movie: movie(2, "Inception", "Christopher Nolan"),
                similarity: 0.8123,
            },
            ScoredMovie {
                movie: movie(1, "Alien", "Ridley Scott"),
                similarity: 0.25,
            },
        ];
        let output = render_search_table(&hits);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].contains("SIMILARITY"));
        assert!(lines[1].contains("0.812") && lines[1].contains("Inception"));
        assert!(lines[2].contains("0.250") && lines[2].contains("Alien"));
    }

    #[test]
    fn test_description_width_has_floor() {
        assert_eq!(description_width(40, 74), 16);
        assert_eq!(description_width(120, 74), 46);
    }
}
