//! Recipe metadata CSV import.
//!
//! Reads the metadata export that accompanies the embedding snapshot. Row order
//! defines [`RecipeRef`](crate::types::RecipeRef), so rows are never skipped or
//! reordered here.
//!
//! Expected columns (extra columns are ignored):
//!
//! | Column | Content |
//! |--------|---------|
//! | `recipe_id` / `id` | optional; defaults to the row number |
//! | `title` | recipe title |
//! | `NER` | ingredient entities, list literal or comma-separated |
//! | `directions` | list literal or a single string |
//! | `link`, `source` | optional |

use crate::types::{Recipe, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RecipeRow {
    #[serde(default, alias = "id")]
    recipe_id: Option<String>,
    title: String,
    #[serde(rename = "NER", alias = "ner", default)]
    ner: String,
    #[serde(default)]
    directions: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    source: String,
}

impl RecipeRow {
    fn into_recipe(self, row: usize) -> Recipe {
        Recipe {
            recipe_id: self
                .recipe_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| row.to_string()),
            title: self.title.trim().to_string(),
            ingredients: parse_list(&self.ner),
            directions: parse_list(&self.directions),
            source: self.source,
            link: self.link,
        }
    }
}

/// Read every recipe from a CSV file, in file order.
///
/// # Errors
///
/// Returns `EngineError::CsvError` on malformed CSV or missing `title` column
pub fn read_recipes<P: AsRef<Path>>(path: P) -> Result<Vec<Recipe>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut recipes = Vec::new();
    for (row, record) in reader.deserialize::<RecipeRow>().enumerate() {
        recipes.push(record?.into_recipe(row));
    }

    tracing::info!(path = %path.as_ref().display(), recipes = recipes.len(), "Read recipe metadata");
    Ok(recipes)
}

/// Parse a list literal (`["a", "b"]` or `['a', 'b']`) or a comma-separated string.
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
        return clean(items);
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Some(items) = parse_quoted_items(&trimmed[1..trimmed.len() - 1]) {
            return clean(items);
        }
    }
    clean(trimmed.split(',').map(str::to_string).collect())
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `'a', "b's", 'c'` into strings. `None` if the body is not a list of quoted items.
fn parse_quoted_items(body: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let quote = match chars.next() {
            None => return Some(items),
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_python_list() {
        assert_eq!(
            parse_list(r#"['brown sugar', "baker's chocolate", 'eggs']"#),
            vec!["brown sugar", "baker's chocolate", "eggs"]
        );
    }

    #[test]
    fn test_parse_json_list() {
        assert_eq!(parse_list(r#"["egg", "flour"]"#), vec!["egg", "flour"]);
    }

    #[test]
    fn test_parse_comma_separated() {
        assert_eq!(parse_list("egg, flour ,, sugar"), vec!["egg", "flour", "sugar"]);
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn test_read_recipes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title,NER,directions,link,source,extra").unwrap();
        writeln!(
            file,
            r#"Pancakes,"['egg', 'flour', 'milk']","['Mix.', 'Fry.']",example.com/p,Gathered,x"#
        )
        .unwrap();
        writeln!(file, r#"Toast,bread,,,,"#).unwrap();

        let recipes = read_recipes(file.path()).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].recipe_id, "0");
        assert_eq!(recipes[0].ingredients, vec!["egg", "flour", "milk"]);
        assert_eq!(recipes[0].directions, vec!["Mix.", "Fry."]);
        assert_eq!(recipes[1].recipe_id, "1");
        assert_eq!(recipes[1].ingredients, vec!["bread"]);
        assert!(recipes[1].directions.is_empty());
    }
}
