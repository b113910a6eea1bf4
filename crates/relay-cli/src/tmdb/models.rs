use std::fmt;

use relay_http::{Date, JsonMapper};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// TMDB sends `""` for unknown release dates.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => Date::deserialize(value).map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

impl JsonMapper for Genre {}

/// `GET /movie/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl JsonMapper for MovieDetails {}

impl fmt::Display for MovieDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(date) = &self.release_date {
            write!(f, " ({})", date.0.format("%Y"))?;
        }
        writeln!(f)?;

        let genres = self
            .genres
            .iter()
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>();
        if !genres.is_empty() {
            writeln!(f, "{}", genres.join(", "))?;
        }
        if let Some(runtime) = self.runtime {
            writeln!(f, "{} min", runtime)?;
        }
        writeln!(f, "rating {:.1}", self.vote_average)?;

        if !self.overview.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.overview)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub vote_average: f64,
}

impl JsonMapper for MovieSummary {}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<MovieSummary>,
}

impl JsonMapper for MoviePage {}

impl fmt::Display for MoviePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for movie in &self.results {
            let year = movie
                .release_date
                .map(|date| date.0.format("%Y").to_string())
                .unwrap_or_else(|| "----".to_string());
            writeln!(f, "{:>8}  {}  {}", movie.id, year, movie.title)?;
        }
        write!(
            f,
            "page {} of {} ({} results)",
            self.page, self.total_pages, self.total_results
        )
    }
}

/// Error body TMDB sends with non-2xx responses. Server payloads keep their
/// original snake_case keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub status_code: Option<u32>,
    pub status_message: String,
}
