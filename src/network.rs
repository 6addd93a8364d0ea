use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::models::{Genre, Movie};

/// Every way a TMDB request can fail. The loader treats all of them the
/// same: logged, then dropped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("TMDB returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("malformed TMDB response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parameters of one discover-by-year request. Sort order and page are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverQuery {
    pub year: i32,
    pub min_vote_count: u32,
    pub genres: Option<String>,
}

impl DiscoverQuery {
    pub const SORT_BY: &'static str = "popularity.desc";
    pub const PAGE: u32 = 1;

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sort_by", Self::SORT_BY.to_string()),
            ("primary_release_year", self.year.to_string()),
            ("vote_count.gte", self.min_vote_count.to_string()),
            ("page", Self::PAGE.to_string()),
        ];
        if let Some(genres) = &self.genres {
            params.push(("with_genres", genres.clone()));
        }
        params
    }
}

/// The remote catalogue: genre list plus per-year movie discovery.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn genres(&self) -> Result<Vec<Genre>, FetchError>;
    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<Movie>, FetchError>;
}

#[derive(Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Deserialize)]
struct DiscoverPage {
    results: Vec<MovieRecord>,
}

#[derive(Deserialize)]
struct MovieRecord {
    id: i64,
    original_title: Option<String>,
    title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    vote_count: u32,
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Movie {
            id: record.id,
            title: record
                .original_title
                .or(record.title)
                .unwrap_or_default(),
            overview: record.overview.unwrap_or_default(),
            poster_path: record.poster_path,
            popularity: record.popularity,
            vote_count: record.vote_count,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    status_message: String,
}

/// TMDB v3 client authenticated by an `api_key` query parameter.
#[derive(Clone)]
pub struct TmdbClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(settings: &Settings, api_key: String) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::with_http(http, &settings.api_base_url, api_key))
    }

    pub fn with_http(http: Client, api_base: &str, api_key: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%url, ?params, "tmdb request");
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.status_message)
                .unwrap_or(body);
            return Err(FetchError::Status { status, message });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn genres(&self) -> Result<Vec<Genre>, FetchError> {
        let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<Movie>, FetchError> {
        let page: DiscoverPage = self.get_json("/discover/movie", &query.params()).await?;
        Ok(page.results.into_iter().map(Movie::from).collect())
    }
}

/// Builds poster URLs from a fixed image host and width segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHost {
    base: String,
    width: String,
}

impl ImageHost {
    pub fn new(base: &str, width: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            width: width.to_string(),
        }
    }

    pub fn poster_url(&self, poster_path: Option<&str>) -> Option<String> {
        poster_path.map(|path| format!("{}/{}{}", self.base, self.width, path))
    }
}

impl From<&Settings> for ImageHost {
    fn from(settings: &Settings) -> Self {
        Self::new(&settings.image_base_url, &settings.poster_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::StatusCode as HttpStatus,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::{net::TcpListener, sync::Mutex};

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn spawn_tmdb_server(seen: Seen) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let genres_seen = seen.clone();
        let app = Router::new()
            .route(
                "/3/genre/movie/list",
                get(move |Query(q): Query<HashMap<String, String>>| {
                    let seen = genres_seen.clone();
                    async move {
                        seen.lock().await.push(q);
                        Json(json!({
                            "genres": [
                                {"id": 28, "name": "Action"},
                                {"id": 35, "name": "Comedy"}
                            ]
                        }))
                    }
                }),
            )
            .route(
                "/3/discover/movie",
                get(move |Query(q): Query<HashMap<String, String>>| {
                    let seen = seen.clone();
                    async move {
                        let year = q.get("primary_release_year").cloned();
                        seen.lock().await.push(q);
                        if year.as_deref() == Some("1999") {
                            return (
                                HttpStatus::UNAUTHORIZED,
                                Json(json!({
                                    "status_code": 7,
                                    "status_message": "Invalid API key"
                                })),
                            );
                        }
                        (
                            HttpStatus::OK,
                            Json(json!({
                                "page": 1,
                                "results": [
                                    {
                                        "id": 1,
                                        "original_title": "Skyfall",
                                        "title": "Skyfall",
                                        "overview": "Bond returns.",
                                        "poster_path": "/sky.jpg",
                                        "popularity": 55.5,
                                        "vote_count": 15000
                                    },
                                    {
                                        "id": 2,
                                        "title": "Untitled",
                                        "overview": null,
                                        "poster_path": null,
                                        "popularity": 1.0,
                                        "vote_count": 120
                                    }
                                ]
                            })),
                        )
                    }
                }),
            );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/3")
    }

    fn client(base: &str) -> TmdbClient {
        let http = Client::builder().no_proxy().build().expect("client");
        TmdbClient::with_http(http, base, "k3y".to_string())
    }

    #[tokio::test]
    async fn discover_sends_year_filter_and_key() {
        let seen: Seen = Arc::default();
        let base = spawn_tmdb_server(seen.clone()).await;
        let movies = client(&base)
            .discover(&DiscoverQuery {
                year: 2012,
                min_vote_count: 100,
                genres: Some("28,35".to_string()),
            })
            .await
            .expect("discover");

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Skyfall");
        assert_eq!(movies[0].poster_path.as_deref(), Some("/sky.jpg"));
        assert_eq!(movies[1].title, "Untitled");
        assert_eq!(movies[1].overview, "");
        assert_eq!(movies[1].poster_path, None);

        let seen = seen.lock().await;
        let q = &seen[0];
        assert_eq!(q["api_key"], "k3y");
        assert_eq!(q["sort_by"], "popularity.desc");
        assert_eq!(q["primary_release_year"], "2012");
        assert_eq!(q["vote_count.gte"], "100");
        assert_eq!(q["page"], "1");
        assert_eq!(q["with_genres"], "28,35");
    }

    #[tokio::test]
    async fn discover_omits_genre_param_without_filter() {
        let seen: Seen = Arc::default();
        let base = spawn_tmdb_server(seen.clone()).await;
        client(&base)
            .discover(&DiscoverQuery {
                year: 2013,
                min_vote_count: 100,
                genres: None,
            })
            .await
            .expect("discover");
        assert!(!seen.lock().await[0].contains_key("with_genres"));
    }

    #[tokio::test]
    async fn error_status_carries_tmdb_message() {
        let base = spawn_tmdb_server(Arc::default()).await;
        let err = client(&base)
            .discover(&DiscoverQuery {
                year: 1999,
                min_vote_count: 100,
                genres: None,
            })
            .await
            .expect_err("should fail");
        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn genres_are_listed() {
        let seen: Seen = Arc::default();
        let base = spawn_tmdb_server(seen.clone()).await;
        let genres = client(&base).genres().await.expect("genres");
        assert_eq!(
            genres,
            vec![
                Genre { id: 28, name: "Action".into() },
                Genre { id: 35, name: "Comedy".into() },
            ]
        );
        assert_eq!(seen.lock().await[0]["api_key"], "k3y");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let err = client(&format!("http://{addr}/3"))
            .genres()
            .await
            .expect_err("nothing listens");
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let err = serde_json::from_str::<DiscoverPage>("{\"results\": 3}")
            .map_err(FetchError::from)
            .err();
        assert!(matches!(err, Some(FetchError::Decode(_))));
    }

    #[test]
    fn poster_url_joins_host_width_and_path() {
        let host = ImageHost::new("https://image.tmdb.org/t/p/", "w500");
        assert_eq!(
            host.poster_url(Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(host.poster_url(None), None);
    }
}
