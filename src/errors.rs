use thiserror::Error;

use crate::artifacts::ArtifactError;

/// Errors raised while building the recommendation model
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no user has more than {threshold} ratings; cannot build a rating matrix")]
    NoActiveUsers { threshold: usize },

    #[error("no title has at least {threshold} ratings among active users; cannot build a rating matrix")]
    NoPopularTitles { threshold: usize },

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while serving recommendation queries
///
/// The three user-visible conditions are deliberately distinct: a query that
/// matches nothing (`NoMatch`), a matched title with no joinable neighbors
/// (`EmptyNeighborSet`), and a model that has not been published yet
/// (`DataUnavailable`) must never collapse into one another.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("recommendation model is not available (build has not run or failed)")]
    DataUnavailable,

    #[error("no catalog title matches '{query}'")]
    NoMatch { query: String },

    #[error("no recommendable neighbors found for '{title}'")]
    EmptyNeighborSet { title: String },

    #[error("title '{title}' is not a row of the rating matrix")]
    TitleNotFound { title: String },
}

impl QueryError {
    /// Create a user-friendly error message for display by the transport layer
    pub fn user_message(&self) -> String {
        match self {
            QueryError::DataUnavailable => {
                "Recommendations are not available yet. Please try again once the model has been built.".to_string()
            }
            QueryError::NoMatch { query } => {
                format!("No book matching '{}' was found in the catalog.", query)
            }
            QueryError::EmptyNeighborSet { title } => {
                format!("'{}' was found, but no similar books could be recommended.", title)
            }
            QueryError::TitleNotFound { title } => {
                format!("'{}' is not part of the recommendation index.", title)
            }
        }
    }

    /// Whether the condition maps to a server-side failure rather than a bad query
    pub fn is_unavailable(&self) -> bool {
        matches!(self, QueryError::DataUnavailable)
    }
}

/// Convert QueryError to String for transport layers that only carry text
impl From<QueryError> for String {
    fn from(error: QueryError) -> Self {
        error.user_message()
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
