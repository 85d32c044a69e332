use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnError>;

#[derive(Debug, Error)]
pub enum ConnError {
	#[error("invalid connection info: {0}")]
	Config(String),

	/// The session opened but pushing local secrets into it failed.
	#[error("unable to push secrets: {0}")]
	Secrets(#[source] ctrl_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Api(#[from] ctrl_runtime::Error),
}

impl ConnError {
	/// Returns the runtime error at the bottom of this one, if any.
	pub fn api_error(&self) -> Option<&ctrl_runtime::Error> {
		match self {
			ConnError::Secrets(err) | ConnError::Api(err) => Some(err.root_cause()),
			_ => None,
		}
	}
}
