use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Component type must not be empty")]
    EmptyType,

    #[error("Invalid matcher for {component_type} at index {index}: {source}")]
    InvalidMatcher {
        component_type: String,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid template for {component_type}: {message}")]
    InvalidTemplate {
        component_type: String,
        message: String,
    },
}

impl RegistryError {
    pub fn invalid_matcher(component_type: impl Into<String>, index: usize, source: regex::Error) -> Self {
        Self::InvalidMatcher {
            component_type: component_type.into(),
            index,
            source,
        }
    }

    pub fn invalid_template(component_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            component_type: component_type.into(),
            message: message.into(),
        }
    }
}
